//! Connect Four board state machine.
//!
//! [`Board`] validates moves, applies gravity-drop placement, alternates turns
//! and tracks the [`GameOutcome`]. It performs no I/O and is driven by the
//! session actor, which serializes all access to a single board.

use super::entities::{COLUMNS, CONNECT, GameOutcome, Move, Player, ROWS};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reasons a move is rejected. The board is never mutated on rejection.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum IllegalMove {
    #[error("Game is over.")]
    GameOver,
    #[error("It isn't your turn.")]
    NotYourTurn,
    #[error("Column out of range.")]
    ColumnOutOfRange { column: usize },
    #[error("This slot is full.")]
    ColumnFull { column: usize },
}

/// A 7x6 Connect Four board.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Board {
    /// `cells[row][column]`, row 0 at the bottom.
    cells: [[Option<Player>; COLUMNS]; ROWS],
    /// Number of pieces stacked in each column.
    heights: [usize; COLUMNS],
    next: Player,
    outcome: GameOutcome,
    moves: Vec<Move>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board with player one to move.
    pub fn new() -> Self {
        Self {
            cells: [[None; COLUMNS]; ROWS],
            heights: [0; COLUMNS],
            next: Player::One,
            outcome: GameOutcome::InProgress,
            moves: Vec::with_capacity(COLUMNS * ROWS),
        }
    }

    /// Drop `player`'s mark into `column` and return the row it landed on.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalMove`] if the game is already over, it is not
    /// `player`'s turn, `column` is out of range, or the column is full.
    pub fn apply(&mut self, player: Player, column: usize) -> Result<usize, IllegalMove> {
        if self.outcome.is_terminal() {
            return Err(IllegalMove::GameOver);
        }
        if player != self.next {
            return Err(IllegalMove::NotYourTurn);
        }
        if column >= COLUMNS {
            return Err(IllegalMove::ColumnOutOfRange { column });
        }
        let row = self.heights[column];
        if row >= ROWS {
            return Err(IllegalMove::ColumnFull { column });
        }

        self.cells[row][column] = Some(player);
        self.heights[column] += 1;
        self.moves.push(Move {
            player,
            row,
            column,
        });
        self.next = player.other();

        if self.connects_through(row, column, player) {
            self.outcome = GameOutcome::Won(player);
        } else if self.is_full() {
            self.outcome = GameOutcome::Drawn;
        }

        Ok(row)
    }

    pub fn outcome(&self) -> GameOutcome {
        self.outcome
    }

    /// The player whose turn it is. Still reported after the game ends.
    pub fn current_player(&self) -> Player {
        self.next
    }

    /// Occupant of a cell, `None` when empty or out of bounds.
    pub fn cell(&self, row: usize, column: usize) -> Option<Player> {
        self.cells.get(row)?.get(column).copied().flatten()
    }

    pub fn height(&self, column: usize) -> Option<usize> {
        self.heights.get(column).copied()
    }

    /// Moves applied so far, oldest first.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn last_move(&self) -> Option<Move> {
        self.moves.last().copied()
    }

    pub fn is_full(&self) -> bool {
        self.heights.iter().all(|&height| height == ROWS)
    }

    /// Whether the piece at (`row`, `column`) completes a line of [`CONNECT`].
    ///
    /// Only lines through the last placed piece can have changed, so those are
    /// the only ones inspected.
    fn connects_through(&self, row: usize, column: usize, player: Player) -> bool {
        const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

        DIRECTIONS.iter().any(|&(d_row, d_col)| {
            let run = 1
                + self.run_length(row, column, d_row, d_col, player)
                + self.run_length(row, column, -d_row, -d_col, player);
            run >= CONNECT
        })
    }

    /// Count consecutive `player` marks from (`row`, `column`) stepping in one
    /// direction, excluding the starting cell.
    fn run_length(
        &self,
        row: usize,
        column: usize,
        d_row: isize,
        d_col: isize,
        player: Player,
    ) -> usize {
        let mut count = 0;
        let (mut r, mut c) = (row as isize, column as isize);
        loop {
            r += d_row;
            c += d_col;
            if r < 0 || c < 0 {
                return count;
            }
            match self.cell(r as usize, c as usize) {
                Some(occupant) if occupant == player => count += 1,
                _ => return count,
            }
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..ROWS).rev() {
            for column in 0..COLUMNS {
                let mark = self.cells[row][column].map_or('.', Player::mark);
                write!(f, "{mark}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Play `columns` in order, alternating from player one.
    fn play_all(board: &mut Board, columns: &[usize]) {
        for &column in columns {
            let player = board.current_player();
            board.apply(player, column).unwrap();
        }
    }

    #[test]
    fn test_drop_lands_on_lowest_empty_row() {
        let mut board = Board::new();
        assert_eq!(board.apply(Player::One, 3), Ok(0));
        assert_eq!(board.apply(Player::Two, 3), Ok(1));
        assert_eq!(board.apply(Player::One, 4), Ok(0));
        assert_eq!(board.cell(1, 3), Some(Player::Two));
        assert_eq!(board.height(3), Some(2));
    }

    #[test]
    fn test_player_two_cannot_open() {
        let mut board = Board::new();
        assert_eq!(board.apply(Player::Two, 0), Err(IllegalMove::NotYourTurn));
        assert!(board.moves().is_empty());
    }

    #[test]
    fn test_same_player_cannot_move_twice() {
        let mut board = Board::new();
        board.apply(Player::One, 0).unwrap();
        assert_eq!(board.apply(Player::One, 1), Err(IllegalMove::NotYourTurn));
        assert_eq!(board.current_player(), Player::Two);
    }

    #[test]
    fn test_column_out_of_range() {
        let mut board = Board::new();
        assert_eq!(
            board.apply(Player::One, COLUMNS),
            Err(IllegalMove::ColumnOutOfRange { column: COLUMNS })
        );
        assert_eq!(board, Board::new());
    }

    #[test]
    fn test_full_column_rejected_without_mutation() {
        let mut board = Board::new();
        play_all(&mut board, &[0, 0, 0, 0, 0, 0]);
        let before = board.clone();

        let err = board.apply(Player::One, 0).unwrap_err();
        assert_eq!(err, IllegalMove::ColumnFull { column: 0 });
        assert_eq!(err.to_string(), "This slot is full.");
        assert_eq!(board, before);
    }

    #[test]
    fn test_horizontal_win() {
        let mut board = Board::new();
        play_all(&mut board, &[0, 0, 1, 1, 2, 2]);
        assert_eq!(board.outcome(), GameOutcome::InProgress);
        board.apply(Player::One, 3).unwrap();
        assert_eq!(board.outcome(), GameOutcome::Won(Player::One));
    }

    #[test]
    fn test_vertical_win() {
        let mut board = Board::new();
        play_all(&mut board, &[3, 4, 3, 4, 3, 4]);
        board.apply(Player::One, 3).unwrap();
        assert_eq!(board.outcome(), GameOutcome::Won(Player::One));
    }

    #[test]
    fn test_rising_diagonal_win_for_player_two() {
        // O completes (0,1) (1,2) (2,3) (3,4).
        let mut board = Board::new();
        play_all(&mut board, &[0, 1, 2, 2, 3, 3, 4, 3, 4, 4, 6]);
        assert_eq!(board.outcome(), GameOutcome::InProgress);
        board.apply(Player::Two, 4).unwrap();
        assert_eq!(board.outcome(), GameOutcome::Won(Player::Two));
    }

    #[test]
    fn test_falling_diagonal_win() {
        // X completes (3,0) (2,1) (1,2) (0,3), last piece in the middle.
        let mut board = Board::new();
        play_all(&mut board, &[3, 1, 0, 0, 1, 0, 0, 2, 1, 6]);
        assert_eq!(board.outcome(), GameOutcome::InProgress);
        board.apply(Player::One, 2).unwrap();
        assert_eq!(board.outcome(), GameOutcome::Won(Player::One));
    }

    #[test]
    fn test_three_in_a_row_is_not_a_win() {
        let mut board = Board::new();
        play_all(&mut board, &[0, 6, 1, 6, 2]);
        assert_eq!(board.outcome(), GameOutcome::InProgress);
    }

    #[test]
    fn test_moves_rejected_after_win() {
        let mut board = Board::new();
        play_all(&mut board, &[3, 4, 3, 4, 3, 4, 3]);
        let finished = board.clone();

        assert_eq!(board.apply(Player::Two, 4), Err(IllegalMove::GameOver));
        assert_eq!(board.apply(Player::One, 0), Err(IllegalMove::GameOver));
        assert_eq!(board, finished);
    }

    #[test]
    fn test_full_board_without_line_is_drawn() {
        let mut board = Board::new();
        play_all(&mut board, &DRAWN_GAME[..DRAWN_GAME.len() - 1]);
        assert_eq!(board.outcome(), GameOutcome::InProgress);

        let player = board.current_player();
        board.apply(player, DRAWN_GAME[DRAWN_GAME.len() - 1]).unwrap();
        assert!(board.is_full());
        assert_eq!(board.outcome(), GameOutcome::Drawn);
        assert_eq!(board.apply(board.current_player(), 0), Err(IllegalMove::GameOver));
    }

    #[test]
    fn test_display_renders_top_row_first() {
        let mut board = Board::new();
        play_all(&mut board, &[0, 0]);
        let rendered = board.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), ROWS);
        assert_eq!(lines[ROWS - 1], "X......");
        assert_eq!(lines[ROWS - 2], "O......");
    }

    const DRAWN_GAME: [usize; 42] = [
        4, 3, 6, 0, 1, 4, 5, 5, 1, 1, 5, 0, 1, 6, 0, 1, 5, 5, 1, 0, 4, 6, 3, 2, 6, 6, 0, 4, 6, 5,
        2, 0, 4, 2, 4, 2, 2, 2, 3, 3, 3, 3,
    ];
}
