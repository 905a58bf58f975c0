//! # Connect Four
//!
//! A two-player Connect Four engine with join-code sessions, built for
//! persistent bidirectional connections such as WebSockets.
//!
//! ## Architecture
//!
//! - [`game`]: the board state machine. Validates moves, alternates turns and
//!   detects wins and draws. No I/O.
//! - [`session`]: one actor task per running game, the registry mapping join
//!   codes to sessions, and fanout of events to every attached connection.
//! - [`net`]: JSON wire events and the transport-agnostic connection handler.
//!
//! The first connection starts a session and receives its join code; the
//! second joins with that code as player two; later joiners spectate. When the
//! starting connection goes away the code is retired.
//!
//! ## Example
//!
//! ```
//! use connect_four::{Board, GameOutcome, Player};
//!
//! let mut board = Board::new();
//! for column in [3, 4, 3, 4, 3, 4] {
//!     let player = board.current_player();
//!     board.apply(player, column).unwrap();
//! }
//! assert_eq!(board.apply(Player::One, 3), Ok(3));
//! assert_eq!(board.outcome(), GameOutcome::Won(Player::One));
//! ```

/// Board rules and outcome detection.
pub mod game;
pub use game::{Board, GameOutcome, IllegalMove, Move, Player};

/// Sessions, the join-code registry and event fanout.
pub mod session;
pub use session::{JoinCode, SessionConfig, SessionError, SessionRegistry};

/// Wire events and connection handling.
pub mod net;
pub use net::{ClientEvent, ConnectionHandler, ServerEvent};
