//! Session actor owning one board and its subscriber set.
//!
//! All board mutation and all broadcasts for a session happen inside this
//! actor's task, so moves are applied one at a time and every attached
//! connection sees `play`/`win`/`draw` events in move order. The actor stops
//! when every [`SessionHandle`] has been dropped.

use super::{
    code::JoinCode,
    config::SessionConfig,
    errors::{SessionError, SessionResult},
    fanout::Fanout,
    messages::{ConnectionId, Role, SeatRequest, SessionMessage, SessionSnapshot},
};
use crate::game::{Board, GameOutcome, IllegalMove, Move, Player};
use crate::net::messages::ServerEvent;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};

/// Session actor handle for sending messages
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
    code: JoinCode,
}

impl SessionHandle {
    /// Create a new session handle
    pub fn new(sender: mpsc::Sender<SessionMessage>, code: JoinCode) -> Self {
        Self { sender, code }
    }

    pub fn code(&self) -> &JoinCode {
        &self.code
    }

    /// Send a message to the session
    pub async fn send(&self, message: SessionMessage) -> SessionResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| SessionError::Closed)
    }

    /// Attach a connection and return its assigned role.
    pub async fn attach(
        &self,
        connection: ConnectionId,
        seat: SeatRequest,
        outbox: mpsc::Sender<ServerEvent>,
    ) -> SessionResult<Role> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionMessage::Attach {
            connection,
            seat,
            outbox,
            response: tx,
        })
        .await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn detach(&self, connection: ConnectionId) -> SessionResult<()> {
        self.send(SessionMessage::Detach { connection }).await
    }

    /// Detach without awaiting, for use from `Drop`.
    ///
    /// Falls back to a spawned send when the inbox is momentarily full.
    pub fn detach_now(&self, connection: ConnectionId) {
        match self.sender.try_send(SessionMessage::Detach { connection }) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(message)) => {
                match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => {
                        let sender = self.sender.clone();
                        runtime.spawn(async move {
                            let _ = sender.send(message).await;
                        });
                    }
                    Err(_) => {
                        log::warn!(
                            "Session {}: no runtime to detach connection {}",
                            self.code,
                            connection
                        );
                    }
                }
            }
            // Actor already gone, nothing to detach from.
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    /// Submit a move for the connection's seat.
    ///
    /// On success the actor has already broadcast the resulting events.
    pub async fn play(&self, connection: ConnectionId, column: usize) -> SessionResult<Move> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionMessage::Play {
            connection,
            column,
            response: tx,
        })
        .await?;
        let result = rx.await.map_err(|_| SessionError::Closed)?;
        Ok(result?)
    }

    pub async fn snapshot(&self) -> SessionResult<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionMessage::Snapshot { response: tx }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}

/// Session actor managing a single game
pub struct SessionActor {
    /// Join code this session was registered under
    code: JoinCode,

    /// Game state
    board: Board,

    /// Message inbox
    inbox: mpsc::Receiver<SessionMessage>,

    /// Attached connections and their roles
    roles: HashMap<ConnectionId, Role>,

    /// Subscribers receiving broadcasts
    fanout: Fanout,
}

impl SessionActor {
    /// Create a new session actor
    ///
    /// # Returns
    ///
    /// * `(SessionActor, SessionHandle)` - Actor and handle for sending messages
    pub fn new(code: JoinCode, config: &SessionConfig) -> (Self, SessionHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity.max(1));

        let actor = Self {
            code: code.clone(),
            board: Board::new(),
            inbox,
            roles: HashMap::new(),
            fanout: Fanout::new(),
        };

        (actor, SessionHandle::new(sender, code))
    }

    /// Run the session actor event loop
    pub async fn run(mut self) {
        log::info!("Session {} starting", self.code);

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
        }

        log::info!(
            "Session {} stopped after {} moves ({})",
            self.code,
            self.board.moves().len(),
            self.board.outcome()
        );
    }

    /// Handle a session message
    fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Attach {
                connection,
                seat,
                outbox,
                response,
            } => {
                let role = self.handle_attach(connection, seat, &outbox);
                let _ = response.send(role);
            }

            SessionMessage::Detach { connection } => {
                self.handle_detach(connection);
            }

            SessionMessage::Play {
                connection,
                column,
                response,
            } => {
                let result = self.handle_play(connection, column);
                let _ = response.send(result);
            }

            SessionMessage::Snapshot { response } => {
                let _ = response.send(self.snapshot());
            }
        }
    }

    fn seat_occupant(&self, player: Player) -> Option<ConnectionId> {
        self.roles
            .iter()
            .find(|(_, role)| **role == Role::Player(player))
            .map(|(connection, _)| *connection)
    }

    fn handle_attach(
        &mut self,
        connection: ConnectionId,
        seat: SeatRequest,
        outbox: &mpsc::Sender<ServerEvent>,
    ) -> Role {
        let wanted = match seat {
            SeatRequest::Host => Player::One,
            SeatRequest::Guest => Player::Two,
        };

        let role = match self.seat_occupant(wanted) {
            None => Role::Player(wanted),
            Some(occupant) if occupant == connection => Role::Player(wanted),
            Some(_) => {
                if seat == SeatRequest::Host {
                    log::warn!(
                        "Session {}: host seat already taken, seating {} as spectator",
                        self.code,
                        connection
                    );
                }
                Role::Spectator
            }
        };

        self.roles.insert(connection, role);
        self.fanout.subscribe(connection, outbox);

        log::info!(
            "Session {}: connection {} attached as {} ({} attached)",
            self.code,
            connection,
            role,
            self.fanout.len()
        );

        role
    }

    fn handle_detach(&mut self, connection: ConnectionId) {
        let role = self.roles.remove(&connection);
        self.fanout.unsubscribe(connection);

        if let Some(role) = role {
            log::info!(
                "Session {}: connection {} ({}) detached ({} attached)",
                self.code,
                connection,
                role,
                self.fanout.len()
            );
        }
    }

    fn handle_play(&mut self, connection: ConnectionId, column: usize) -> Result<Move, IllegalMove> {
        let Some(player) = self.roles.get(&connection).and_then(|role| role.player()) else {
            // Spectators and unknown connections never hold the turn, but a
            // finished game reports that first, as the board would.
            if self.board.outcome().is_terminal() {
                return Err(IllegalMove::GameOver);
            }
            return Err(IllegalMove::NotYourTurn);
        };

        let row = self.board.apply(player, column)?;
        let applied = Move {
            player,
            row,
            column,
        };

        log::debug!(
            "Session {}: {} played column {} (row {})",
            self.code,
            player,
            column,
            row
        );

        self.broadcast(ServerEvent::Play {
            player,
            row,
            column,
        });

        match self.board.outcome() {
            GameOutcome::InProgress => {}
            GameOutcome::Won(winner) => {
                log::info!("Session {}: won by {}", self.code, winner);
                self.broadcast(ServerEvent::Win { player: winner });
            }
            GameOutcome::Drawn => {
                log::info!("Session {}: drawn", self.code);
                self.broadcast(ServerEvent::Draw);
            }
        }

        Ok(applied)
    }

    fn broadcast(&self, event: ServerEvent) {
        let report = self.fanout.broadcast(&event);
        if !report.all_delivered() {
            log::warn!(
                "Session {}: {:?} delivered to {} of {} connections",
                self.code,
                event,
                report.delivered,
                report.delivered + report.failed.len()
            );
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        let players = self
            .roles
            .values()
            .filter(|role| role.player().is_some())
            .count();

        SessionSnapshot {
            code: self.code.clone(),
            moves: self.board.moves().to_vec(),
            next_player: self.board.current_player(),
            outcome: self.board.outcome(),
            players,
            spectators: self.roles.len() - players,
            board: self.board.to_string(),
        }
    }
}
