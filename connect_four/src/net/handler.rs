//! Per-connection control loop.
//!
//! A [`ConnectionHandler`] is transport-agnostic: it reads decoded text frames
//! from any `Stream<Item = String>` (which ends when the transport closes) and
//! writes [`ServerEvent`]s into the connection's outbound queue. The server
//! crate adapts WebSockets to this shape.
//!
//! # Conversation
//!
//! 1. The first event must be `init`. Without a code it starts a new session
//!    (this connection becomes player one and receives the code back); with a
//!    code it joins (player two, or spectator once both seats are taken).
//! 2. Every following event must be `play`. Illegal moves are answered with an
//!    `error` to this connection only; applied moves are broadcast by the
//!    session.
//! 3. Malformed or out-of-sequence events end the connection.
//!
//! Session membership is held in RAII guards, so detaching (and retiring, for
//! the connection that created the session) happens however the handler ends.

use super::errors::{HandlerError, HandlerResult, INVALID_MESSAGE, ProtocolError};
use super::messages::{ClientEvent, ServerEvent};
use crate::session::{
    Attachment, ConnectionId, JoinCode, RetireGuard, SeatRequest, SessionError, SessionRegistry,
};
use futures_util::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Drives one connection from its first event to disconnection.
pub struct ConnectionHandler<S> {
    id: ConnectionId,
    registry: Arc<SessionRegistry>,
    inbound: S,
    outbox: mpsc::Sender<ServerEvent>,
}

impl<S> ConnectionHandler<S>
where
    S: Stream<Item = String> + Unpin,
{
    /// Create a handler
    ///
    /// # Arguments
    ///
    /// * `id` - Identifier used for seating and logs
    /// * `registry` - Shared session registry
    /// * `inbound` - Text frames from the client; ends when the transport closes
    /// * `outbox` - Queue drained by the transport's writer
    pub fn new(
        id: ConnectionId,
        registry: Arc<SessionRegistry>,
        inbound: S,
        outbox: mpsc::Sender<ServerEvent>,
    ) -> Self {
        Self {
            id,
            registry,
            inbound,
            outbox,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Run the conversation until the connection closes or misbehaves.
    ///
    /// Returns `Ok(())` when the client disconnects normally from the move
    /// loop. Protocol violations are reported to the client before returning.
    pub async fn run(mut self) -> HandlerResult<()> {
        let result = self.serve().await;

        if let Err(HandlerError::Protocol(
            ProtocolError::Malformed(_) | ProtocolError::Unexpected(_),
        )) = &result
        {
            let _ = self.send(ServerEvent::error(INVALID_MESSAGE)).await;
        }

        result
    }

    async fn serve(&mut self) -> HandlerResult<()> {
        match self.next_event().await? {
            ClientEvent::Init { join: None } => self.start().await,
            ClientEvent::Init { join: Some(code) } => self.join(code).await,
            other => Err(ProtocolError::Unexpected(other.kind()).into()),
        }
    }

    /// Create a session and play it as player one.
    async fn start(&mut self) -> HandlerResult<()> {
        let (code, session) = self.registry.create();
        // Declared before the attachment so it drops after it: detach, then retire.
        let _retire = RetireGuard::new(self.registry.clone(), code.clone());
        let attachment =
            Attachment::attach(session, self.id, SeatRequest::Host, self.outbox.clone()).await?;

        log::info!(
            "Connection {} started session {} as {}",
            self.id,
            code,
            attachment.role()
        );

        self.send(ServerEvent::Init { join: code }).await?;
        self.play_loop(&attachment).await
    }

    /// Attach to an existing session by code. A null code resolves nothing.
    async fn join(&mut self, code: Option<JoinCode>) -> HandlerResult<()> {
        let attached = match code.as_ref().map(|code| self.registry.resolve(code.as_str())) {
            Some(Ok(session)) => {
                Attachment::attach(session, self.id, SeatRequest::Guest, self.outbox.clone()).await
            }
            Some(Err(e)) => Err(e),
            None => Err(SessionError::NotFound),
        };
        let code = code.as_ref().map_or("null", JoinCode::as_str);

        let attachment = match attached {
            Ok(attachment) => attachment,
            Err(e) => {
                log::info!("Connection {} failed to join {}: {}", self.id, code, e);
                self.send(ServerEvent::error(e.client_message())).await?;
                return Err(e.into());
            }
        };

        log::info!(
            "Connection {} joined session {} as {}",
            self.id,
            code,
            attachment.role()
        );

        self.play_loop(&attachment).await
    }

    async fn play_loop(&mut self, attachment: &Attachment) -> HandlerResult<()> {
        loop {
            let column = match self.next_event().await {
                // Columns below zero are as far off the board as any other.
                Ok(ClientEvent::Play { column }) => {
                    usize::try_from(column).unwrap_or(usize::MAX)
                }
                Ok(other) => return Err(ProtocolError::Unexpected(other.kind()).into()),
                Err(ProtocolError::Closed) => return Ok(()),
                Err(e) => return Err(e.into()),
            };

            match attachment.session().play(self.id, column).await {
                Ok(applied) => {
                    log::debug!(
                        "Connection {} applied column {} at row {}",
                        self.id,
                        applied.column,
                        applied.row
                    );
                }
                Err(SessionError::IllegalMove(illegal)) => {
                    if self.send(ServerEvent::error(illegal.to_string())).await.is_err() {
                        return Ok(());
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn next_event(&mut self) -> Result<ClientEvent, ProtocolError> {
        let text = self.inbound.next().await.ok_or(ProtocolError::Closed)?;
        ClientEvent::decode(&text)
    }

    /// Unicast to this connection, waiting for queue space.
    async fn send(&mut self, event: ServerEvent) -> Result<(), ProtocolError> {
        self.outbox
            .send(event)
            .await
            .map_err(|_| ProtocolError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Player;
    use crate::session::SessionConfig;
    use futures_util::stream;
    use tokio::task::JoinHandle;

    struct Client {
        inbound: mpsc::Sender<String>,
        events: mpsc::Receiver<ServerEvent>,
        task: JoinHandle<HandlerResult<()>>,
    }

    impl Client {
        fn connect(registry: &Arc<SessionRegistry>) -> Self {
            let (inbound, rx) = mpsc::channel::<String>(16);
            let (outbox, events) = mpsc::channel(16);
            let frames = Box::pin(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|text| (text, rx))
            }));
            let handler =
                ConnectionHandler::new(ConnectionId::new(), registry.clone(), frames, outbox);
            Self {
                inbound,
                events,
                task: tokio::spawn(handler.run()),
            }
        }

        async fn send(&self, text: &str) {
            self.inbound.send(text.to_string()).await.unwrap();
        }

        async fn recv(&mut self) -> ServerEvent {
            self.events.recv().await.unwrap()
        }

        /// Close the transport and wait for the handler to finish.
        async fn close(self) -> HandlerResult<()> {
            drop(self.inbound);
            self.task.await.unwrap()
        }
    }

    fn registry() -> Arc<SessionRegistry> {
        Arc::new(SessionRegistry::new(SessionConfig::default()))
    }

    async fn start(registry: &Arc<SessionRegistry>) -> (Client, JoinCode) {
        let mut host = Client::connect(registry);
        host.send(r#"{"type":"init"}"#).await;
        match host.recv().await {
            ServerEvent::Init { join } => (host, join),
            other => panic!("expected init, got {other:?}"),
        }
    }

    /// Join and wait until attached: an off-turn move is only answered once
    /// the session knows the connection.
    async fn join_attached(registry: &Arc<SessionRegistry>, code: &JoinCode) -> Client {
        let mut guest = Client::connect(registry);
        guest.send(&join_frame(code)).await;
        guest.send(&play_frame(0)).await;
        assert_eq!(guest.recv().await, ServerEvent::error("It isn't your turn."));
        guest
    }

    fn join_frame(code: &JoinCode) -> String {
        format!(r#"{{"type":"init","join":"{code}"}}"#)
    }

    fn play_frame(column: usize) -> String {
        format!(r#"{{"type":"play","column":{column}}}"#)
    }

    #[tokio::test]
    async fn test_start_replies_with_registered_code() {
        let registry = registry();
        let (_host, code) = start(&registry).await;
        assert!(registry.resolve(code.as_str()).is_ok());
    }

    #[tokio::test]
    async fn test_join_unknown_code_reports_not_found() {
        let registry = registry();
        let mut guest = Client::connect(&registry);
        guest.send(r#"{"type":"init","join":"nope"}"#).await;

        assert_eq!(guest.recv().await, ServerEvent::error("Game not found."));
        let result = guest.task.await.unwrap();
        assert_eq!(result, Err(HandlerError::Session(SessionError::NotFound)));
        assert_eq!(registry.live_sessions(), 0);
    }

    #[tokio::test]
    async fn test_moves_broadcast_to_both_players() {
        let registry = registry();
        let (mut host, code) = start(&registry).await;
        let mut guest = join_attached(&registry, &code).await;

        host.send(&play_frame(3)).await;
        let expected = ServerEvent::Play {
            player: Player::One,
            row: 0,
            column: 3,
        };
        assert_eq!(host.recv().await, expected);
        assert_eq!(guest.recv().await, expected);
    }

    #[tokio::test]
    async fn test_illegal_move_answered_only_to_sender() {
        let registry = registry();
        let (mut host, code) = start(&registry).await;
        let mut guest = join_attached(&registry, &code).await;

        host.send(&play_frame(9)).await;
        assert_eq!(host.recv().await, ServerEvent::error("Column out of range."));
        assert!(guest.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_negative_column_is_out_of_range_not_malformed() {
        let registry = registry();
        let (mut host, code) = start(&registry).await;

        host.send(r#"{"type":"play","column":-1}"#).await;
        assert_eq!(host.recv().await, ServerEvent::error("Column out of range."));
        assert!(registry.resolve(code.as_str()).is_ok());

        // Still seated and still on turn.
        host.send(&play_frame(0)).await;
        assert_eq!(
            host.recv().await,
            ServerEvent::Play {
                player: Player::One,
                row: 0,
                column: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_null_join_code_is_not_found() {
        let registry = registry();
        let mut client = Client::connect(&registry);
        client.send(r#"{"type":"init","join":null}"#).await;

        assert_eq!(client.recv().await, ServerEvent::error("Game not found."));
        let result = client.task.await.unwrap();
        assert_eq!(result, Err(HandlerError::Session(SessionError::NotFound)));
        assert_eq!(registry.live_sessions(), 0);
    }

    #[tokio::test]
    async fn test_malformed_event_closes_connection() {
        let registry = registry();
        let (mut host, _code) = start(&registry).await;

        host.send(r#"{"type":"resign"}"#).await;
        assert_eq!(host.recv().await, ServerEvent::error(INVALID_MESSAGE));
        let result = host.task.await.unwrap();
        assert!(matches!(
            result,
            Err(HandlerError::Protocol(ProtocolError::Malformed(_)))
        ));
        // Leaving for any reason retires the session.
        assert_eq!(registry.live_sessions(), 0);
    }

    #[tokio::test]
    async fn test_play_before_init_is_a_violation() {
        let registry = registry();
        let mut client = Client::connect(&registry);
        client.send(&play_frame(0)).await;

        assert_eq!(client.recv().await, ServerEvent::error(INVALID_MESSAGE));
        let result = client.task.await.unwrap();
        assert_eq!(
            result,
            Err(HandlerError::Protocol(ProtocolError::Unexpected("play")))
        );
    }

    #[tokio::test]
    async fn test_host_disconnect_retires_but_guest_keeps_playing() {
        let registry = registry();
        let (host, code) = start(&registry).await;
        let mut guest = join_attached(&registry, &code).await;

        assert_eq!(host.close().await, Ok(()));
        assert!(registry.resolve(code.as_str()).is_err());

        let mut late = Client::connect(&registry);
        late.send(&join_frame(&code)).await;
        assert_eq!(late.recv().await, ServerEvent::error("Game not found."));

        // The running session still answers the guest.
        guest.send(&play_frame(0)).await;
        assert_eq!(guest.recv().await, ServerEvent::error("It isn't your turn."));
    }

    #[tokio::test]
    async fn test_guest_disconnect_does_not_retire() {
        let registry = registry();
        let (_host, code) = start(&registry).await;
        let guest = Client::connect(&registry);
        guest.send(&join_frame(&code)).await;

        assert_eq!(guest.close().await, Ok(()));
        assert!(registry.resolve(code.as_str()).is_ok());
    }

    #[tokio::test]
    async fn test_aborted_handler_still_retires() {
        let registry = registry();
        let (host, code) = start(&registry).await;

        host.task.abort();
        let _ = host.task.await;
        assert!(registry.resolve(code.as_str()).is_err());
    }
}
