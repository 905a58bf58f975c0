//! RAII guards tying session membership to a connection handler's scope.
//!
//! Dropping a guard performs its cleanup, so detaching and retiring happen on
//! every exit path of a handler: normal close, errors, and the handler future
//! being dropped mid-await.

use super::{
    actor::SessionHandle,
    code::JoinCode,
    errors::SessionResult,
    messages::{ConnectionId, Role, SeatRequest},
    registry::SessionRegistry,
};
use crate::net::messages::ServerEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Membership of one connection in one session. Detaches on drop.
#[derive(Debug)]
pub struct Attachment {
    session: SessionHandle,
    connection: ConnectionId,
    role: Role,
}

impl Attachment {
    /// Attach `connection` to `session` and guard the membership.
    pub async fn attach(
        session: SessionHandle,
        connection: ConnectionId,
        seat: SeatRequest,
        outbox: mpsc::Sender<ServerEvent>,
    ) -> SessionResult<Self> {
        let role = session.attach(connection, seat, outbox).await?;
        Ok(Self {
            session,
            connection,
            role,
        })
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        log::debug!(
            "Detaching connection {} from session {}",
            self.connection,
            self.session.code()
        );
        self.session.detach_now(self.connection);
    }
}

/// Held by the connection that created a session. Retires the code on drop.
#[derive(Debug)]
pub struct RetireGuard {
    registry: Arc<SessionRegistry>,
    code: JoinCode,
}

impl RetireGuard {
    pub fn new(registry: Arc<SessionRegistry>, code: JoinCode) -> Self {
        Self { registry, code }
    }

    pub fn code(&self) -> &JoinCode {
        &self.code
    }
}

impl Drop for RetireGuard {
    fn drop(&mut self) {
        if !self.registry.retire(&self.code) {
            log::debug!("Session {} was already retired", self.code);
        }
    }
}
