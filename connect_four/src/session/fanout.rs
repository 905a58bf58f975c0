//! Event fanout to the connections attached to one session.
//!
//! The subscriber set holds weak senders, so a session never keeps a
//! connection's outbound queue alive on its own. Every delivery is a
//! non-blocking `try_send`: a slow or vanished connection fails on its own and
//! never holds up the others. Failed subscribers are not removed here; the
//! connection handler detaches itself when its transport closes.
//!
//! A connection that misses an event has a stale board until it fetches a
//! [`SessionSnapshot`](super::SessionSnapshot). The default outbound buffer
//! holds every broadcast of a game, so this only happens to clients that stop
//! reading.

use super::messages::ConnectionId;
use crate::net::messages::ServerEvent;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Why a single delivery did not reach its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// Outbound queue is full; the event was dropped for this connection
    Full,
    /// Connection's outbound queue no longer exists
    Closed,
}

/// Outcome of one broadcast.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: Vec<(ConnectionId, DeliveryFailure)>,
}

impl DeliveryReport {
    pub fn all_delivered(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Subscriber set of a session.
#[derive(Debug, Default)]
pub struct Fanout {
    subscribers: HashMap<ConnectionId, mpsc::WeakSender<ServerEvent>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a subscriber.
    pub fn subscribe(&mut self, connection: ConnectionId, outbox: &mpsc::Sender<ServerEvent>) {
        self.subscribers.insert(connection, outbox.downgrade());
    }

    /// Returns `false` if the connection was not subscribed.
    pub fn unsubscribe(&mut self, connection: ConnectionId) -> bool {
        self.subscribers.remove(&connection).is_some()
    }

    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.subscribers.contains_key(&connection)
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver `event` to every subscriber independently.
    pub fn broadcast(&self, event: &ServerEvent) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for (connection, weak) in &self.subscribers {
            let Some(outbox) = weak.upgrade() else {
                log::debug!("Subscriber {} disconnected, skipping delivery", connection);
                report.failed.push((*connection, DeliveryFailure::Closed));
                continue;
            };

            match outbox.try_send(event.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    log::warn!("Subscriber {} outbound queue full, dropping event", connection);
                    report.failed.push((*connection, DeliveryFailure::Full));
                }
                Err(TrySendError::Closed(_)) => {
                    log::debug!("Subscriber {} disconnected, skipping delivery", connection);
                    report.failed.push((*connection, DeliveryFailure::Closed));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Player;

    fn play_event() -> ServerEvent {
        ServerEvent::Play {
            player: Player::One,
            row: 0,
            column: 3,
        }
    }

    #[test]
    fn test_broadcast_reaches_every_subscriber() {
        let mut fanout = Fanout::new();
        let mut receivers = Vec::new();
        let mut senders = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = mpsc::channel(4);
            fanout.subscribe(ConnectionId::new(), &tx);
            senders.push(tx);
            receivers.push(rx);
        }

        let report = fanout.broadcast(&play_event());
        assert_eq!(report.delivered, 3);
        assert!(report.all_delivered());
        for rx in &mut receivers {
            assert_eq!(rx.try_recv().unwrap(), play_event());
        }
    }

    #[test]
    fn test_closed_subscriber_does_not_block_others() {
        let mut fanout = Fanout::new();

        let (live_tx, mut live_rx) = mpsc::channel(4);
        fanout.subscribe(ConnectionId::new(), &live_tx);

        let gone = ConnectionId::new();
        let (gone_tx, gone_rx) = mpsc::channel(4);
        fanout.subscribe(gone, &gone_tx);
        drop(gone_tx);
        drop(gone_rx);

        let report = fanout.broadcast(&play_event());
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, vec![(gone, DeliveryFailure::Closed)]);
        assert_eq!(live_rx.try_recv().unwrap(), play_event());

        // Failed subscribers stay until their handler detaches them.
        assert!(fanout.contains(gone));
    }

    #[test]
    fn test_full_subscriber_drops_only_its_copy() {
        let mut fanout = Fanout::new();

        let slow = ConnectionId::new();
        let (slow_tx, mut slow_rx) = mpsc::channel(1);
        fanout.subscribe(slow, &slow_tx);

        let (fast_tx, mut fast_rx) = mpsc::channel(4);
        fanout.subscribe(ConnectionId::new(), &fast_tx);

        fanout.broadcast(&play_event());
        let report = fanout.broadcast(&ServerEvent::Win {
            player: Player::One,
        });

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, vec![(slow, DeliveryFailure::Full)]);
        assert_eq!(slow_rx.try_recv().unwrap(), play_event());
        assert!(slow_rx.try_recv().is_err());
        assert_eq!(fast_rx.try_recv().unwrap(), play_event());
        assert_eq!(
            fast_rx.try_recv().unwrap(),
            ServerEvent::Win {
                player: Player::One
            }
        );
    }

    #[test]
    fn test_unsubscribe() {
        let mut fanout = Fanout::new();
        let id = ConnectionId::new();
        let (tx, _rx) = mpsc::channel(1);
        fanout.subscribe(id, &tx);
        assert_eq!(fanout.len(), 1);
        assert!(fanout.unsubscribe(id));
        assert!(!fanout.unsubscribe(id));
        assert!(fanout.is_empty());
    }
}
