//! WebSocket gateway: one connection per app session, identified by the
//! caller-asserted user id, fed by per-conversation notifier
//! subscriptions and the per-user dispatcher channel.

pub mod connection;
pub mod dispatcher;
