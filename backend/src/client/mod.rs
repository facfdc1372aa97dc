//! Client-side engagement state.
//!
//! Entries appear locally the moment they are logged and are reconciled with
//! the server's authoritative outcome when it arrives. The HTTP body types in
//! [`crate::inbound::http`] double as the wire contract.

pub mod gateway;
pub mod session;
pub mod state;

pub use gateway::{EngagementGateway, GatewayError, HttpEngagementGateway};
pub use session::{ClientSession, LogOutcome};
pub use state::{
    ClientEventId, ClientState, HistoryEntry, NOTIFICATION_TTL, Notification, OptimisticEvent,
    SyncStatus,
};
