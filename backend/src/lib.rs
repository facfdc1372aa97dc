//! Engagement backend for Beat the Sugar Spike.
//!
//! Sugar intake events are scored by the gamification engine in [`domain`],
//! stored through the adapters in [`outbound`], and served over HTTP by
//! [`inbound`]. [`client`] keeps a user's local view in step with the server.

pub mod client;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
