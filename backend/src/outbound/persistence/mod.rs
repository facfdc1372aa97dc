//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the event store ports backed by PostgreSQL via
//! `diesel-async` and `bb8` pooling.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. Scoring rules never run here.
//! - **Internal models**: row structs (`models.rs`) and `schema.rs` are never
//!   exposed to the domain.
//! - **Strongly typed errors**: database failures map to the port error enums.
//!
//! ```ignore
//! use sugar_spike::outbound::persistence::{DbPool, DieselSugarEventRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/spike")).await?;
//! let events = DieselSugarEventRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_sugar_event_repository;
mod diesel_user_profile_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_sugar_event_repository::DieselSugarEventRepository;
pub use diesel_user_profile_repository::DieselUserProfileRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
