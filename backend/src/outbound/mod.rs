//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: process-local store for tests and database-less runs
//!
//! Adapters are thin translators between domain types and storage
//! representations. They contain no scoring rules.

pub mod memory;
pub mod persistence;
