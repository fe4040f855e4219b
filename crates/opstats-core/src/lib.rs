//! Core domain layer for opstats.
//!
//! Holds the measurement and aggregate models, the error taxonomy, timestamp
//! parsing, batch validation rules and the pure statistics calculations.
//! Nothing in this crate touches the network or the database beyond deriving
//! `sqlx::FromRow` on the persisted models.

pub mod error;
pub mod models;
pub mod settings;
pub mod statistics;
pub mod timestamp;
pub mod validator;
