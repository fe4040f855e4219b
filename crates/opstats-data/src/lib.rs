//! Data layer for opstats.
//!
//! Responsible for parsing uploaded CSV content into raw records, persisting
//! measurements and aggregates in SQLite, and coordinating the
//! parse → validate → replace → persist pipeline as one atomic unit.

pub mod csv_reader;
pub mod ingest;
pub mod store;

pub use opstats_core as core;
