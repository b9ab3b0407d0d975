//! Core infrastructure for pykythe-rs.
//!
//! This crate provides language-agnostic infrastructure shared by the
//! indexing engine:
//! - Error types and exit codes
//! - Kythe wire types (`VName`, facts, edges) and the de-duplicating store
//! - NDJSON emission
//! - Byte-span text utilities and path canonicalization

pub mod error;
pub mod output;
pub mod text;
pub mod vname;
