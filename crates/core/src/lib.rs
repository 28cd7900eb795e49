//! Core file storage logic for Arca.
//!
//! This crate contains the whole file subsystem with ZERO web or database
//! dependencies: content classification, storage key generation, the local
//! and blob storage backends, and the file service that orchestrates them.
//! Record persistence sits behind a repository trait implemented by the db
//! crate.
//!
//! # Modules
//!
//! - `classify` - three-signal content-type validation
//! - `keygen` - random storage key generation
//! - `backend` - local filesystem and blob storage backends
//! - `file` - file records and upload/download/delete orchestration

pub mod backend;
pub mod classify;
pub mod file;
pub mod keygen;
