//! # AInstein Core
//!
//! Pure logic for AInstein: the ArchiMate model graph, the canonical type
//! taxonomy, organization analysis, relationship traversal, and query
//! intent detection.
//!
//! This crate does no filesystem I/O, no XML parsing and no async work.
//! Models are built by the application crate's loader and handed over as
//! plain [`models::Model`] values.

pub mod intent;
pub mod models;
pub mod organization;
pub mod repository;
pub mod taxonomy;
pub mod traversal;
