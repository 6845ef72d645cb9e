//! # AInstein
//!
//! A question-answering assistant over ArchiMate enterprise-architecture
//! models.
//!
//! AInstein loads a directory of Archi `.archimate` files into one in-memory
//! graph, classifies every element against the ArchiMate 3.2 taxonomy, and
//! answers free-text questions ("How many business actors are there?",
//! "What is the impact of changing the ERP System?") with Markdown answers
//! whose counts are re-derived from the graph before they are returned.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────────┐
//! │ .archimate   │──▶│ Parser +    │──▶│ ModelRepository  │
//! │ files        │   │ Loader      │   │ (ainstein-core)  │
//! └──────────────┘   └─────────────┘   └────────┬─────────┘
//!                                               │
//!                          ┌────────────────────┤
//!                          ▼                    ▼
//!                  ┌──────────────┐     ┌──────────────┐
//!                  │ Assistant    │     │ CLI commands │
//!                  │ render+check │     │ stats/impact │
//!                  └──────┬───────┘     └──────────────┘
//!                         ▼
//!                  ┌──────────────┐
//!                  │ HTTP /chat   │
//!                  └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ainstein --models ./models stats
//! ainstein --models ./models ask "list business actors"
//! ainstein --models ./models impact "ERP System" --depth 2
//! ainstein --config ./config/ainstein.toml serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`parser`] | `.archimate` XML to [`ainstein_core::models::Model`] |
//! | [`loader`] | Directory scan and repository population |
//! | [`response`] | Markdown answer rendering |
//! | [`validate`] | Count re-derivation and answer checks |
//! | [`assistant`] | Render, validate and correct pipeline |
//! | [`server`] | HTTP chat server |
//! | [`stats`], [`sources`], [`get`], [`impact`] | CLI commands |

pub mod assistant;
pub mod config;
pub mod get;
pub mod impact;
pub mod loader;
pub mod parser;
pub mod response;
pub mod server;
pub mod sources;
pub mod stats;
pub mod validate;
