//! model-cards: keeps the variants table of model card documents in sync
//! with what a model registry actually publishes.
//!
//! - Registry access (registry/)
//! - Per-tag metadata derivation (classify/, units.rs, vram.rs)
//! - Alias resolution and display ordering (alias.rs, sort.rs)
//! - Table rendering and section replacement (markdown/)
//! - The `update` and `inspect-model` drivers (pipeline.rs)

pub mod alias;
pub mod classify;
pub mod config;
pub mod error;
pub mod markdown;
pub mod pipeline;
pub mod registry;
pub mod sort;
pub mod units;
pub mod variant;
pub mod vram;

pub use error::{Error, Result};
