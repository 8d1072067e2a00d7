//! Domain model for spatial windows and decoded geometry.
//!
//! # Responsibility
//! - Define the canonical records used by the store, codec and importers.
//! - Keep payload typing closed: one payload variant per window kind.
//!
//! # Invariants
//! - Every window is identified by a store-allocated `WindowId`.
//! - Mesh models are immutable once a decoder returns them.

pub mod json_float;
pub mod mesh;
pub mod payload;
pub mod window;
