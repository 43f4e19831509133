//! Error types shared across the Hypersense crates

pub use hs_error::{HypersenseError, Result};
