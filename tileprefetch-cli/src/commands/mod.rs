//! CLI command implementations.
//!
//! - [`run`] - Interactive download session for both layers
//! - [`tiles`] - Print the tiles needed for an area

pub mod common;
pub mod run;
pub mod tiles;
