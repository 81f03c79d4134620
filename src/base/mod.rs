//! Foundation types for the buildml toolchain.
//!
//! This module provides the primitives used throughout the crate:
//! - [`TextRange`], [`TextSize`] - source positions (byte offsets)
//! - [`LineCol`], [`LineIndex`] - line/column conversion
//! - [`PositionError`] - strict out-of-range reporting
//!
//! This module has NO dependencies on other buildml modules.
//!
//! Two numbering conventions exist at the crate's boundaries: the protocol
//! side is zero-based and the evaluation-engine side is one-based. The
//! internal convention is zero-based everywhere; one-based values enter and
//! leave only through [`LineCol::from_one_based`] and
//! [`LineCol::to_one_based`].

mod line_index;

pub use line_index::{LineCol, LineIndex, PositionError};

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
