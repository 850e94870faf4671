//! Pure text processing: normalization and chunking.

pub mod chunk;
pub mod normalize;

pub use chunk::{split, TextSpan, LOOKAHEAD};
pub use normalize::{NormalizeOptions, Normalizer};
