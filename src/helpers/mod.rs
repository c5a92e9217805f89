pub(crate) mod combine_global;
pub(crate) mod joins;
pub(crate) mod keyed;
pub(crate) mod side_inputs;
pub(crate) mod stdlib;
pub(crate) mod text;
pub(crate) mod timestamped;
pub(crate) mod windowed;

#[cfg(feature = "io-jsonl")]
pub(crate) mod jsonl;

// Only re-export files with top-level functions
pub use joins::{flatten, CoGrouped};
#[cfg(feature = "io-jsonl")]
pub use jsonl::*;
pub use side_inputs::*;
pub use stdlib::*;
pub use text::split_words;
