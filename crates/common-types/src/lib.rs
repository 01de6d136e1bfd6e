//! Shared data model, error taxonomy, and diagnostics sink for the GIF89a
//! codec. Kept in its own crate so both the codec and any downstream
//! consumer can depend on a stable, serde-optional public surface without
//! pulling in the bitstream/LZW/container machinery.

pub mod diagnostics;
pub mod error;
pub mod model;

pub use diagnostics::{Diagnostics, NullDiagnostics, TracingDiagnostics};
pub use error::GifError;
pub use model::{pad_to_power_of_two, Color, ColorTable, Frame, Gif};
