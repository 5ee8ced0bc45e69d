#![no_std]

pub mod constants;
pub mod decoder;
pub mod display;
pub mod edge;
pub mod lines;
pub mod segments;
pub mod sync;
pub mod utils;
pub mod wiring;

pub use decoder::{DecodedDigit, Glyph};
pub use display::{CycleTrigger, Debounce, Display, DisplayConfig, ErrorState, Reading};
pub use edge::EdgeHandler;
pub use lines::{EdgeEvent, Level, LineSource};
pub use segments::{SegmentMapping, SegmentTable};
pub use wiring::{Polarity, Wiring};
