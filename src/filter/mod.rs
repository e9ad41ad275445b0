//! Sample filter: raw device events to a denoised 6-DOF command
//!
//! ```text
//! RawSample ──► SampleFilter ──► FilteredInput (translation, rotation)
//!                    │
//!                    └──► button press counters
//! ```

pub mod sample_filter;

pub use sample_filter::{
    FilterError, FilterSettings, FilterStats, FilteredInput, IdleReset, SampleFilter,
};
