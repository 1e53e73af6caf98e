//! Utility modules shared by the pipeline and the binaries
//!
//! - Rounding: presentation-boundary rounding of confidence values
//! - Logging: tracing subscriber setup

pub mod rounding;
pub mod logging;

// Re-export commonly used functions
pub use rounding::{round_to, round_confidence, confidence_percent};
pub use logging::init_tracing;
