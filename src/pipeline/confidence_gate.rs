//! Confidence Gate
//!
//! A classifier trained only on crop imagery spreads probability almost
//! uniformly over its classes when shown something else, so a low peak score
//! marks an out-of-domain input no matter which class it nominally favours.

/// Message returned to the caller for out-of-domain images
pub const INVALID_IMAGE_MESSAGE: &str =
    "Non-agricultural image detected. Please upload a clear photo of a crop leaf, plant, or soil.";

#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    Accept { top: f64 },
    Reject { top: f64, message: String },
}

impl GateOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateOutcome::Accept { .. })
    }

    pub fn top(&self) -> f64 {
        match self {
            GateOutcome::Accept { top } | GateOutcome::Reject { top, .. } => *top,
        }
    }
}

/// Peak score of the vector, `NEG_INFINITY` when empty
pub fn peak_score(scores: &[f64]) -> f64 {
    scores.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Accept when the peak score reaches `threshold`.
///
/// Scores are assumed validated (non-empty, finite) by the caller.
pub fn gate(scores: &[f64], threshold: f64) -> GateOutcome {
    let top = peak_score(scores);

    if top < threshold {
        GateOutcome::Reject {
            top,
            message: INVALID_IMAGE_MESSAGE.to_string(),
        }
    } else {
        GateOutcome::Accept { top }
    }
}
