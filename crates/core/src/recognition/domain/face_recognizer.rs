use crate::shared::frame::Frame;

/// A recognizer's best guess for one face crop.
///
/// `confidence` is a distance: lower means a closer match.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Recognition {
    pub identity: Option<u32>,
    pub confidence: f64,
}

impl Recognition {
    pub fn new(identity: Option<u32>, confidence: f64) -> Self {
        Self {
            identity,
            confidence,
        }
    }

    /// No guess. The infinite distance never clears any threshold.
    pub fn none() -> Self {
        Self {
            identity: None,
            confidence: f64::INFINITY,
        }
    }

    pub fn clears(&self, threshold: f64) -> bool {
        self.confidence < threshold
    }
}

/// Domain interface for face recognition.
///
/// Infallible by contract: internal failures must surface as
/// [`Recognition::none`] so the tracking loop always gets an answer.
pub trait FaceRecognizer: Send {
    fn recognize(&self, face: &Frame) -> Recognition;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::below(89.9, true)]
    #[case::equal(90.0, false)]
    #[case::above(95.0, false)]
    fn test_clears_is_strictly_below_threshold(#[case] confidence: f64, #[case] expected: bool) {
        assert_eq!(Recognition::new(Some(0), confidence).clears(90.0), expected);
    }

    #[rstest]
    #[case(0.0)]
    #[case(90.0)]
    #[case(f64::MAX)]
    fn test_none_never_clears(#[case] threshold: f64) {
        let r = Recognition::none();
        assert_eq!(r.identity, None);
        assert!(!r.clears(threshold));
    }
}
