use serde::{Deserialize, Serialize};

/// Anything that carries a `[0, 1]` score.
pub trait Score {
    fn score(&self) -> f32;
}

/// Why a pattern test (or the whole candidate) scored zero.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("center out of bounds")]
    CenterOutOfBounds,
    #[error("radius too small")]
    RadiusTooSmall,
    #[error("pattern too small for reliable ring analysis")]
    PatternTooSmall,
    #[error("insufficient center samples")]
    InsufficientCenterSamples,
    #[error("center not dark enough: {ratio:.3}")]
    CenterNotDark { ratio: f32 },
    #[error("insufficient ring {ring} samples")]
    InsufficientRingSamples { ring: usize },
    #[error("insufficient pattern quality: {quality:.3}")]
    InsufficientQuality { quality: f32 },
    #[error("insufficient length")]
    InsufficientLength,
    #[error("only {runs} runs, need 5+")]
    TooFewRuns { runs: usize },
    #[error("does not start with black")]
    StartsLight,
    #[error("pattern breaks at position {position}")]
    PatternBreak { position: usize },
    #[error("region too small")]
    RegionTooSmall,
    #[error("composite score {score:.3} not above {floor}")]
    BelowAcceptance { score: f32, floor: f32 },
}

/// Outcome of one analysis stage.
///
/// A rejection keeps whatever partial detail was measured before the
/// failing check so callers can inspect it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Scored<T> {
    Accepted(T),
    Rejected {
        reason: RejectReason,
        partial: Option<T>,
    },
}

impl<T> Scored<T> {
    pub fn rejected(reason: RejectReason) -> Self {
        Self::Rejected {
            reason,
            partial: None,
        }
    }

    pub fn rejected_with(reason: RejectReason, partial: T) -> Self {
        Self::Rejected {
            reason,
            partial: Some(partial),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn accepted(&self) -> Option<&T> {
        match self {
            Self::Accepted(t) => Some(t),
            Self::Rejected { .. } => None,
        }
    }

    pub fn into_accepted(self) -> Option<T> {
        match self {
            Self::Accepted(t) => Some(t),
            Self::Rejected { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected { reason, .. } => Some(reason),
        }
    }

    /// Accepted value or the partial detail of a rejection.
    pub fn detail(&self) -> Option<&T> {
        match self {
            Self::Accepted(t) => Some(t),
            Self::Rejected { partial, .. } => partial.as_ref(),
        }
    }
}

impl<T: Score> Scored<T> {
    /// Score of an accepted value, 0 for any rejection.
    pub fn score(&self) -> f32 {
        self.accepted().map_or(0.0, Score::score)
    }
}
