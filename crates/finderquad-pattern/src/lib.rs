//! Finder-pattern candidate detection.
//!
//! The stages run leaves first:
//!
//! 1. [`binarize_all`] renders the grayscale input into several binary
//!    variants (global Otsu, adaptive, fixed threshold).
//! 2. [`extract_candidates`] traces dark-blob outlines in one variant and
//!    keeps the square-ish ones.
//! 3. [`PatternScorer`] checks each blob for concentric rings, 1:1:3:1:1
//!    scanlines and mirror symmetry.
//! 4. [`fuse_candidates`] merges the per-variant results, re-ranks them
//!    and selects a well separated [`PatternSet`].
//!
//! Every rejection is a value (`Scored::Rejected`, [`BlobRejection`]), never
//! an error: one bad blob does not stop the others.

mod binarize;
mod extract;
mod fusion;
pub mod polygon;
pub mod score;
mod types;

pub use binarize::{binarize, binarize_all, BinarizationMethod, BinarizeParams, BinaryVariant};
pub use extract::{
    extract_candidates, filter_outline, BlobRejection, ExtractParams, ExtractionReport,
};
pub use fusion::{
    fuse_candidates, merge_duplicates, quality_signal, FusionParams, MethodReliability,
    PatternSet, QualityWeights, RankedCandidate, SizePlausibility,
};
pub use score::{PatternScorer, RejectReason, Score, ScoreParams, Scored};
pub use types::{BoundingBox, Candidate, RawCandidate};
