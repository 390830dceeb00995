//! Finder-pattern detection and marker quadrilateral reconstruction.
//!
//! The facade re-exports the stage crates and adds [`FinderDetector`], which
//! runs the whole pipeline on one grayscale image:
//!
//! 1. binarize the image several ways and trace square-ish dark blobs;
//! 2. score every blob against the finder-pattern model (concentric rings,
//!    1:1:3:1:1 scanlines, mirror symmetry);
//! 3. fuse the candidates of all variants into a separated [`PatternSet`];
//! 4. assign corner roles, complete the fourth corner and validate the
//!    quadrilateral;
//! 5. rectify it and sample a logical bit grid.
//!
//! ## Quickstart
//!
//! ```no_run
//! use finderquad::{FinderDetector, FinderParams, GrayImageView};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (width, height) = (640, 480);
//! let pixels = vec![255u8; width * height];
//! let view = GrayImageView::new(width, height, &pixels)?;
//!
//! let detector = FinderDetector::new(FinderParams::default());
//! let result = detector.detect(&view)?;
//! println!("bottom-right corner: {:?}", result.quad.bottom_right());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `finderquad::core`: image views, binary masks, Otsu, homographies, logging.
//! - `finderquad::pattern`: binarization, blob extraction, scoring, fusion.
//! - `finderquad::geometry`: corner roles, fourth corner, search, grid sampling.
//! - `finderquad::detect` (feature `image`): helpers for `image::GrayImage`.

pub use finderquad_core as core;
pub use finderquad_geometry as geometry;
pub use finderquad_pattern as pattern;

pub use finderquad_core::{init_from_env, init_with_level, GrayImageView};
pub use finderquad_geometry::{GeometryError, Grid, Quadrilateral};
pub use finderquad_pattern::{Candidate, PatternSet};

mod detector;
mod error;
pub mod io;
mod params;
mod result;

pub use detector::FinderDetector;
pub use error::DetectError;
pub use io::{PatternRecord, RectangleRecord};
pub use params::FinderParams;
pub use result::{DetectionResult, PatternScan, QuadSource, VariantReport};

#[cfg(feature = "image")]
pub mod detect;

/// Install a `tracing` subscriber and forward `log` records into it.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let _ = tracing_log::LogTracer::init();
    finderquad_core::init_tracing(json);
}
