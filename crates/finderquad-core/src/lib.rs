//! Core types and utilities for finder-pattern detection.
//!
//! This crate is intentionally small. It owns the grayscale image view, the
//! per-variant binary mask, the global Otsu threshold and the projective
//! helpers used to rectify a detected quadrilateral. It does *not* know
//! anything about finder patterns themselves.

mod homography;
mod image;
mod logger;
mod mask;
mod threshold;

pub use homography::{homography_from_4pt, warp_perspective_gray, Homography};
pub use image::{sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView, ImageError};
pub use mask::{BinaryMask, DARK_LEVEL, LIGHT_LEVEL};
pub use threshold::{otsu_threshold, otsu_threshold_from_samples};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_env, init_with_level, LOG_ENV};
