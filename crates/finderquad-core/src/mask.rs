//! Per-variant binary mask.

use crate::{GrayImage, GrayImageView};

/// Boolean "dark" flag per pixel, row-major.
///
/// A mask is produced by one binarization strategy and usually dropped once
/// candidates have been extracted from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryMask {
    pub width: usize,
    pub height: usize,
    pub dark: Vec<bool>,
}

/// Intensity a dark mask pixel reads back as.
pub const DARK_LEVEL: u8 = 0;
/// Intensity a light mask pixel reads back as.
pub const LIGHT_LEVEL: u8 = 255;

impl BinaryMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            dark: vec![false; width * height],
        }
    }

    /// Mark every pixel for which `is_dark(value)` holds.
    pub fn from_predicate(src: &GrayImageView<'_>, is_dark: impl Fn(u8) -> bool) -> Self {
        Self {
            width: src.width,
            height: src.height,
            dark: src.data.iter().map(|&v| is_dark(v)).collect(),
        }
    }

    /// Global threshold: dark iff `v <= threshold`.
    pub fn from_threshold(src: &GrayImageView<'_>, threshold: u8) -> Self {
        Self::from_predicate(src, |v| v <= threshold)
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<bool> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(self.dark[y as usize * self.width + x as usize])
    }

    #[inline]
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.dark[y * self.width + x]
    }

    /// 0/255 intensity at a pixel, `None` outside the mask.
    #[inline]
    pub fn intensity(&self, x: i32, y: i32) -> Option<u8> {
        self.get(x, y).map(|d| if d { DARK_LEVEL } else { LIGHT_LEVEL })
    }

    pub fn dark_count(&self) -> usize {
        self.dark.iter().filter(|&&d| d).count()
    }

    /// Render as a black-on-white grayscale image.
    pub fn to_gray(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self
                .dark
                .iter()
                .map(|&d| if d { DARK_LEVEL } else { LIGHT_LEVEL })
                .collect(),
        }
    }

    /// Render with dark pixels as foreground (255) on a zero background.
    pub fn to_foreground(&self) -> GrayImage {
        GrayImage {
            width: self.width,
            height: self.height,
            data: self.dark.iter().map(|&d| if d { 255 } else { 0 }).collect(),
        }
    }
}
