//! Multi-strategy binarization.
//!
//! Every strategy is a pure function of the input image. Running several of
//! them and fusing the candidates afterwards makes detection tolerant to
//! uneven lighting.

use finderquad_core::{otsu_threshold, BinaryMask, GrayImageView};
use image::Luma;
use imageproc::distance_transform::Norm;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Thresholding strategy that produced a binary variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BinarizationMethod {
    /// Global Otsu on a lightly blurred image.
    Otsu,
    /// `Otsu` followed by a morphological clean-up of light specks.
    OtsuClean,
    /// Global Otsu on the raw image.
    OtsuOriginal,
    /// Local box-mean threshold.
    AdaptiveMean,
    /// Local gaussian-weighted threshold.
    AdaptiveGaussian,
    /// Fixed mid-gray threshold.
    FixedMid,
}

impl BinarizationMethod {
    pub const ALL: [BinarizationMethod; 6] = [
        BinarizationMethod::Otsu,
        BinarizationMethod::OtsuClean,
        BinarizationMethod::OtsuOriginal,
        BinarizationMethod::AdaptiveMean,
        BinarizationMethod::AdaptiveGaussian,
        BinarizationMethod::FixedMid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Otsu => "otsu",
            Self::OtsuClean => "otsu-clean",
            Self::OtsuOriginal => "otsu-original",
            Self::AdaptiveMean => "adaptive-mean",
            Self::AdaptiveGaussian => "adaptive-gaussian",
            Self::FixedMid => "fixed-mid",
        }
    }

    pub fn is_adaptive(self) -> bool {
        matches!(self, Self::AdaptiveMean | Self::AdaptiveGaussian)
    }
}

impl std::fmt::Display for BinarizationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Binarization settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BinarizeParams {
    /// Strategies to run, in order.
    pub methods: Vec<BinarizationMethod>,
    /// Gaussian sigma of the pre-blur (matches a 3x3 kernel).
    pub blur_sigma: f32,
    /// Odd side of the local neighbourhood for adaptive strategies.
    pub adaptive_block: u32,
    /// Offset subtracted from the local mean; dark iff `v <= local - offset`.
    pub adaptive_offset: f32,
    /// Threshold of `FixedMid`; dark iff `v <= fixed_threshold`.
    pub fixed_threshold: u8,
    /// Radius of the clean-up closing used by `OtsuClean`.
    pub clean_radius: u8,
}

impl Default for BinarizeParams {
    fn default() -> Self {
        Self {
            methods: BinarizationMethod::ALL.to_vec(),
            blur_sigma: 0.8,
            adaptive_block: 131,
            adaptive_offset: 18.0,
            fixed_threshold: 127,
            clean_radius: 1,
        }
    }
}

impl BinarizeParams {
    /// Gaussian sigma equivalent to an `adaptive_block` wide kernel.
    fn adaptive_sigma(&self) -> f32 {
        0.3 * ((self.adaptive_block as f32 - 1.0) * 0.5 - 1.0) + 0.8
    }
}

/// One binary rendition of the input.
#[derive(Clone, Debug)]
pub struct BinaryVariant {
    pub method: BinarizationMethod,
    pub mask: BinaryMask,
}

fn to_luma(src: &GrayImageView<'_>) -> image::GrayImage {
    image::GrayImage::from_fn(src.width as u32, src.height as u32, |x, y| {
        Luma([src.data[y as usize * src.width + x as usize]])
    })
}

fn mask_from_luma(img: &image::GrayImage, is_dark: impl Fn(u8) -> bool) -> BinaryMask {
    BinaryMask {
        width: img.width() as usize,
        height: img.height() as usize,
        dark: img.as_raw().iter().map(|&v| is_dark(v)).collect(),
    }
}

fn blurred(src: &GrayImageView<'_>, sigma: f32) -> image::GrayImage {
    let luma = to_luma(src);
    if sigma > 0.0 {
        imageproc::filter::gaussian_blur_f32(&luma, sigma)
    } else {
        luma
    }
}

fn otsu_mask(img: &image::GrayImage) -> BinaryMask {
    let t = otsu_threshold(img.as_raw());
    mask_from_luma(img, |v| v <= t)
}

fn adaptive_mask(smoothed: &image::GrayImage, local: &image::GrayImage, offset: f32) -> BinaryMask {
    let dark = smoothed
        .as_raw()
        .iter()
        .zip(local.as_raw())
        .map(|(&v, &m)| v as f32 <= m as f32 - offset)
        .collect();
    BinaryMask {
        width: smoothed.width() as usize,
        height: smoothed.height() as usize,
        dark,
    }
}

/// Produce the binary variant for a single strategy.
pub fn binarize(
    src: &GrayImageView<'_>,
    method: BinarizationMethod,
    params: &BinarizeParams,
) -> BinaryMask {
    match method {
        BinarizationMethod::Otsu => otsu_mask(&blurred(src, params.blur_sigma)),
        BinarizationMethod::OtsuClean => {
            let mask = otsu_mask(&blurred(src, params.blur_sigma));
            if params.clean_radius == 0 {
                return mask;
            }
            // Opening the light phase is closing the dark one.
            let fg = to_luma(&mask.to_foreground().view());
            let closed = imageproc::morphology::close(&fg, Norm::LInf, params.clean_radius);
            mask_from_luma(&closed, |v| v > 0)
        }
        BinarizationMethod::OtsuOriginal => otsu_mask(&to_luma(src)),
        BinarizationMethod::AdaptiveMean => {
            let smoothed = blurred(src, params.blur_sigma);
            let r = params.adaptive_block / 2;
            let local = imageproc::filter::box_filter(&smoothed, r, r);
            adaptive_mask(&smoothed, &local, params.adaptive_offset)
        }
        BinarizationMethod::AdaptiveGaussian => {
            let smoothed = blurred(src, params.blur_sigma);
            let local = imageproc::filter::gaussian_blur_f32(&smoothed, params.adaptive_sigma());
            adaptive_mask(&smoothed, &local, params.adaptive_offset)
        }
        BinarizationMethod::FixedMid => BinaryMask::from_threshold(src, params.fixed_threshold),
    }
}

/// Run every configured strategy.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src, params), fields(width = src.width, height = src.height))
)]
pub fn binarize_all(src: &GrayImageView<'_>, params: &BinarizeParams) -> Vec<BinaryVariant> {
    params
        .methods
        .iter()
        .map(|&method| {
            let mask = binarize(src, method, params);
            log::trace!("{method}: {} dark pixels", mask.dark_count());
            BinaryVariant { method, mask }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use finderquad_core::GrayImage;

    fn two_tone(width: usize, height: usize) -> GrayImage {
        // Left half dark, right half light.
        let mut img = GrayImage::filled(width, height, 230);
        for y in 0..height {
            for x in 0..width / 2 {
                img.set(x, y, 25);
            }
        }
        img
    }

    #[test]
    fn global_methods_split_two_tone_image() {
        let img = two_tone(40, 20);
        let params = BinarizeParams::default();
        for method in [
            BinarizationMethod::Otsu,
            BinarizationMethod::OtsuOriginal,
            BinarizationMethod::OtsuClean,
            BinarizationMethod::FixedMid,
        ] {
            let mask = binarize(&img.view(), method, &params);
            assert!(mask.is_dark(2, 10), "{method}");
            assert!(!mask.is_dark(37, 10), "{method}");
        }
    }

    #[test]
    fn adaptive_methods_ignore_smooth_gradient() {
        // A shallow horizontal ramp has no local contrast above the offset.
        let mut img = GrayImage::filled(64, 16, 0);
        for y in 0..16 {
            for x in 0..64 {
                img.set(x, y, 100 + (x / 2) as u8);
            }
        }
        let params = BinarizeParams::default();
        for method in [
            BinarizationMethod::AdaptiveMean,
            BinarizationMethod::AdaptiveGaussian,
        ] {
            let mask = binarize(&img.view(), method, &params);
            assert_eq!(mask.dark_count(), 0, "{method}");
        }
    }

    #[test]
    fn adaptive_mean_marks_dark_square_on_white() {
        let mut img = GrayImage::filled(60, 60, 240);
        for y in 20..40 {
            for x in 20..40 {
                img.set(x, y, 10);
            }
        }
        let mask = binarize(
            &img.view(),
            BinarizationMethod::AdaptiveMean,
            &BinarizeParams::default(),
        );
        assert!(mask.is_dark(30, 30));
        assert!(!mask.is_dark(5, 5));
    }

    #[test]
    fn all_variants_follow_configuration_order() {
        let img = two_tone(16, 16);
        let params = BinarizeParams {
            methods: vec![BinarizationMethod::FixedMid, BinarizationMethod::Otsu],
            ..BinarizeParams::default()
        };
        let variants = binarize_all(&img.view(), &params);
        let methods: Vec<_> = variants.iter().map(|v| v.method).collect();
        assert_eq!(
            methods,
            vec![BinarizationMethod::FixedMid, BinarizationMethod::Otsu]
        );
        assert_eq!(
            serde_json::to_string(&BinarizationMethod::AdaptiveGaussian).unwrap(),
            "\"adaptive-gaussian\""
        );
    }
}
