//! Helpers for `image::GrayImage` inputs.

use finderquad_core::GrayImageView;

use crate::{DetectError, DetectionResult, FinderDetector, FinderParams};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Borrow an `image::GrayImage` as a core view.
pub fn gray_view(img: &::image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Build an `image::GrayImage` from a raw row-major buffer, validating its
/// length.
pub fn gray_image_from_slice(
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<::image::GrayImage, DetectError> {
    let invalid = || DetectError::InvalidImage {
        width: width as usize,
        height: height as usize,
        len: pixels.len(),
    };
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    let expected = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(invalid)?;
    if pixels.len() != expected {
        return Err(DetectError::InvalidGrayBuffer {
            expected,
            got: pixels.len(),
        });
    }
    ::image::GrayImage::from_raw(width, height, pixels.to_vec()).ok_or_else(invalid)
}

/// Detect finder patterns and the marker quadrilateral in one image.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn detect_image(
    img: &::image::GrayImage,
    params: FinderParams,
) -> Result<DetectionResult, DetectError> {
    FinderDetector::new(params).detect(&gray_view(img))
}

/// [`detect_image`] with default parameters.
pub fn detect_image_default(img: &::image::GrayImage) -> Result<DetectionResult, DetectError> {
    detect_image(img, FinderParams::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_buffer_length_is_checked() {
        assert!(matches!(
            gray_image_from_slice(4, 4, &[0u8; 15]),
            Err(DetectError::InvalidGrayBuffer {
                expected: 16,
                got: 15
            })
        ));
        assert!(matches!(
            gray_image_from_slice(0, 4, &[]),
            Err(DetectError::InvalidImage { .. })
        ));
        let img = gray_image_from_slice(3, 2, &[1, 2, 3, 4, 5, 6]).expect("valid");
        let view = gray_view(&img);
        assert_eq!((view.width, view.height), (3, 2));
        assert_eq!(view.get(2, 1), Some(6));
    }
}
