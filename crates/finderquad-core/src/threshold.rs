//! Global Otsu thresholding.
//!
//! The returned threshold `t` splits intensities into a dark class `v <= t`
//! and a light class `v > t`.

/// Threshold used when the samples carry no contrast at all.
const FLAT_THRESHOLD: u8 = 127;

/// Otsu threshold over every pixel of a grayscale buffer.
pub fn otsu_threshold(pixels: &[u8]) -> u8 {
    otsu_threshold_from_samples(pixels)
}

/// Compute the Otsu threshold from a set of sample intensities.
pub fn otsu_threshold_from_samples(samples: &[u8]) -> u8 {
    if samples.is_empty() {
        return FLAT_THRESHOLD;
    }

    let mut hist = [0u32; 256];
    let mut min_v = u8::MAX;
    let mut max_v = u8::MIN;
    for &v in samples {
        hist[v as usize] += 1;
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if min_v == max_v {
        return FLAT_THRESHOLD;
    }

    let occupied = hist.iter().filter(|&&h| h > 0).count();
    if occupied <= 2 {
        return ((min_v as u16 + max_v as u16) / 2) as u8;
    }

    let total = samples.len() as f64;
    let sum_total: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_dark = 0f64;
    let mut w_dark = 0f64;
    let mut best_var = -1f64;
    let mut best_t = FLAT_THRESHOLD;

    for (t, &h) in hist.iter().enumerate() {
        w_dark += h as f64;
        sum_dark += t as f64 * h as f64;
        if w_dark < 1.0 {
            continue;
        }
        let w_light = total - w_dark;
        if w_light < 1.0 {
            break;
        }

        let m_dark = sum_dark / w_dark;
        let m_light = (sum_total - sum_dark) / w_light;
        let var_between = w_dark * w_light * (m_dark - m_light) * (m_dark - m_light);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    best_t
}
