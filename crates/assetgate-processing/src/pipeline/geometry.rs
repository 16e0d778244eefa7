//! Resize geometry.
//!
//! Resolves a parsed resize spec against the source dimensions into a target
//! box and the scaled content box. All results are strictly positive before
//! any pixel work happens.

use super::{ResizeMode, ResizeSpec};

/// Resolve the target box for a resize, given source dimensions.
///
/// Aspect-preserving modes (lfit, mfit, fixed): explicit w and h win; a
/// single explicit axis derives the other from the source aspect ratio; then
/// `l` (both axes), then `s`, then the source dimensions.
///
/// Pad resolves each axis independently with the same precedence and no
/// cross-derivation, since the canvas is decoupled from the content aspect.
pub fn resolve_target(spec: &ResizeSpec, src_w: u32, src_h: u32) -> (u32, u32) {
    match spec.mode {
        ResizeMode::Pad => {
            let fallback_w = spec.longer.or(spec.shorter).unwrap_or(src_w);
            let fallback_h = spec.longer.or(spec.shorter).unwrap_or(src_h);
            (
                spec.width.unwrap_or(fallback_w).max(1),
                spec.height.unwrap_or(fallback_h).max(1),
            )
        }
        _ => match (spec.width, spec.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, derive_axis(w, src_h, src_w)),
            (None, Some(h)) => (derive_axis(h, src_w, src_h), h),
            (None, None) => {
                if let Some(l) = spec.longer {
                    (l, l)
                } else if let Some(s) = spec.shorter {
                    (s, s)
                } else {
                    (src_w.max(1), src_h.max(1))
                }
            }
        },
    }
}

/// Derive the missing axis from the source aspect ratio.
fn derive_axis(known: u32, src_missing: u32, src_known: u32) -> u32 {
    let derived = (known as f64 * src_missing as f64 / src_known as f64).round() as u32;
    derived.max(1)
}

/// Compute the scaled content box for the aspect-preserving scale modes.
///
/// lfit uses the smaller axis ratio (box fits inside the target on both
/// axes); mfit uses the larger one (box covers the target on both axes).
pub fn content_box(mode: ResizeMode, src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> (u32, u32) {
    let scale_w = target_w as f64 / src_w as f64;
    let scale_h = target_h as f64 / src_h as f64;
    let scale = match mode {
        ResizeMode::Mfit => scale_w.max(scale_h),
        _ => scale_w.min(scale_h),
    };

    let width = (src_w as f64 * scale).round() as u32;
    let height = (src_h as f64 * scale).round() as u32;
    (width.max(1), height.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PadColor;

    fn spec(mode: ResizeMode, w: Option<u32>, h: Option<u32>) -> ResizeSpec {
        ResizeSpec {
            mode,
            width: w,
            height: h,
            longer: None,
            shorter: None,
            pad_color: PadColor::WHITE,
        }
    }

    #[test]
    fn test_lfit_box_fits_inside_target() {
        // 400x300 into 200x100: scale = min(0.5, 0.3333..) -> box 133x100.
        let (w, h) = content_box(ResizeMode::Lfit, 400, 300, 200, 100);
        assert_eq!((w, h), (133, 100));
        assert!(w <= 200 && h <= 100);
    }

    #[test]
    fn test_mfit_box_covers_target() {
        // 400x300 into 200x100: scale = max(0.5, 0.3333..) -> box 200x150.
        let (w, h) = content_box(ResizeMode::Mfit, 400, 300, 200, 100);
        assert_eq!((w, h), (200, 150));
        assert!(w >= 200 && h >= 100);
    }

    #[test]
    fn test_only_width_derives_height() {
        let target = resolve_target(&spec(ResizeMode::Lfit, Some(200), None), 400, 300);
        assert_eq!(target, (200, 150));
    }

    #[test]
    fn test_only_height_derives_width() {
        let target = resolve_target(&spec(ResizeMode::Lfit, None, Some(150)), 400, 300);
        assert_eq!(target, (200, 150));
    }

    #[test]
    fn test_longer_and_shorter_fallbacks() {
        let mut s = spec(ResizeMode::Lfit, None, None);
        s.longer = Some(64);
        assert_eq!(resolve_target(&s, 400, 300), (64, 64));

        s.longer = None;
        s.shorter = Some(32);
        assert_eq!(resolve_target(&s, 400, 300), (32, 32));
    }

    #[test]
    fn test_no_dimensions_defaults_to_source() {
        assert_eq!(
            resolve_target(&spec(ResizeMode::Lfit, None, None), 400, 300),
            (400, 300)
        );
    }

    #[test]
    fn test_pad_axes_resolve_independently() {
        // Only width given: height falls through to the source height, not a
        // cross-derived aspect value.
        let target = resolve_target(&spec(ResizeMode::Pad, Some(200), None), 400, 300);
        assert_eq!(target, (200, 300));
    }

    #[test]
    fn test_boxes_are_strictly_positive() {
        let (w, h) = content_box(ResizeMode::Lfit, 4096, 1, 1, 1);
        assert!(w >= 1 && h >= 1);
    }
}
