//! Resolves a port's hint bits into a usable `{min, max, default}` range.

use super::sys;
use super::types::RangeHint;

/// Bounds flagged as sample-rate relative are scaled by this rate for
/// display, since the session rate is unknown when descriptors are parsed.
pub const NOMINAL_SAMPLE_RATE: f32 = 96000.0;

/// Width of the window synthesised on a side with no declared bound.
const ARBITRARY_SPAN: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

pub fn resolve(hint: &RangeHint) -> ControlRange {
    let mut min = if hint.is_bounded_below() {
        hint.lower
    } else if hint.is_bounded_above() {
        hint.upper - ARBITRARY_SPAN
    } else {
        -ARBITRARY_SPAN
    };

    let mut max = if hint.is_bounded_above() {
        hint.upper
    } else if hint.is_bounded_below() {
        hint.lower + ARBITRARY_SPAN
    } else {
        ARBITRARY_SPAN
    };

    if hint.is_sample_rate() {
        min *= NOMINAL_SAMPLE_RATE;
        max *= NOMINAL_SAMPLE_RATE;
    }

    if min > max {
        log::debug!("ladspa: swapping inverted bounds [{}, {}]", min, max);
        std::mem::swap(&mut min, &mut max);
    }

    let log_scale = hint.is_logarithmic() && min > 0.0;

    let default = match hint.default_kind() {
        sys::HINT_DEFAULT_0 => 0.0,
        sys::HINT_DEFAULT_1 => 1.0,
        sys::HINT_DEFAULT_100 => 100.0,
        sys::HINT_DEFAULT_440 => 440.0,
        sys::HINT_DEFAULT_MINIMUM => min,
        sys::HINT_DEFAULT_MAXIMUM => max,
        sys::HINT_DEFAULT_LOW => interpolate(min, max, 0.25, log_scale),
        sys::HINT_DEFAULT_HIGH => interpolate(min, max, 0.75, log_scale),
        _ => interpolate(min, max, 0.5, log_scale),
    };

    ControlRange { min, max, default }
}

/// Point `t` of the way from `min` to `max`, in the natural-log domain when
/// `log_scale` is set, kept within `[min, max]` despite rounding.
fn interpolate(min: f32, max: f32, t: f32, log_scale: bool) -> f32 {
    let value = if log_scale {
        ((1.0 - t) * min.ln() + t * max.ln()).exp()
    } else {
        (1.0 - t) * min + t * max
    };
    value.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DEFAULTS: [i32; 10] = [
        sys::HINT_DEFAULT_NONE,
        sys::HINT_DEFAULT_MINIMUM,
        sys::HINT_DEFAULT_LOW,
        sys::HINT_DEFAULT_MIDDLE,
        sys::HINT_DEFAULT_HIGH,
        sys::HINT_DEFAULT_MAXIMUM,
        sys::HINT_DEFAULT_0,
        sys::HINT_DEFAULT_1,
        sys::HINT_DEFAULT_100,
        sys::HINT_DEFAULT_440,
    ];

    fn is_literal(kind: i32) -> bool {
        matches!(
            kind,
            sys::HINT_DEFAULT_0 | sys::HINT_DEFAULT_1 | sys::HINT_DEFAULT_100 | sys::HINT_DEFAULT_440
        )
    }

    #[test]
    fn test_bounded_linear_low() {
        let hint = RangeHint::new(
            sys::HINT_BOUNDED_BELOW | sys::HINT_BOUNDED_ABOVE | sys::HINT_DEFAULT_LOW,
            0.0,
            10.0,
        );
        let r = resolve(&hint);
        assert_eq!(r.min, 0.0);
        assert_eq!(r.max, 10.0);
        assert_relative_eq!(r.default, 2.5);
    }

    #[test]
    fn test_unbounded_literal_default_is_verbatim() {
        let r = resolve(&RangeHint::new(sys::HINT_DEFAULT_100, 0.0, 0.0));
        assert_eq!(r.min, -100.0);
        assert_eq!(r.max, 100.0);
        assert_eq!(r.default, 100.0);

        let r = resolve(&RangeHint::new(sys::HINT_DEFAULT_440, 0.0, 0.0));
        assert_eq!(r.default, 440.0);
    }

    #[test]
    fn test_single_bound_anchors_window() {
        let r = resolve(&RangeHint::new(sys::HINT_BOUNDED_BELOW, 5.0, 0.0));
        assert_eq!((r.min, r.max), (5.0, 105.0));
        assert_relative_eq!(r.default, 55.0);

        let r = resolve(&RangeHint::new(sys::HINT_BOUNDED_ABOVE, 0.0, -3.0));
        assert_eq!((r.min, r.max), (-103.0, -3.0));
    }

    #[test]
    fn test_sample_rate_scaling() {
        let r = resolve(&RangeHint::new(
            sys::HINT_BOUNDED_BELOW
                | sys::HINT_BOUNDED_ABOVE
                | sys::HINT_SAMPLE_RATE
                | sys::HINT_DEFAULT_MAXIMUM,
            0.0,
            0.5,
        ));
        assert_eq!(r.min, 0.0);
        assert_eq!(r.max, 48000.0);
        assert_eq!(r.default, 48000.0);
    }

    #[test]
    fn test_logarithmic_defaults() {
        let flags = sys::HINT_BOUNDED_BELOW | sys::HINT_BOUNDED_ABOVE | sys::HINT_LOGARITHMIC;

        let mid = resolve(&RangeHint::new(flags | sys::HINT_DEFAULT_MIDDLE, 10.0, 1000.0));
        assert_relative_eq!(mid.default, 100.0, max_relative = 1e-5);

        let low = resolve(&RangeHint::new(flags | sys::HINT_DEFAULT_LOW, 1.0, 10000.0));
        assert_relative_eq!(low.default, 10.0, max_relative = 1e-5);

        let high = resolve(&RangeHint::new(flags | sys::HINT_DEFAULT_HIGH, 1.0, 10000.0));
        assert_relative_eq!(high.default, 1000.0, max_relative = 1e-5);
    }

    #[test]
    fn test_logarithmic_with_non_positive_bound_stays_finite() {
        let r = resolve(&RangeHint::new(
            sys::HINT_BOUNDED_BELOW | sys::HINT_BOUNDED_ABOVE | sys::HINT_LOGARITHMIC,
            0.0,
            20.0,
        ));
        assert!(r.default.is_finite());
        assert_relative_eq!(r.default, 10.0);
    }

    #[test]
    fn test_toggle_default_comes_from_ladder() {
        let r = resolve(&RangeHint::new(sys::HINT_TOGGLED | sys::HINT_DEFAULT_1, 0.0, 0.0));
        assert_eq!(r.default, 1.0);
        let r = resolve(&RangeHint::new(sys::HINT_TOGGLED | sys::HINT_DEFAULT_0, 0.0, 0.0));
        assert_eq!(r.default, 0.0);
    }

    #[test]
    fn test_inverted_bounds_are_swapped() {
        let r = resolve(&RangeHint::new(
            sys::HINT_BOUNDED_BELOW | sys::HINT_BOUNDED_ABOVE | sys::HINT_DEFAULT_MINIMUM,
            4.0,
            -4.0,
        ));
        assert_eq!((r.min, r.max, r.default), (-4.0, 4.0, -4.0));
    }

    #[test]
    fn test_default_within_range_for_all_combinations() {
        let bounds = [
            (0.0f32, 10.0f32),
            (0.001, 1.0),
            (-60.0, 12.0),
            (20.0, 20000.0),
            (1.0, 1.0),
            (0.0062740245, 0.0062740245),
        ];

        for flags in 0..64 {
            for &kind in &DEFAULTS {
                if is_literal(kind) {
                    continue;
                }
                for &(lower, upper) in &bounds {
                    let hint = RangeHint::new(flags | kind, lower, upper);
                    let r = resolve(&hint);
                    assert!(r.min <= r.max, "{:?} -> {:?}", hint, r);
                    assert!(r.min <= r.default && r.default <= r.max, "{:?} -> {:?}", hint, r);
                }
            }
        }
    }

    #[test]
    fn test_equal_bounds_default_is_exact() {
        let bounded = sys::HINT_BOUNDED_BELOW | sys::HINT_BOUNDED_ABOVE;
        let kinds = [sys::HINT_DEFAULT_LOW, sys::HINT_DEFAULT_MIDDLE, sys::HINT_DEFAULT_HIGH];

        let mut x = 0.0013f32;
        for _ in 0..60 {
            for scale in [0, sys::HINT_LOGARITHMIC] {
                for kind in kinds {
                    let r = resolve(&RangeHint::new(bounded | scale | kind, x, x));
                    assert_eq!(r.default, x, "flags {:#x} at {}", scale | kind, x);
                }
            }
            x *= 1.37;
        }
    }
}
