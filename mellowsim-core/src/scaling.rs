//! Magnification bookkeeping and the iteration-budget scaling law.

/// Iteration budget for a region at `magnification`.
///
/// `base_iter · (ln(m)² + 1)`: the root (m = 1) gets exactly `base_iter`, and
/// the budget grows with the square of log-magnification. Saturates at
/// `u32::MAX`.
pub fn iteration_budget(base_iter: u32, magnification: u64) -> u32 {
    let ln_m = (magnification.max(1) as f64).ln();
    let budget = base_iter as f64 * (ln_m * ln_m + 1.0);
    // `as` saturates for out-of-range floats.
    budget as u32
}

/// Accumulate one zoom-in step into the magnification counter.
///
/// The quotient is rounded to the nearest integer and never allowed below
/// the current value, so the counter is non-decreasing from root to tip.
pub fn accumulate_magnification(current: u64, zoom_factor: f64) -> u64 {
    if !(zoom_factor > 0.0 && zoom_factor.is_finite()) {
        return current;
    }
    let next = (current as f64 / zoom_factor).round() as u64;
    next.max(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_budget_is_base() {
        assert_eq!(iteration_budget(1000, 1), 1000);
        // A zero counter is treated as the root.
        assert_eq!(iteration_budget(1000, 0), 1000);
    }

    #[test]
    fn budget_follows_log_squared_law() {
        let m: u64 = 25;
        let ln = (m as f64).ln();
        let expected = (1000.0 * (ln * ln + 1.0)) as u32;
        assert_eq!(iteration_budget(1000, m), expected);
        assert_eq!(iteration_budget(1000, m), iteration_budget(1000, m));
    }

    #[test]
    fn budget_is_non_decreasing() {
        let mut prev = 0;
        for m in [1u64, 2, 3, 5, 10, 25, 125, 10_000, 1 << 40, u64::MAX] {
            let b = iteration_budget(500, m);
            assert!(b >= prev, "budget dropped at magnification {m}");
            prev = b;
        }
    }

    #[test]
    fn two_zooms_at_one_fifth() {
        let first = accumulate_magnification(1, 0.2);
        assert_eq!(first, 5);
        assert_eq!(accumulate_magnification(first, 0.2), 25);
    }

    #[test]
    fn magnification_never_decreases() {
        assert_eq!(accumulate_magnification(7, 0.999_999), 7);
        assert_eq!(accumulate_magnification(7, 0.0), 7);
        assert_eq!(accumulate_magnification(7, f64::NAN), 7);
        assert!(accumulate_magnification(u64::MAX / 2, 0.01) >= u64::MAX / 2);
    }

    #[test]
    fn magnification_and_budget_across_zoom_range() {
        let mut zf = 0.01;
        while zf <= 0.5 + 1e-12 {
            let mut m = 1u64;
            let mut budget = iteration_budget(1000, m);
            for _ in 0..4 {
                let next = accumulate_magnification(m, zf);
                assert_eq!(next, (m as f64 / zf).round() as u64, "zoom factor {zf}");
                assert!(next >= m);
                let next_budget = iteration_budget(1000, next);
                assert!(next_budget >= budget, "budget dropped at zoom factor {zf}");
                m = next;
                budget = next_budget;
            }
            zf += 0.01;
        }
    }
}
