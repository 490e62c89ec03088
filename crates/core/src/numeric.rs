//! Numeric helpers shared by the analyses.

/// `numerator / denominator`, or exactly `0.0` when the quotient is not a
/// finite number (zero denominator, NaN or infinite inputs).
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let q = numerator / denominator;
    if q.is_finite() { q } else { 0.0 }
}

/// Round half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

/// Pearson correlation of two equally long series.
///
/// Returns `None` when fewer than two points exist or either series has zero
/// variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom <= f64::EPSILON {
        return None;
    }
    Some(sxy / denom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn safe_ratio_is_zero_on_zero_denominator() {
        assert_eq!(safe_ratio(-30.0, 0.0), 0.0);
        assert_eq!(safe_ratio(0.0, 0.0), 0.0);
        assert_eq!(safe_ratio(f64::NAN, 2.0), 0.0);
    }

    #[test]
    fn safe_ratio_divides_normally() {
        assert!((safe_ratio(-30.0, 90.0) + 0.333_333).abs() < 1e-6);
        assert_eq!(safe_ratio(20.0, 100.0), 0.2);
    }

    #[test]
    fn round_to_two_places() {
        assert_eq!(round_to(12.345_6, 2), 12.35);
        assert_eq!(round_to(0.123_46, 4), 0.1235);
    }

    #[test]
    fn pearson_of_perfectly_linear_series() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&xs, &ys).unwrap() - 1.0).abs() < 1e-12);
        let inv = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&xs, &inv).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_is_undefined_for_constant_series() {
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
    }

    proptest! {
        #[test]
        fn safe_ratio_is_always_finite(n in proptest::num::f64::ANY, d in proptest::num::f64::ANY) {
            prop_assert!(safe_ratio(n, d).is_finite());
        }
    }
}
