//! Shape-preserving slope estimates for series sampled without derivatives.
//!
//! Fritsch–Carlson (PCHIP) slopes: the Hermite fit built from them is monotone wherever the
//! samples are, so it never invents a sign excursion that the samples do not show.

/// Estimate `dv/dt` at every sample. `times` must be strictly increasing and the same length
/// as `values`.
pub(crate) fn pchip_slopes(times: &[f64], values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let h: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = values
        .windows(2)
        .zip(&h)
        .map(|(v, h)| (v[1] - v[0]) / h)
        .collect();
    if n == 2 {
        return vec![delta[0], delta[0]];
    }

    let mut slopes = vec![0.0; n];
    for k in 1..n - 1 {
        let (d_prev, d_next) = (delta[k - 1], delta[k]);
        if d_prev == 0.0 || d_next == 0.0 || d_prev.signum() != d_next.signum() {
            continue;
        }
        let w1 = 2.0 * h[k] + h[k - 1];
        let w2 = h[k] + 2.0 * h[k - 1];
        slopes[k] = (w1 + w2) / (w1 / d_prev + w2 / d_next);
    }
    slopes[0] = end_slope(h[0], h[1], delta[0], delta[1]);
    slopes[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    slopes
}

/// One-sided three-point slope, limited to keep the end interval monotone.
fn end_slope(h0: f64, h1: f64, delta0: f64, delta1: f64) -> f64 {
    let slope = ((2.0 * h0 + h1) * delta0 - h0 * delta1) / (h0 + h1);
    if slope.signum() != delta0.signum() || delta0 == 0.0 {
        0.0
    } else if delta0.signum() != delta1.signum() && slope.abs() > 3.0 * delta0.abs() {
        3.0 * delta0
    } else {
        slope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gap::GapFit;

    #[test]
    fn linear_data_gets_exact_slopes() {
        let t = [0.0, 1.0, 3.0, 4.0];
        let v = [1.0, 3.0, 7.0, 9.0];
        for s in pchip_slopes(&t, &v) {
            assert!((s - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn local_extrema_get_zero_slope() {
        let t = [0.0, 1.0, 2.0, 3.0, 4.0];
        let v = [-1.0, -0.9, -0.8, -0.01, -0.1];
        let slopes = pchip_slopes(&t, &v);
        assert_eq!(slopes[3], 0.0);
        // no gap of the resulting fit rises above zero
        for i in 0..4 {
            let fit = GapFit::hermite(v[i], v[i + 1], slopes[i], slopes[i + 1], 1.0);
            for bp in fit.breakpoints() {
                assert!(fit.value(bp) < 0.0, "gap {i} reaches {}", fit.value(bp));
            }
        }
    }

    #[test]
    fn two_samples_use_the_secant() {
        assert_eq!(pchip_slopes(&[0.0, 2.0], &[1.0, -3.0]), vec![-2.0, -2.0]);
        assert!(pchip_slopes(&[0.0], &[1.0]).iter().all(|s| *s == 0.0));
    }
}
