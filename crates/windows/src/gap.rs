//! Local interpolants over one sampling gap, parameterised on `s ∈ [0, 1]`.

/// Bisection steps; enough to exhaust `f64` resolution on the unit interval.
const MAX_BISECTIONS: usize = 128;

/// Interpolant between two consecutive samples.
///
/// The end values are kept verbatim so that sign decisions at sample instants never depend on
/// polynomial round-off.
#[derive(Debug, Clone, Copy)]
pub(crate) enum GapFit {
    /// Straight line through the end values; at most one root.
    Linear { v0: f64, v1: f64 },
    /// Cubic Hermite in monomial form `a s³ + b s² + c s + d`; up to three roots.
    Cubic {
        v0: f64,
        v1: f64,
        a: f64,
        b: f64,
        c: f64,
    },
}

impl GapFit {
    pub(crate) fn linear(v0: f64, v1: f64) -> Self {
        GapFit::Linear { v0, v1 }
    }

    /// Cubic matching values `v0`, `v1` and time derivatives `d0`, `d1` over a gap of width `h`.
    pub(crate) fn hermite(v0: f64, v1: f64, d0: f64, d1: f64, h: f64) -> Self {
        let m0 = h * d0;
        let m1 = h * d1;
        GapFit::Cubic {
            v0,
            v1,
            a: 2.0 * v0 + m0 - 2.0 * v1 + m1,
            b: -3.0 * v0 - 2.0 * m0 + 3.0 * v1 - m1,
            c: m0,
        }
    }

    pub(crate) fn value(&self, s: f64) -> f64 {
        match *self {
            GapFit::Linear { v0, v1 } => {
                if s <= 0.0 {
                    v0
                } else if s >= 1.0 {
                    v1
                } else {
                    v0 + (v1 - v0) * s
                }
            }
            GapFit::Cubic { v0, v1, a, b, c } => {
                if s <= 0.0 {
                    v0
                } else if s >= 1.0 {
                    v1
                } else {
                    ((a * s + b) * s + c) * s + v0
                }
            }
        }
    }

    /// `0`, every stationary point strictly inside `(0, 1)` in increasing order, then `1`.
    /// The fit is monotone between consecutive breakpoints.
    pub(crate) fn breakpoints(&self) -> Vec<f64> {
        let mut points = vec![0.0];
        if let GapFit::Cubic { v0, v1, a, b, c } = *self {
            let mut stationary = stationary_points(a, b, c, v0, v1);
            stationary.retain(|s| *s > 0.0 && *s < 1.0);
            stationary.sort_by(f64::total_cmp);
            stationary.dedup();
            points.extend(stationary);
        }
        points.push(1.0);
        points
    }

    /// Root inside `(lo, hi)` given that the fit is monotone there and changes strict sign.
    pub(crate) fn root(&self, lo: f64, hi: f64) -> f64 {
        match *self {
            GapFit::Linear { v0, v1 } => {
                let s = v0 / (v0 - v1);
                s.clamp(lo, hi)
            }
            GapFit::Cubic { .. } => self.bisect(lo, hi),
        }
    }

    fn bisect(&self, mut lo: f64, mut hi: f64) -> f64 {
        let lo_negative = self.value(lo) < 0.0;
        for _ in 0..MAX_BISECTIONS {
            let mid = 0.5 * (lo + hi);
            if mid <= lo || mid >= hi {
                break;
            }
            let value = self.value(mid);
            if value == 0.0 {
                return mid;
            }
            if (value < 0.0) == lo_negative {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    }
}

/// Real roots of the derivative `3a s² + 2b s + c`.
fn stationary_points(a: f64, b: f64, c: f64, v0: f64, v1: f64) -> Vec<f64> {
    let qa = 3.0 * a;
    let qb = 2.0 * b;
    let qc = c;
    let scale = a.abs().max(b.abs()).max(c.abs()).max(v0.abs()).max(v1.abs());
    if scale == 0.0 {
        return Vec::new();
    }
    if qa.abs() <= f64::EPSILON * scale {
        if qb.abs() <= f64::EPSILON * scale {
            return Vec::new();
        }
        return vec![-qc / qb];
    }
    let discriminant = qb * qb - 4.0 * qa * qc;
    if discriminant < 0.0 {
        return Vec::new();
    }
    if discriminant == 0.0 {
        return vec![-qb / (2.0 * qa)];
    }
    // Numerically stable pair.
    let q = -0.5 * (qb + qb.signum() * discriminant.sqrt());
    if q == 0.0 {
        // qb == 0 and qc == 0: double stationary point at the origin.
        return vec![0.0];
    }
    vec![q / qa, qc / q]
}
