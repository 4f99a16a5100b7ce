//! Zero-crossing detection and visibility window assembly.
//!
//! Each sampling gap is replaced by a local interpolant (a line, or a cubic Hermite when
//! derivatives are available) and split at the interpolant's stationary points into monotone
//! segments. A segment whose ends have opposite strict signs holds exactly one root, which is
//! isolated by bisection. The series then becomes an ordered list of signed pieces, and a
//! crossing is reported wherever the sign of consecutive non-zero pieces flips. Zeros that do
//! not separate opposite signs (tangent touches) are not crossings.

use serde::Serialize;
use tracing::{debug, warn};

use crate::ExtractionError;
use crate::estimate::pchip_slopes;
use crate::gap::GapFit;
use crate::interval::{IntervalCollection, Window};
use crate::series::VisibilitySeries;

/// How each sampling gap is interpolated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Cubic Hermite fit through values and derivatives. Finds up to three crossings per gap,
    /// including a window that opens and closes between two samples.
    #[default]
    Derivative,
    /// Sign comparison of the end values with linear interpolation. At most one crossing per
    /// gap; double and triple crossings inside a gap are invisible to this mode.
    Endpoint,
}

impl ExtractionMode {
    /// Parse a mode name leniently. Unrecognized names fall back to [`ExtractionMode::Endpoint`]
    /// with a warning instead of failing.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "der" | "derivative" | "hermite" => ExtractionMode::Derivative,
            "linear" | "endpoint" | "sign" => ExtractionMode::Endpoint,
            other => {
                warn!(
                    mode = other,
                    "unrecognized extraction mode; using endpoint sign detection without derivative information"
                );
                ExtractionMode::Endpoint
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ExtractionMode::Derivative => "der",
            ExtractionMode::Endpoint => "linear",
        }
    }
}

/// Whether visibility begins or ends at a crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossingDirection {
    Rise,
    Set,
}

impl CrossingDirection {
    /// `+1` for a rise, `-1` for a set.
    pub fn sign(self) -> i8 {
        match self {
            CrossingDirection::Rise => 1,
            CrossingDirection::Set => -1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CrossingDirection::Rise => "rise",
            CrossingDirection::Set => "set",
        }
    }
}

/// Instant at which the interpolated visibility changes sign.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Crossing {
    pub time: f64,
    pub direction: CrossingDirection,
}

/// Crossings in increasing time order plus the windows assembled from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WindowExtraction {
    pub crossings: Vec<Crossing>,
    pub windows: IntervalCollection,
}

impl WindowExtraction {
    pub fn crossing_times(&self) -> Vec<f64> {
        self.crossings.iter().map(|c| c.time).collect()
    }

    /// Direction flags parallel to [`WindowExtraction::crossing_times`].
    pub fn directions(&self) -> Vec<CrossingDirection> {
        self.crossings.iter().map(|c| c.direction).collect()
    }
}

/// Extract crossings and windows from a value-only history.
///
/// In [`ExtractionMode::Derivative`] the missing derivatives are estimated with
/// shape-preserving slopes.
pub fn extract_windows(
    values: &[f64],
    times: &[f64],
    label: &str,
    mode: ExtractionMode,
) -> Result<WindowExtraction, ExtractionError> {
    let series = VisibilitySeries::new(times, values)?;
    Ok(extract_series(&series, label, mode))
}

/// Extract crossings and windows from a history with analytic derivatives.
pub fn extract_windows_with_derivatives(
    values: &[f64],
    derivatives: &[f64],
    times: &[f64],
    label: &str,
    mode: ExtractionMode,
) -> Result<WindowExtraction, ExtractionError> {
    let series = VisibilitySeries::with_derivatives(times, values, derivatives)?;
    Ok(extract_series(&series, label, mode))
}

/// Extract crossings and windows from an already validated series.
///
/// Series with fewer than two samples have no duration and produce an empty result. A series
/// that starts visible opens a window at its first instant; one that ends visible closes its
/// last window at the final instant.
pub fn extract_series(
    series: &VisibilitySeries<'_>,
    label: &str,
    mode: ExtractionMode,
) -> WindowExtraction {
    if series.len() < 2 {
        debug!(samples = series.len(), "series too short to hold a window");
        return WindowExtraction::default();
    }

    let pieces = signed_pieces(series, mode);
    let (crossings, initially_visible) = crossings_from_pieces(&pieces);

    let times = series.times();
    let windows = assemble_windows(
        &crossings,
        initially_visible,
        times[0],
        times[times.len() - 1],
        label,
    );

    WindowExtraction { crossings, windows }
}

/// Stretch of time over which the interpolated visibility has one sign (`-1`, `0`, `+1`).
/// Zero-length pieces mark instants.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Piece {
    start: f64,
    end: f64,
    sign: i8,
}

fn sign_of(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

fn signed_pieces(series: &VisibilitySeries<'_>, mode: ExtractionMode) -> Vec<Piece> {
    let times = series.times();
    let values = series.values();

    let slopes: Option<Vec<f64>> = match mode {
        ExtractionMode::Endpoint => None,
        ExtractionMode::Derivative => Some(match series.derivatives() {
            Some(derivatives) => match series
                .unreliable_derivatives()
                .filter(|mask| mask.iter().any(|&u| u))
            {
                Some(mask) => {
                    debug!(
                        unreliable = mask.iter().filter(|&&u| u).count(),
                        "re-estimating unreliable derivatives from neighbouring samples"
                    );
                    let estimated = pchip_slopes(times, values);
                    derivatives
                        .iter()
                        .zip(mask)
                        .zip(&estimated)
                        .map(|((&d, &u), &e)| if u { e } else { d })
                        .collect()
                }
                None => derivatives.to_vec(),
            },
            None => {
                debug!("no derivatives supplied; estimating shape-preserving slopes");
                pchip_slopes(times, values)
            }
        }),
    };

    let mut pieces = Vec::with_capacity(4 * times.len());
    for i in 0..times.len() - 1 {
        let (t0, t1) = (times[i], times[i + 1]);
        let h = t1 - t0;
        let fit = match &slopes {
            Some(d) => GapFit::hermite(values[i], values[i + 1], d[i], d[i + 1], h),
            None => GapFit::linear(values[i], values[i + 1]),
        };
        let at = |s: f64| if s >= 1.0 { t1 } else { t0 + s * h };

        let breakpoints = fit.breakpoints();
        let levels: Vec<f64> = breakpoints.iter().map(|&s| fit.value(s)).collect();

        push_piece(&mut pieces, t0, t0, sign_of(levels[0]));
        for j in 0..breakpoints.len() - 1 {
            let (s_lo, s_hi) = (breakpoints[j], breakpoints[j + 1]);
            let (lo, hi) = (sign_of(levels[j]), sign_of(levels[j + 1]));
            let (t_lo, t_hi) = (at(s_lo), at(s_hi));
            if lo != 0 && hi != 0 && lo != hi {
                let t_root = at(fit.root(s_lo, s_hi));
                push_piece(&mut pieces, t_lo, t_root, lo);
                push_piece(&mut pieces, t_root, t_root, 0);
                push_piece(&mut pieces, t_root, t_hi, hi);
            } else {
                // Monotone segment without a strict sign change keeps the sign of its
                // non-zero end; both ends zero means the fit vanishes identically.
                let sign = if lo != 0 { lo } else { hi };
                push_piece(&mut pieces, t_lo, t_hi, sign);
            }
            push_piece(&mut pieces, t_hi, t_hi, hi);
        }
    }
    pieces
}

fn push_piece(pieces: &mut Vec<Piece>, start: f64, end: f64, sign: i8) {
    if let Some(last) = pieces.last_mut() {
        if last.sign == sign {
            last.end = last.end.max(end);
            return;
        }
    }
    pieces.push(Piece { start, end, sign });
}

/// Crossings between consecutive non-zero pieces of opposite sign, and whether the series
/// starts visible.
///
/// A set is placed where the visible piece ends and a rise where the next visible piece
/// begins, so a run of exact zeros between them counts as not visible.
fn crossings_from_pieces(pieces: &[Piece]) -> (Vec<Crossing>, bool) {
    let mut crossings = Vec::new();
    let mut previous: Option<Piece> = None;
    let mut initially_visible = false;
    for piece in pieces.iter().filter(|p| p.sign != 0) {
        match previous {
            None => initially_visible = piece.sign > 0,
            Some(prev) if prev.sign != piece.sign => {
                let crossing = if piece.sign > 0 {
                    Crossing {
                        time: piece.start,
                        direction: CrossingDirection::Rise,
                    }
                } else {
                    Crossing {
                        time: prev.end,
                        direction: CrossingDirection::Set,
                    }
                };
                crossings.push(crossing);
            }
            Some(_) => {}
        }
        previous = Some(*piece);
    }
    (crossings, initially_visible)
}

fn assemble_windows(
    crossings: &[Crossing],
    initially_visible: bool,
    first: f64,
    last: f64,
    label: &str,
) -> IntervalCollection {
    let mut windows = IntervalCollection::new();
    let mut open = initially_visible.then_some(first);
    let mut close = |start: f64, end: f64| match Window::new(start, end, label) {
        Ok(window) => {
            windows.insert(window);
        }
        Err(err) => debug!(%err, "skipping degenerate window"),
    };
    for crossing in crossings {
        match crossing.direction {
            CrossingDirection::Rise => open = Some(crossing.time),
            CrossingDirection::Set => {
                if let Some(start) = open.take() {
                    close(start, crossing.time);
                }
            }
        }
    }
    if let Some(start) = open {
        close(start, last);
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::CrossingDirection::{Rise, Set};

    const T5: [f64; 5] = [0.0, 1.0, 2.0, 3.0, 4.0];

    fn run(values: &[f64], mode: ExtractionMode) -> WindowExtraction {
        let times: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
        extract_windows(values, &times, "test", mode).unwrap()
    }

    fn spans(extraction: &WindowExtraction) -> Vec<(f64, f64)> {
        extraction
            .windows
            .iter()
            .map(|w| (w.start(), w.end()))
            .collect()
    }

    #[test]
    fn never_visible_series_has_no_windows() {
        let vis = [-1.0, -0.9, -0.8, -0.01, -0.1];
        for mode in [ExtractionMode::Derivative, ExtractionMode::Endpoint] {
            let out = extract_windows(&vis, &T5, "none", mode).unwrap();
            assert!(out.crossings.is_empty());
            assert!(out.windows.is_empty());
        }
    }

    #[test]
    fn always_visible_series_is_one_window() {
        let vis = [1.0, 0.9, 0.8, 0.01, 0.1];
        for mode in [ExtractionMode::Derivative, ExtractionMode::Endpoint] {
            let out = extract_windows(&vis, &T5, "all", mode).unwrap();
            assert!(out.crossings.is_empty());
            assert_eq!(spans(&out), vec![(0.0, 4.0)]);
        }
    }

    #[test]
    fn single_rise_ends_visible() {
        let out = run(&[-1.0, -0.1, 0.5, 4.0, 2.0], ExtractionMode::Derivative);
        assert_eq!(out.directions(), vec![Rise]);
        let t = out.crossing_times()[0];
        assert!(t > 1.0 && t < 2.0, "rise at {t}");
        assert_eq!(spans(&out), vec![(t, 4.0)]);
    }

    #[test]
    fn single_set_starts_visible() {
        let out = run(&[1.0, 0.1, -0.5, -4.0, -2.0], ExtractionMode::Derivative);
        assert_eq!(out.directions(), vec![Set]);
        let t = out.crossing_times()[0];
        assert!(t > 1.0 && t < 2.0, "set at {t}");
        assert_eq!(spans(&out), vec![(0.0, t)]);
    }

    #[test]
    fn endpoint_mode_interpolates_linearly() {
        let out = run(&[-1.0, -0.1, 0.5, 4.0, 2.0], ExtractionMode::Endpoint);
        assert_eq!(out.directions(), vec![Rise]);
        assert!((out.crossings[0].time - (1.0 + 0.1 / 0.6)).abs() < 1e-12);
    }

    #[test]
    fn straddling_patterns() {
        let cases: [(&[f64], Vec<CrossingDirection>, usize); 6] = [
            (&[-1.0, 0.2, 0.5, 4.0, 2.0], vec![Rise], 1),
            (&[1.0, -0.2, -0.5, -4.0, -2.0], vec![Set], 1),
            (&[1.0, -0.2, 0.5, 4.0, 2.0], vec![Set, Rise], 2),
            (&[-1.0, 0.2, -0.5, -4.0, -2.0], vec![Rise, Set], 1),
            (&[1.0, -0.2, 0.5, -4.0, -2.0], vec![Set, Rise, Set], 2),
            (&[-1.0, 0.2, -0.5, 4.0, 2.0], vec![Rise, Set, Rise], 2),
        ];
        for (vis, directions, window_count) in cases {
            for mode in [ExtractionMode::Derivative, ExtractionMode::Endpoint] {
                let out = run(vis, mode);
                assert_eq!(out.directions(), directions, "{vis:?} in {mode:?}");
                assert_eq!(out.windows.len(), window_count, "{vis:?} in {mode:?}");
                assert!(out.crossing_times().windows(2).all(|w| w[0] < w[1]));
            }
        }
    }

    #[test]
    fn excursion_after_several_flat_frames() {
        let out = run(
            &[-1.0, -1.0, -1.0, -1.0, -0.2, 0.5, -4.0, -2.0],
            ExtractionMode::Derivative,
        );
        assert_eq!(out.directions(), vec![Rise, Set]);
        let w: Vec<_> = out.windows.iter().collect();
        assert_eq!(w.len(), 1);
        assert!(w[0].start() > 4.0 && w[0].end() < 6.0);

        let out = run(
            &[1.0, 1.0, 1.0, 1.0, 0.2, -0.5, 4.0, 2.0],
            ExtractionMode::Derivative,
        );
        assert_eq!(out.directions(), vec![Set, Rise]);
        assert_eq!(out.windows.len(), 2);
    }

    #[test]
    fn derivatives_reveal_a_window_inside_one_gap() {
        let t = [0.0, 1.0];
        let v = [-1.0, -1.0];
        let d = [6.0, -6.0];
        let with = extract_windows_with_derivatives(&v, &d, &t, "gap", ExtractionMode::Derivative)
            .unwrap();
        assert_eq!(with.directions(), vec![Rise, Set]);
        let expected = (3.0 - 3.0_f64.sqrt()) / 6.0;
        assert!((with.crossings[0].time - expected).abs() < 1e-9);
        assert!((with.crossings[1].time - (1.0 - expected)).abs() < 1e-9);
        assert_eq!(with.windows.len(), 1);

        let without =
            extract_windows_with_derivatives(&v, &d, &t, "gap", ExtractionMode::Endpoint).unwrap();
        assert!(without.crossings.is_empty());
        assert!(without.windows.is_empty());
    }

    #[test]
    fn triple_crossing_inside_one_gap() {
        // v(s) = (s - 0.2)(s - 0.5)(s - 0.8) over a unit gap.
        let v = [-0.08, 0.08];
        let d = [0.66, 0.66];
        let out = extract_windows_with_derivatives(
            &v,
            &d,
            &[0.0, 1.0],
            "triple",
            ExtractionMode::Derivative,
        )
        .unwrap();
        assert_eq!(out.directions(), vec![Rise, Set, Rise]);
        for (got, want) in out.crossing_times().iter().zip([0.2, 0.5, 0.8]) {
            assert!((got - want).abs() < 1e-9, "{got} vs {want}");
        }
        assert_eq!(spans(&out).len(), 2);
        assert!((spans(&out)[1].1 - 1.0).abs() < 1e-12);

        let linear = extract_windows_with_derivatives(
            &v,
            &d,
            &[0.0, 1.0],
            "triple",
            ExtractionMode::Endpoint,
        )
        .unwrap();
        assert_eq!(linear.directions(), vec![Rise]);
    }

    #[test]
    fn unreliable_derivative_is_replaced_by_an_estimate() {
        // Monotone, strictly negative climb whose first rate is a floored singular value.
        let t = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let v = [-0.369, -0.324, -0.306, -0.292, -0.280, -0.269];
        let d = [1.0e9, 0.0223, 0.0158, 0.0129, 0.0112, 0.01];

        let trusted = VisibilitySeries::with_derivatives(&t, &v, &d).unwrap();
        let spurious = extract_series(&trusted, "launch", ExtractionMode::Derivative);
        assert!(!spurious.crossings.is_empty());

        let mask = [true, false, false, false, false, false];
        let series = trusted.with_unreliable_derivatives(&mask).unwrap();
        let out = extract_series(&series, "launch", ExtractionMode::Derivative);
        assert!(out.crossings.is_empty());
        assert!(out.windows.is_empty());

        // an all-clear mask changes nothing
        let clear = [false; 6];
        let series = VisibilitySeries::with_derivatives(&t, &v, &d)
            .unwrap()
            .with_unreliable_derivatives(&clear)
            .unwrap();
        assert_eq!(
            extract_series(&series, "launch", ExtractionMode::Derivative),
            spurious
        );
    }

    #[test]
    fn tangent_touch_is_not_a_crossing() {
        // v(s) = -(s - 0.5)², touching zero at s = 0.5 from below.
        let out = extract_windows_with_derivatives(
            &[-0.25, -0.25],
            &[1.0, -1.0],
            &[0.0, 1.0],
            "touch",
            ExtractionMode::Derivative,
        )
        .unwrap();
        assert!(out.crossings.is_empty());
        assert!(out.windows.is_empty());
    }

    #[test]
    fn inflection_through_zero_is_one_crossing() {
        // v(s) = (s - 0.5)³: stationary and zero at s = 0.5 but still changes sign.
        let out = extract_windows_with_derivatives(
            &[-0.125, 0.125],
            &[0.75, 0.75],
            &[0.0, 1.0],
            "inflect",
            ExtractionMode::Derivative,
        )
        .unwrap();
        assert_eq!(out.directions(), vec![Rise]);
        assert!((out.crossings[0].time - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_sample_is_reported_once() {
        let out = run(&[-1.0, 0.0, 1.0], ExtractionMode::Endpoint);
        assert_eq!(out.directions(), vec![Rise]);
        assert_eq!(out.crossing_times(), vec![1.0]);
        assert_eq!(spans(&out), vec![(1.0, 2.0)]);
    }

    #[test]
    fn touching_zero_at_a_sample_keeps_the_window_open() {
        let out = run(&[1.0, 0.0, 1.0], ExtractionMode::Endpoint);
        assert!(out.crossings.is_empty());
        assert_eq!(spans(&out), vec![(0.0, 2.0)]);
    }

    #[test]
    fn zero_plateau_splits_rise_at_its_end() {
        let out = run(&[-1.0, 0.0, 0.0, 1.0], ExtractionMode::Endpoint);
        assert_eq!(out.crossing_times(), vec![2.0]);
        let out = run(&[1.0, 0.0, 0.0, -1.0], ExtractionMode::Endpoint);
        assert_eq!(out.directions(), vec![Set]);
        assert_eq!(out.crossing_times(), vec![1.0]);
        assert_eq!(spans(&out), vec![(0.0, 1.0)]);
    }

    #[test]
    fn all_zero_series_is_never_visible() {
        let out = run(&[0.0, 0.0, 0.0], ExtractionMode::Derivative);
        assert!(out.crossings.is_empty());
        assert!(out.windows.is_empty());
    }

    #[test]
    fn short_series_are_empty() {
        assert_eq!(
            extract_windows(&[], &[], "x", ExtractionMode::Derivative).unwrap(),
            WindowExtraction::default()
        );
        assert_eq!(
            extract_windows(&[1.0], &[0.0], "x", ExtractionMode::Derivative).unwrap(),
            WindowExtraction::default()
        );
    }

    #[test]
    fn unknown_mode_falls_back_to_endpoint() {
        assert_eq!(ExtractionMode::from_name("der"), ExtractionMode::Derivative);
        assert_eq!(ExtractionMode::from_name(" Linear "), ExtractionMode::Endpoint);
        assert_eq!(ExtractionMode::from_name("hey"), ExtractionMode::Endpoint);

        let t: Vec<f64> = (0..5).map(|i| i as f64 * 1.25).collect();
        let out = extract_windows(
            &[-1.0, -3.0, -4.0, -5.0, -6.0],
            &t,
            "hey",
            ExtractionMode::from_name("hey"),
        )
        .unwrap();
        assert!(out.crossings.is_empty());
        assert!(out.windows.is_empty());
    }

    #[test]
    fn malformed_input_is_rejected_before_extraction() {
        assert!(matches!(
            extract_windows(&[1.0, 2.0], &[0.0, 0.0], "x", ExtractionMode::Endpoint),
            Err(ExtractionError::NonIncreasingTime { index: 1, .. })
        ));
        assert!(matches!(
            extract_windows(&[1.0, 2.0, 3.0], &[0.0, 1.0], "x", ExtractionMode::Endpoint),
            Err(ExtractionError::LengthMismatch { .. })
        ));
    }
}
