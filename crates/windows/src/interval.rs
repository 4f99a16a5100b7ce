//! Labeled time intervals and a set-like collection with union.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Errors raised when constructing a window from invalid bounds.
#[derive(Debug, Error, PartialEq)]
pub enum IntervalError {
    #[error("window bounds must be finite (start = {start}, end = {end})")]
    NonFinite { start: f64, end: f64 },
    #[error("window start {start} is after its end {end}")]
    Inverted { start: f64, end: f64 },
    #[error("window [{start}, {end}) has zero duration")]
    Empty { start: f64, end: f64 },
}

/// Half-open time interval `[start, end)` of continuous visibility, tagged with the run that
/// produced it (typically an object-pair identifier).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Window {
    start: f64,
    end: f64,
    label: String,
}

impl Window {
    pub fn new(start: f64, end: f64, label: impl Into<String>) -> Result<Self, IntervalError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(IntervalError::NonFinite { start, end });
        }
        if start > end {
            return Err(IntervalError::Inverted { start, end });
        }
        if start == end {
            return Err(IntervalError::Empty { start, end });
        }
        Ok(Self {
            start,
            end,
            label: label.into(),
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// `true` when `start <= t < end`.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }

    /// `true` when the window shares any instant with `[start, end)`.
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.start < end && start < self.end
    }

    fn order(&self, other: &Self) -> Ordering {
        self.start
            .total_cmp(&other.start)
            .then_with(|| self.end.total_cmp(&other.end))
            .then_with(|| self.label.cmp(&other.label))
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Window({}, {}, {:?})", self.start, self.end, self.label)
    }
}

/// Set of labeled windows kept in `(start, end, label)` order.
///
/// Windows are never merged geometrically: overlapping windows with different labels stay
/// separate entries. Inserting a window identical to one already present is a no-op, which
/// makes [`IntervalCollection::union`] idempotent.
///
/// Not meant for concurrent mutation; shared read-only access is fine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IntervalCollection {
    windows: Vec<Window>,
}

impl IntervalCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a window; returns `false` if an identical window was already present.
    pub fn insert(&mut self, window: Window) -> bool {
        match self.windows.binary_search_by(|probe| probe.order(&window)) {
            Ok(_) => false,
            Err(pos) => {
                self.windows.insert(pos, window);
                true
            }
        }
    }

    /// Build and insert a window from raw bounds.
    pub fn insert_span(
        &mut self,
        start: f64,
        end: f64,
        label: impl Into<String>,
    ) -> Result<bool, IntervalError> {
        Ok(self.insert(Window::new(start, end, label)?))
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn contains(&self, window: &Window) -> bool {
        self.windows
            .binary_search_by(|probe| probe.order(window))
            .is_ok()
    }

    /// Windows in `(start, end, label)` order.
    pub fn iter(&self) -> std::slice::Iter<'_, Window> {
        self.windows.iter()
    }

    /// Windows containing the instant `t`.
    pub fn at(&self, t: f64) -> Vec<&Window> {
        self.windows.iter().filter(|w| w.contains(t)).collect()
    }

    /// Windows sharing any instant with `[start, end)`.
    pub fn overlapping(&self, start: f64, end: f64) -> Vec<&Window> {
        // Sorted by start, so nothing past the first window starting at or after `end` can overlap.
        let upper = self.windows.partition_point(|w| w.start < end);
        self.windows[..upper]
            .iter()
            .filter(|w| w.overlaps(start, end))
            .collect()
    }

    /// Windows carrying `label`, in time order.
    pub fn for_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Window> + 'a {
        self.windows.iter().filter(move |w| w.label == label)
    }

    pub fn labels(&self) -> BTreeSet<&str> {
        self.windows.iter().map(|w| w.label.as_str()).collect()
    }

    /// Summed duration of the windows carrying `label`.
    pub fn total_duration(&self, label: &str) -> f64 {
        self.for_label(label).map(Window::duration).sum()
    }

    /// Union of two collections. Every window of both operands is kept with its label;
    /// only exact duplicates collapse.
    pub fn union(&self, other: &Self) -> Self {
        let mut windows = Vec::with_capacity(self.len() + other.len());
        let mut left = self.windows.iter().peekable();
        let mut right = other.windows.iter().peekable();
        loop {
            let next = match (left.peek(), right.peek()) {
                (Some(a), Some(b)) => match a.order(b) {
                    Ordering::Less => left.next(),
                    Ordering::Greater => right.next(),
                    Ordering::Equal => {
                        right.next();
                        left.next()
                    }
                },
                (Some(_), None) => left.next(),
                (None, Some(_)) => right.next(),
                (None, None) => break,
            };
            if let Some(window) = next {
                windows.push(window.clone());
            }
        }
        Self { windows }
    }
}

impl FromIterator<Window> for IntervalCollection {
    fn from_iter<I: IntoIterator<Item = Window>>(iter: I) -> Self {
        let mut collection = Self::new();
        for window in iter {
            collection.insert(window);
        }
        collection
    }
}

impl Extend<Window> for IntervalCollection {
    fn extend<I: IntoIterator<Item = Window>>(&mut self, iter: I) {
        for window in iter {
            self.insert(window);
        }
    }
}

impl<'a> IntoIterator for &'a IntervalCollection {
    type Item = &'a Window;
    type IntoIter = std::slice::Iter<'a, Window>;

    fn into_iter(self) -> Self::IntoIter {
        self.windows.iter()
    }
}

impl IntoIterator for IntervalCollection {
    type Item = Window;
    type IntoIter = std::vec::IntoIter<Window>;

    fn into_iter(self) -> Self::IntoIter {
        self.windows.into_iter()
    }
}

impl fmt::Display for IntervalCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntervalCollection([")?;
        for (i, window) in self.windows.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{window}")?;
        }
        write!(f, "])")
    }
}
