// fortnml/src/findex.rs

//! Column-major Fortran iterator of indices across multiple dimensions.
//!
//! An [`FIndex`] walks the subscripts of an array assignment such as
//! `v(1:3, 2:4:2) = ...` in the order Fortran fills them: the leftmost axis
//! varies fastest. An axis without an upper bound makes the iterator
//! unbounded, which is how `v(3:) = 1, 2, 3, ...` keeps accepting values.

/// A single `start:end:stride` subscript triplet. Unset parts are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBound {
    pub start: Option<i64>,
    /// Inclusive upper (or, for negative strides, lower) bound.
    pub end: Option<i64>,
    pub stride: Option<i64>,
}

impl IndexBound {
    pub fn new(start: Option<i64>, end: Option<i64>, stride: Option<i64>) -> Self {
        Self { start, end, stride }
    }

    /// Create a simple range from start to end.
    pub fn range(start: i64, end: i64) -> Self {
        Self::new(Some(start), Some(end), None)
    }

    /// Create a single index.
    pub fn single(index: i64) -> Self {
        Self::new(Some(index), Some(index), None)
    }

    /// Create an implicit range (`:`).
    pub fn implicit() -> Self {
        Self::new(None, None, None)
    }

    /// True when the triplet addresses exactly one element.
    pub fn is_single(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s == e)
    }

    /// The lowest subscript this triplet will produce, if known.
    fn lowest(&self) -> Option<i64> {
        let start = self.start?;
        match (self.end, self.stride) {
            (Some(end), Some(step)) if step < 0 && end <= start => {
                let span = step.abs();
                Some(start - ((start - end) / span) * span)
            }
            _ => Some(start),
        }
    }
}

/// Column-major multidimensional index iterator for Fortran-style arrays.
#[derive(Debug, Clone)]
pub struct FIndex {
    current: Vec<i64>,
    start: Vec<i64>,
    end: Vec<Option<i64>>,
    step: Vec<i64>,
    /// Lowest subscript seen per axis; `None` when it is not yet known.
    pub first: Vec<Option<i64>>,
}

impl FIndex {
    /// Create a new iterator from per-axis bounds.
    ///
    /// Unset starts default to 1 and unset strides to 1. When `global_start`
    /// is given, each axis' first index is lowered to it if necessary.
    pub fn new(bounds: &[IndexBound], global_start: Option<i64>) -> Self {
        let start: Vec<i64> = bounds.iter().map(|b| b.start.unwrap_or(1)).collect();
        let end = bounds.iter().map(|b| b.end).collect();
        let step = bounds.iter().map(|b| b.stride.unwrap_or(1)).collect();

        let first = match global_start {
            Some(global) => start.iter().map(|&s| Some(global.min(s))).collect(),
            None => bounds.iter().map(IndexBound::lowest).collect(),
        };

        Self {
            current: start.clone(),
            start,
            end,
            step,
            first,
        }
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.current.len()
    }

    /// True when the outermost axis has no bound, so the iterator never ends.
    pub fn is_unbounded(&self) -> bool {
        self.end.last().map_or(true, Option::is_none)
    }

    /// Lower each axis' first index to the prior record where that is smaller.
    ///
    /// An axis stays `None` only if neither side knows its start.
    pub fn reconcile_first(&mut self, prior: &[Option<i64>]) {
        for (first, prior) in self.first.iter_mut().zip(prior) {
            *first = match (*first, *prior) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
        }
    }

    fn in_range(&self, rank: usize, idx: i64) -> bool {
        match self.end[rank] {
            None => true,
            Some(end) if self.step[rank] > 0 => idx <= end,
            Some(end) => idx >= end,
        }
    }

    /// Return the current index tuple and advance, or `None` once exhausted.
    pub fn advance(&mut self) -> Option<Vec<i64>> {
        let last = self.current.len().checked_sub(1)?;
        if !self.in_range(last, self.current[last]) {
            return None;
        }

        let state = self.current.clone();
        for rank in 0..=last {
            let next = self.current[rank] + self.step[rank];
            if rank == last || self.in_range(rank, next) {
                self.current[rank] = next;
                break;
            }
            self.current[rank] = self.start[rank];
        }

        Some(state)
    }
}

impl Iterator for FIndex {
    type Item = Vec<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}
