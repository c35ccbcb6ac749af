//! Indicator output aligned with the bar history.

use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Indicator values aligned 1:1 with their input.
///
/// Index `i` holds `None` until the lookback window ending at `i` is full.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorSeries<T = f64> {
    values: Vec<Option<T>>,
}

impl<T: Copy> IndicatorSeries<T> {
    /// Wrap precomputed values.
    pub fn new(values: Vec<Option<T>>) -> Self {
        Self { values }
    }

    /// A series of `len` undefined values.
    pub fn undefined(len: usize) -> Self {
        Self {
            values: vec![None; len],
        }
    }

    /// Build from the defined tail of a computation: `tail` covers the last
    /// `tail.len()` indices of a series of length `len`.
    pub fn from_tail(len: usize, tail: Vec<T>) -> Self {
        let warmup = len.saturating_sub(tail.len());
        let mut values = Vec::with_capacity(len);
        values.resize(warmup, None);
        values.extend(tail.into_iter().take(len).map(Some));
        Self { values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`, `None` when out of range or undefined.
    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        self.values.get(index).copied().flatten()
    }

    /// Most recent value.
    pub fn last(&self) -> Option<T> {
        self.values.last().copied().flatten()
    }

    /// Value one step before the most recent.
    pub fn previous(&self) -> Option<T> {
        self.len().checked_sub(2).and_then(|i| self.get(i))
    }

    /// Index of the first defined value.
    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }

    /// Iterate over the defined values only.
    pub fn defined(&self) -> impl Iterator<Item = T> + '_ {
        self.values.iter().filter_map(|v| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<T>> + '_ {
        self.values.iter().copied()
    }

    /// Project each defined value.
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> IndicatorSeries<U> {
        IndicatorSeries {
            values: self.values.iter().map(|v| v.map(&f)).collect(),
        }
    }
}

impl<T> Index<usize> for IndicatorSeries<T> {
    type Output = Option<T>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}
