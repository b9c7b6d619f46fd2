//! Ordered, deduplicated sets of cut positions.
//!
//! `SortedIntSet` keeps a plain sorted vector next to a hash set for
//! membership tests. `RangeIntSet` stores closed runs of consecutive values,
//! which stays small when cuts cluster densely. Both behave like an ascending
//! array without duplicates, and compare equal whenever their elements do.

use crate::error::{DigestError, Result};
use std::{
    collections::HashSet,
    ops::{Add, Range, RangeInclusive},
};

pub trait IntSet: Clone + Default + std::fmt::Debug {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, value: isize) -> bool;

    /// Adds `value` at its sorted position. Returns false if it was present.
    fn insert(&mut self, value: isize) -> bool;

    fn get(&self, index: usize) -> Option<isize>;

    fn iter(&self) -> impl DoubleEndedIterator<Item = isize> + '_;

    fn remove(&mut self, value: isize) -> Result<bool>;

    /// Replaces the element at `index` and returns the old value.
    fn replace_at(&mut self, index: usize, value: isize) -> Result<Option<isize>>;

    fn extend_from<I: IntoIterator<Item = isize>>(&mut self, values: I) {
        for value in values {
            self.insert(value);
        }
    }

    fn first(&self) -> Option<isize> {
        self.iter().next()
    }

    fn last(&self) -> Option<isize> {
        self.iter().next_back()
    }

    fn to_vec(&self) -> Vec<isize> {
        self.iter().collect()
    }

    /// The elements at `range` of the ascending sequence, clamped to its end.
    fn slice(&self, range: Range<usize>) -> Vec<isize> {
        self.iter()
            .skip(range.start)
            .take(range.end.saturating_sub(range.start))
            .collect()
    }

    fn union(&self, other: &Self) -> Self {
        let mut ret = self.clone();
        ret.extend_from(other.iter());
        ret
    }
}

#[derive(Clone, Debug, Default)]
pub struct SortedIntSet {
    values: Vec<isize>,
    members: HashSet<isize>,
}

impl IntSet for SortedIntSet {
    #[inline(always)]
    fn len(&self) -> usize {
        self.values.len()
    }

    #[inline(always)]
    fn contains(&self, value: isize) -> bool {
        self.members.contains(&value)
    }

    fn insert(&mut self, value: isize) -> bool {
        if !self.members.insert(value) {
            return false;
        }
        let pos = self.values.partition_point(|v| *v < value);
        self.values.insert(pos, value);
        true
    }

    #[inline(always)]
    fn get(&self, index: usize) -> Option<isize> {
        self.values.get(index).copied()
    }

    fn iter(&self) -> impl DoubleEndedIterator<Item = isize> + '_ {
        self.values.iter().copied()
    }

    fn remove(&mut self, value: isize) -> Result<bool> {
        if !self.members.remove(&value) {
            return Ok(false);
        }
        let pos = self.values.partition_point(|v| *v < value);
        self.values.remove(pos);
        Ok(true)
    }

    fn replace_at(&mut self, index: usize, value: isize) -> Result<Option<isize>> {
        let old = match self.get(index) {
            Some(old) => old,
            None => return Ok(None),
        };
        self.remove(old)?;
        self.insert(value);
        Ok(Some(old))
    }

    fn slice(&self, range: Range<usize>) -> Vec<isize> {
        let end = range.end.min(self.values.len());
        let start = range.start.min(end);
        self.values[start..end].to_vec()
    }
}

/// Closed runs `(start, end)`, ascending, never touching or overlapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeIntSet {
    runs: Vec<(isize, isize)>,
    len: usize,
}

impl RangeIntSet {
    /// The internal run-length form.
    pub fn ranges(&self) -> Vec<RangeInclusive<isize>> {
        self.runs.iter().map(|(s, e)| *s..=*e).collect()
    }

    pub fn insert_range(&mut self, range: RangeInclusive<isize>) {
        if range.is_empty() {
            return;
        }
        let mut runs = std::mem::take(&mut self.runs);
        runs.push((*range.start(), *range.end()));
        self.runs = Self::coalesce(runs);
        self.recount();
    }

    /// Merges runs that overlap or touch, like a sweep over sorted intervals.
    fn coalesce(mut runs: Vec<(isize, isize)>) -> Vec<(isize, isize)> {
        runs.sort_unstable();
        let mut ret: Vec<(isize, isize)> = Vec::with_capacity(runs.len());
        for (start, end) in runs {
            match ret.last_mut() {
                Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
                _ => ret.push((start, end)),
            }
        }
        ret
    }

    fn recount(&mut self) {
        self.len = self
            .runs
            .iter()
            .map(|(s, e)| (e - s) as usize + 1)
            .sum();
    }
}

impl IntSet for RangeIntSet {
    #[inline(always)]
    fn len(&self) -> usize {
        self.len
    }

    fn contains(&self, value: isize) -> bool {
        let idx = self.runs.partition_point(|(_, end)| *end < value);
        self.runs.get(idx).is_some_and(|(start, _)| *start <= value)
    }

    fn insert(&mut self, value: isize) -> bool {
        let idx = self.runs.partition_point(|(_, end)| *end < value);
        if self.runs.get(idx).is_some_and(|(start, _)| *start <= value) {
            return false;
        }
        let joins_left = idx > 0 && value.checked_sub(1) == Some(self.runs[idx - 1].1);
        let joins_right = self
            .runs
            .get(idx)
            .is_some_and(|(start, _)| value.checked_add(1) == Some(*start));
        match (joins_left, joins_right) {
            (true, true) => {
                self.runs[idx - 1].1 = self.runs[idx].1;
                self.runs.remove(idx);
            }
            (true, false) => self.runs[idx - 1].1 = value,
            (false, true) => self.runs[idx].0 = value,
            (false, false) => self.runs.insert(idx, (value, value)),
        }
        self.len += 1;
        true
    }

    fn get(&self, index: usize) -> Option<isize> {
        let mut remaining = index;
        for (start, end) in &self.runs {
            let run_len = (end - start) as usize + 1;
            if remaining < run_len {
                return Some(start + remaining as isize);
            }
            remaining -= run_len;
        }
        None
    }

    fn iter(&self) -> impl DoubleEndedIterator<Item = isize> + '_ {
        self.runs.iter().flat_map(|(s, e)| *s..=*e)
    }

    fn remove(&mut self, _value: isize) -> Result<bool> {
        Err(DigestError::UnsupportedMutation("removing a single value"))
    }

    fn replace_at(&mut self, _index: usize, _value: isize) -> Result<Option<isize>> {
        Err(DigestError::UnsupportedMutation("replacing a value by index"))
    }

    fn union(&self, other: &Self) -> Self {
        let mut ret = Self {
            runs: Self::coalesce(self.runs.iter().chain(other.runs.iter()).copied().collect()),
            len: 0,
        };
        ret.recount();
        ret
    }
}

impl PartialEq for SortedIntSet {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for SortedIntSet {}

impl PartialEq<RangeIntSet> for SortedIntSet {
    fn eq(&self, other: &RangeIntSet) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl PartialEq<SortedIntSet> for RangeIntSet {
    fn eq(&self, other: &SortedIntSet) -> bool {
        other == self
    }
}

impl Add for SortedIntSet {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.union(&rhs)
    }
}

impl Add for RangeIntSet {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.union(&rhs)
    }
}

impl FromIterator<isize> for SortedIntSet {
    fn from_iter<I: IntoIterator<Item = isize>>(iter: I) -> Self {
        let mut ret = Self::default();
        ret.extend_from(iter);
        ret
    }
}

impl FromIterator<isize> for RangeIntSet {
    fn from_iter<I: IntoIterator<Item = isize>>(iter: I) -> Self {
        let mut ret = Self::default();
        ret.extend_from(iter);
        ret
    }
}

impl Extend<isize> for SortedIntSet {
    fn extend<I: IntoIterator<Item = isize>>(&mut self, iter: I) {
        self.extend_from(iter);
    }
}

impl Extend<isize> for RangeIntSet {
    fn extend<I: IntoIterator<Item = isize>>(&mut self, iter: I) {
        self.extend_from(iter);
    }
}
