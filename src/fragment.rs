use crate::{int_set::IntSet, iupac_code::IupacCode, pattern::Strand};
use serde::Serialize;
use std::{collections::BTreeSet, ops::Index};

/// A piece of one strand of a digested sequence. Complementary fragments are
/// written 3'->5', aligned under the primary strand.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Fragment {
    strand: Strand,
    sequence: String,
}

impl Fragment {
    pub fn new(strand: Strand, sequence: &str) -> Self {
        Self {
            strand,
            sequence: sequence.to_string(),
        }
    }

    #[inline(always)]
    pub fn strand(&self) -> Strand {
        self.strand
    }

    #[inline(always)]
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Deduplicated fragments, primary strand first, each strand sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UniqueFragments {
    fragments: Vec<Fragment>,
}

impl UniqueFragments {
    pub fn new<I: IntoIterator<Item = Fragment>>(fragments: I) -> Self {
        let unique: BTreeSet<Fragment> = fragments.into_iter().filter(|f| !f.is_empty()).collect();
        Self {
            fragments: unique.into_iter().collect(),
        }
    }

    pub fn primary(&self) -> Vec<&str> {
        self.strand_sequences(Strand::Primary)
    }

    pub fn complement(&self) -> Vec<&str> {
        self.strand_sequences(Strand::Complement)
    }

    fn strand_sequences(&self, strand: Strand) -> Vec<&str> {
        self.fragments
            .iter()
            .filter(|f| f.strand == strand)
            .map(|f| f.sequence())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Fragment> {
        self.fragments.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter()
    }

    /// Fragment lengths, in the same order as the fragments.
    pub fn sizes(&self) -> Vec<usize> {
        self.fragments.iter().map(|f| f.len()).collect()
    }

    pub fn contains(&self, fragment: &Fragment) -> bool {
        self.fragments.binary_search(fragment).is_ok()
    }

    pub fn is_subset_of(&self, other: &UniqueFragments) -> bool {
        self.fragments.iter().all(|f| other.contains(f))
    }
}

impl Index<usize> for UniqueFragments {
    type Output = Fragment;

    fn index(&self, index: usize) -> &Fragment {
        &self.fragments[index]
    }
}

impl IntoIterator for UniqueFragments {
    type Item = Fragment;
    type IntoIter = std::vec::IntoIter<Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.into_iter()
    }
}

impl<'a> IntoIterator for &'a UniqueFragments {
    type Item = &'a Fragment;
    type IntoIter = std::slice::Iter<'a, Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.iter()
    }
}

/// Slices `sequence` at every cut strictly inside it. Positions count
/// characters; cuts at or beyond the ends change nothing.
pub(crate) fn slice_at<S: IntSet>(sequence: &[char], cuts: &S, strand: Strand) -> Vec<Fragment> {
    let len = sequence.len() as isize;
    let piece = |from: isize, to: isize| Fragment {
        strand,
        sequence: sequence[from as usize..to as usize].iter().collect(),
    };
    let mut ret = vec![];
    let mut from = 0;
    for cut in cuts.iter().filter(|c| 0 < *c && *c < len) {
        ret.push(piece(from, cut));
        from = cut;
    }
    if from < len {
        ret.push(piece(from, len));
    }
    ret
}

/// Fragments of both strands of `sequence` for one set of cuts per strand.
/// Characters without a complement appear unchanged on both strands.
pub(crate) fn digest<S: IntSet>(
    sequence: &[char],
    primary_cuts: &S,
    complement_cuts: &S,
) -> Vec<Fragment> {
    let complement: Vec<char> = sequence
        .iter()
        .map(|c| {
            if c.is_ascii() {
                IupacCode::letter_complement(*c as u8) as char
            } else {
                *c
            }
        })
        .collect();
    let mut ret = slice_at(sequence, primary_cuts, Strand::Primary);
    ret.extend(slice_at(&complement, complement_cuts, Strand::Complement));
    ret
}
