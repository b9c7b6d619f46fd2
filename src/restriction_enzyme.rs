use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    enzyme_site::CutOffsetPair,
    error::{DigestError, Result},
    iupac_code,
    pattern::Strand,
};

/// One record of the enzyme reference table.
///
/// `cut` is the primary-strand offset in enzyme notation. `overlap` is the
/// signed overhang length, so the complementary strand is cut at
/// `cut + overlap`; positive values leave a 5' overhang, negative a 3' one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RestrictionEnzyme {
    pub name: String,
    pub sequence: String,
    pub note: Option<String>,
    pub cut: isize,
    pub overlap: isize,
    #[serde(skip_serializing, default)]
    is_palindromic: bool,
}

/// A recognition site located on a target sequence.
///
/// `start..end` is the span the recognition sequence occupies; `strand`
/// tells which strand it was read from. Cut positions are gaps in the target,
/// `i` being the gap in front of base `i`, and may fall outside the target.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RestrictionEnzymeSite {
    pub start: usize,
    pub end: usize,
    pub strand: Strand,
    pub enzyme: Arc<str>,
    pub primary_cuts: Vec<isize>,
    pub complement_cuts: Vec<isize>,
}

impl RestrictionEnzyme {
    pub fn new(name: &str, sequence: &str, cut: isize, overlap: isize) -> Self {
        let mut ret = Self {
            name: name.to_string(),
            sequence: sequence.to_string(),
            note: None,
            cut,
            overlap,
            is_palindromic: false,
        };
        ret.check_palindromic();
        ret
    }

    pub fn check_palindromic(&mut self) {
        let seq = self.sequence.to_ascii_lowercase().into_bytes();
        self.is_palindromic = seq == iupac_code::reverse_complement(&seq);
    }

    pub fn is_palindromic(&self) -> bool {
        self.is_palindromic
    }

    pub fn cut_offset_pair(&self) -> Result<CutOffsetPair> {
        let complement = self.cut.checked_add(self.overlap).ok_or_else(|| {
            DigestError::EnzymeTable(format!(
                "{}: cut {} with overlap {} is out of range",
                self.name, self.cut, self.overlap
            ))
        })?;
        Ok(CutOffsetPair::new(self.cut, complement))
    }
}

impl RestrictionEnzymeSite {
    pub fn cuts(&self) -> impl Iterator<Item = isize> + '_ {
        self.primary_cuts
            .iter()
            .chain(self.complement_cuts.iter())
            .copied()
    }

    /// Would cutting here break up `other`'s recognition sequence?
    pub fn cuts_into(&self, other: &RestrictionEnzymeSite) -> bool {
        let (start, end) = (other.start as isize, other.end as isize);
        self.cuts().any(|cut| start < cut && cut < end)
    }
}
