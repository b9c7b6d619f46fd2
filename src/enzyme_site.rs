//! Double-stranded recognition sites.
//!
//! An `EnzymeSite` pairs the primary pattern with its complementary strand.
//! Each cleavage event is a `CutOffsetPair`: where the primary strand is cut
//! and where the complementary strand is cut, both in enzyme notation on the
//! shared left-to-right axis.

use crate::{
    cut_symbol::CutSymbol,
    enzymes::Enzymes,
    error::{DigestError, Result},
    iupac_code::{self, IupacCode, WILDCARD},
    pattern::{self, Pattern, Strand},
    restriction_enzyme::RestrictionEnzymeSite,
};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CutOffsetPair {
    pub primary: isize,
    pub complement: isize,
}

impl CutOffsetPair {
    pub fn new(primary: isize, complement: isize) -> Self {
        Self {
            primary,
            complement,
        }
    }

    pub fn from_slice(offsets: &[isize]) -> Result<Self> {
        match offsets {
            [primary, complement] => Ok(Self::new(*primary, *complement)),
            _ => Err(DigestError::ArityMismatch(format!(
                "a cut offset pair needs 2 offsets, got {}",
                offsets.len()
            ))),
        }
    }

    pub fn is_blunt(&self) -> bool {
        self.primary == self.complement
    }

    fn shifted(self, by: isize) -> Option<Self> {
        Some(Self::new(
            self.primary.checked_add(by)?,
            self.complement.checked_add(by)?,
        ))
    }

    /// The same cleavage read from the other strand of a site `len` long.
    fn mirrored(self, len: isize) -> Self {
        Self::new(len - self.complement, len - self.primary)
    }
}

impl From<(isize, isize)> for CutOffsetPair {
    fn from((primary, complement): (isize, isize)) -> Self {
        Self::new(primary, complement)
    }
}

impl From<[isize; 2]> for CutOffsetPair {
    fn from([primary, complement]: [isize; 2]) -> Self {
        Self::new(primary, complement)
    }
}

/// The single-stranded end left behind by one cleavage event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Overhang {
    Blunt,
    /// The primary strand is cut first; the overhang is the primary-strand
    /// bases between both cuts.
    FivePrime(String),
    ThreePrime(String),
}

/// An ambiguity-aware matcher for one orientation of a recognition sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct SiteMatcher {
    codes: Vec<IupacCode>,
}

impl SiteMatcher {
    pub fn new(sequence: &[u8]) -> Self {
        Self {
            codes: sequence.iter().map(|c| IupacCode::from_letter(*c)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn is_match_at(&self, target: &[u8], start: usize) -> bool {
        match target.get(start..start + self.codes.len()) {
            Some(window) => self
                .codes
                .iter()
                .zip(window)
                .all(|(code, base)| code.matches(*base)),
            None => false,
        }
    }

    /// Start positions of all matches, overlapping ones included.
    pub fn find_iter(&self, target: &[u8]) -> Vec<usize> {
        if self.codes.is_empty() || target.len() < self.codes.len() {
            return vec![];
        }
        (0..=target.len() - self.codes.len())
            .filter(|start| self.is_match_at(target, *start))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnzymeSite {
    name: Option<String>,
    primary: Pattern,
    complement: Pattern,
    cut_pairs: Vec<CutOffsetPair>,
}

impl EnzymeSite {
    pub fn from_pattern(sequence: &str, pairs: &[CutOffsetPair]) -> Result<Self> {
        if pairs.is_empty() {
            return Err(DigestError::ArityMismatch(format!(
                "no cut offset pairs given for '{sequence}'"
            )));
        }
        let (stripped, left) = pattern::strip_padding(sequence)?;
        let mut cut_pairs: Vec<CutOffsetPair> = pairs
            .iter()
            .map(|p| {
                p.shifted(-(left as isize)).ok_or_else(|| {
                    DigestError::ArityMismatch(format!("cut offsets {p:?} are out of range"))
                })
            })
            .collect::<Result<_>>()?;
        cut_pairs.sort_unstable();

        let primary_offsets: Vec<isize> = cut_pairs.iter().map(|p| p.primary).collect();
        let complement_offsets: Vec<isize> = cut_pairs.iter().map(|p| p.complement).collect();
        let primary = Pattern::new(Strand::Primary, &stripped, &primary_offsets)?;
        let complement_seq = String::from_utf8_lossy(&iupac_code::complement(stripped.as_bytes()))
            .into_owned();
        let complement = Pattern::new(Strand::Complement, &complement_seq, &complement_offsets)?;

        Ok(Self {
            name: None,
            primary,
            complement,
            cut_pairs,
        })
    }

    pub fn from_notation(notation: &str) -> Result<Self> {
        Self::from_notation_with(notation, &CutSymbol::default())
    }

    /// Builds a site from a primary-strand notation such as `g^aattc`. The
    /// complementary cuts mirror the primary ones across the pattern, which
    /// is exact for palindromic sites.
    pub fn from_notation_with(notation: &str, cut_symbol: &CutSymbol) -> Result<Self> {
        let (sequence, offsets) = pattern::split_notation(notation, cut_symbol)?;
        if offsets.is_empty() {
            return Err(DigestError::ArityMismatch(format!(
                "'{notation}' does not contain a cut symbol"
            )));
        }
        let (stripped, left) = pattern::strip_padding(&sequence)?;
        let len = stripped.len() as isize;
        let pairs: Vec<CutOffsetPair> = offsets
            .iter()
            .map(|o| o - left as isize)
            .map(|o| CutOffsetPair::new(o, len - o))
            .collect();
        Self::from_pattern(&stripped, &pairs)
    }

    /// Looks `name` up in `enzymes`, ignoring case.
    pub fn from_name(name: &str, enzymes: &Enzymes) -> Result<Self> {
        let re = enzymes
            .get(name)
            .ok_or_else(|| DigestError::UnknownEnzyme(name.to_string()))?;
        let mut ret = re
            .cut_offset_pair()
            .and_then(|pair| Self::from_pattern(&re.sequence, &[pair]))
            .map_err(|e| match e {
                DigestError::EnzymeTable(_) => e,
                e => DigestError::EnzymeTable(format!(
                    "record for '{}' is malformed: {e}",
                    re.name
                )),
            })?;
        ret.name = Some(re.name.to_owned());
        Ok(ret)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The name if the site came from the reference table, the primary
    /// notation otherwise.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.to_owned(),
            None => self.primary.with_cut_symbols(),
        }
    }

    pub fn primary(&self) -> &Pattern {
        &self.primary
    }

    pub fn complement(&self) -> &Pattern {
        &self.complement
    }

    /// The recognition sequence, lowercase and unpadded.
    pub fn sequence(&self) -> &str {
        self.primary.stripped()
    }

    pub fn len(&self) -> usize {
        self.primary.stripped().len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    pub fn is_palindromic(&self) -> bool {
        self.primary.is_palindromic()
    }

    /// Palindromic, with every cleavage matched by its mirror image, so both
    /// strands of a target read the same cuts.
    pub fn is_symmetric(&self) -> bool {
        if !self.is_palindromic() {
            return false;
        }
        let len = self.len() as isize;
        let mut mirrored: Vec<CutOffsetPair> =
            self.cut_pairs.iter().map(|p| p.mirrored(len)).collect();
        mirrored.sort_unstable();
        mirrored == self.cut_pairs
    }

    pub fn cut_locations_in_enzyme_notation(&self) -> &[CutOffsetPair] {
        &self.cut_pairs
    }

    /// Absolute cut positions per strand, each in its own padded pattern.
    pub fn cut_locations(&self) -> (Vec<usize>, Vec<usize>) {
        (self.primary.cut_locations(), self.complement.cut_locations())
    }

    pub fn overhangs(&self) -> Vec<Overhang> {
        self.cut_pairs
            .iter()
            .map(|pair| {
                let from = pair.primary.min(pair.complement);
                let to = pair.primary.max(pair.complement);
                let bases: String = (from..to).map(|i| self.base_or_wildcard(i) as char).collect();
                match pair.primary.cmp(&pair.complement) {
                    std::cmp::Ordering::Equal => Overhang::Blunt,
                    std::cmp::Ordering::Less => Overhang::FivePrime(bases),
                    std::cmp::Ordering::Greater => Overhang::ThreePrime(bases),
                }
            })
            .collect()
    }

    pub fn is_blunt(&self) -> bool {
        self.cut_pairs.iter().all(|p| p.is_blunt())
    }

    pub fn is_sticky(&self) -> bool {
        !self.is_blunt()
    }

    #[inline(always)]
    fn base_or_wildcard(&self, index: isize) -> u8 {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.sequence().as_bytes().get(i).copied())
            .unwrap_or(WILDCARD)
    }

    /// Padding needed on either side so both strands share one coordinate space.
    fn common_padding(&self) -> (usize, usize) {
        let len = self.len() as isize;
        let all = self
            .cut_pairs
            .iter()
            .flat_map(|p| [p.primary, p.complement]);
        let min = all.clone().min().unwrap_or(1);
        let max = all.max().unwrap_or(len - 1);
        ((1 - min).max(0) as usize, (max - len + 1).max(0) as usize)
    }

    /// Both strands padded to the same length, primary first.
    pub fn aligned_strands(&self) -> (String, String) {
        let (left, right) = self.common_padding();
        let primary: String = std::iter::repeat_n(WILDCARD as char, left)
            .chain(self.sequence().chars())
            .chain(std::iter::repeat_n(WILDCARD as char, right))
            .collect();
        let complement = String::from_utf8_lossy(&iupac_code::complement(primary.as_bytes()))
            .into_owned();
        (primary, complement)
    }

    pub fn aligned_strands_with_cuts(&self) -> (String, String) {
        self.aligned_strands_with_cuts_using(&CutSymbol::default())
    }

    /// Both aligned strands with a separator between every pair of bases:
    /// the cut symbol where that strand is cut, a space elsewhere.
    pub fn aligned_strands_with_cuts_using(&self, cut_symbol: &CutSymbol) -> (String, String) {
        let (left, _) = self.common_padding();
        let (primary, complement) = self.aligned_strands();
        let to_gap = |offset: isize| (offset + left as isize) as usize;
        let primary_cuts: Vec<usize> = self.cut_pairs.iter().map(|p| to_gap(p.primary)).collect();
        let complement_cuts: Vec<usize> =
            self.cut_pairs.iter().map(|p| to_gap(p.complement)).collect();
        let render = |strand: &str, cuts: &[usize]| {
            let mut ret = String::with_capacity(strand.len() * 2);
            for (pos, c) in strand.chars().enumerate() {
                if pos > 0 {
                    ret.push(if cuts.contains(&pos) { cut_symbol.symbol() } else { ' ' });
                }
                ret.push(c);
            }
            ret
        };
        (render(&primary, &primary_cuts), render(&complement, &complement_cuts))
    }

    pub fn matcher(&self) -> SiteMatcher {
        SiteMatcher::new(self.sequence().as_bytes())
    }

    /// Matches the site as it reads on the complementary strand of a target.
    pub fn reverse_matcher(&self) -> SiteMatcher {
        SiteMatcher::new(&iupac_code::reverse_complement(self.sequence().as_bytes()))
    }

    /// Every recognition site in `target`, on both strands. Symmetric sites
    /// are reported once.
    pub fn get_sites(&self, target: &[u8]) -> Vec<RestrictionEnzymeSite> {
        let len = self.len() as isize;
        let label: Arc<str> = Arc::from(self.label());
        let forward = self.matcher().find_iter(target).into_iter().map(|start| {
            let s = start as isize;
            RestrictionEnzymeSite {
                enzyme: Arc::clone(&label),
                start,
                end: start + self.len(),
                strand: Strand::Primary,
                primary_cuts: self
                    .cut_pairs
                    .iter()
                    .map(|p| s.saturating_add(p.primary))
                    .collect(),
                complement_cuts: self
                    .cut_pairs
                    .iter()
                    .map(|p| s.saturating_add(p.complement))
                    .collect(),
            }
        });
        let mut ret: Vec<RestrictionEnzymeSite> = forward.collect();
        if !self.is_symmetric() {
            // Read from the other strand the enzyme's own cuts swap strands and mirror
            ret.extend(self.reverse_matcher().find_iter(target).into_iter().map(|start| {
                let end = start as isize + len;
                RestrictionEnzymeSite {
                    enzyme: Arc::clone(&label),
                    start,
                    end: start + self.len(),
                    strand: Strand::Complement,
                    primary_cuts: self
                        .cut_pairs
                        .iter()
                        .map(|p| end.saturating_sub(p.complement))
                        .collect(),
                    complement_cuts: self
                        .cut_pairs
                        .iter()
                        .map(|p| end.saturating_sub(p.primary))
                        .collect(),
                }
            }));
        }
        ret
    }
}

impl fmt::Display for EnzymeSite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (primary, complement) = self.aligned_strands_with_cuts();
        write!(f, "5' {primary} 3'\n3' {complement} 5'")
    }
}
