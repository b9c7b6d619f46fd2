//! Single-strand recognition patterns and their cut offsets.
//!
//! Offsets are kept in enzyme notation: offset `n` is a cut right after the
//! `n`-th base of the pattern, so `1` cuts after the first base, `0` just in
//! front of the pattern and negative values further upstream. Values larger
//! than the pattern length are downstream cuts.
//!
//! Both strands are written left to right along the same axis. For the
//! complementary strand this means the pattern is read 3'->5' and offsets
//! are counted from its 3' end.

use crate::{
    cut_symbol::CutSymbol,
    error::{DigestError, Result},
    iupac_code::{self, IupacCode, WILDCARD},
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strand {
    Primary,
    Complement,
}

impl Strand {
    /// Which ends (5' or 3') sit at the left and right of the written strand.
    pub fn orientation(self) -> (u8, u8) {
        match self {
            Strand::Primary => (5, 3),
            Strand::Complement => (3, 5),
        }
    }
}

/// Lowercases and validates `sequence`, then removes wildcard padding from
/// both ends. Returns the stripped sequence and how many bases came off the
/// left.
pub(crate) fn strip_padding(sequence: &str) -> Result<(String, usize)> {
    if let Some(symbol) = sequence
        .chars()
        .find(|c| !c.is_ascii() || !IupacCode::is_valid_letter(*c as u8))
    {
        return Err(DigestError::InvalidSymbol {
            pattern: sequence.to_string(),
            symbol,
        });
    }
    let lower = sequence.to_ascii_lowercase();
    let left = lower.bytes().take_while(|c| *c == WILDCARD).count();
    let stripped = lower.trim_matches(WILDCARD as char).to_string();
    Ok((stripped, left))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Pattern {
    strand: Strand,
    stripped: String,
    offsets: Vec<isize>,
    left_padding: usize,
    right_padding: usize,
}

impl Pattern {
    pub fn new(strand: Strand, sequence: &str, offsets: &[isize]) -> Result<Self> {
        let (stripped, left) = strip_padding(sequence)?;
        if stripped.is_empty() && !offsets.is_empty() {
            return Err(DigestError::EmptyPattern);
        }

        let shift = left as isize;
        let mut offsets: Vec<isize> = offsets
            .iter()
            .map(|o| o.checked_sub(shift).ok_or_else(|| out_of_range(*o)))
            .collect::<Result<_>>()?;
        offsets.sort_unstable();
        if let Some(w) = offsets.windows(2).find(|w| w[0] == w[1]) {
            return Err(DigestError::DuplicateOffset {
                offset: w[0] + shift,
            });
        }

        // Pad until every cut lies strictly between two symbols
        let len = stripped.len() as isize;
        let (left_padding, right_padding) = match (offsets.first(), offsets.last()) {
            (Some(&min), Some(&max)) => (
                padding(1isize.checked_sub(min), min + shift)?,
                padding(max.checked_sub(len).and_then(|d| d.checked_add(1)), max + shift)?,
            ),
            _ => (0, 0),
        };
        let padded = (left_padding as isize)
            .checked_add(len)
            .and_then(|l| l.checked_add(right_padding as isize));
        if padded.is_none() {
            return Err(out_of_range(offsets.last().copied().unwrap_or_default() + shift));
        }

        Ok(Self {
            strand,
            stripped,
            offsets,
            left_padding,
            right_padding,
        })
    }

    pub fn from_offsets(sequence: &str, offsets: &[isize]) -> Result<Self> {
        Self::new(Strand::Primary, sequence, offsets)
    }

    /// `sequence` is the complementary strand written 3'->5'.
    pub fn complement_from_offsets(sequence: &str, offsets: &[isize]) -> Result<Self> {
        Self::new(Strand::Complement, sequence, offsets)
    }

    pub fn from_notation(notation: &str) -> Result<Self> {
        Self::from_notation_with(notation, &CutSymbol::default())
    }

    pub fn complement_from_notation(notation: &str) -> Result<Self> {
        Self::parse_notation(Strand::Complement, notation, &CutSymbol::default())
    }

    pub fn from_notation_with(notation: &str, cut_symbol: &CutSymbol) -> Result<Self> {
        Self::parse_notation(Strand::Primary, notation, cut_symbol)
    }

    pub fn parse_notation(strand: Strand, notation: &str, cut_symbol: &CutSymbol) -> Result<Self> {
        let (sequence, offsets) = split_notation(notation, cut_symbol)?;
        Self::new(strand, &sequence, &offsets)
    }

    #[inline(always)]
    pub fn strand(&self) -> Strand {
        self.strand
    }

    #[inline(always)]
    pub fn orientation(&self) -> (u8, u8) {
        self.strand.orientation()
    }

    /// The recognition sequence without padding.
    #[inline(always)]
    pub fn stripped(&self) -> &str {
        &self.stripped
    }

    /// The recognition sequence padded with wildcards out to the outermost cuts.
    pub fn pattern(&self) -> String {
        let mut ret = String::with_capacity(self.len());
        ret.extend(std::iter::repeat_n(WILDCARD as char, self.left_padding));
        ret.push_str(&self.stripped);
        ret.extend(std::iter::repeat_n(WILDCARD as char, self.right_padding));
        ret
    }

    /// Length of the padded pattern.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.left_padding + self.stripped.len() + self.right_padding
    }

    pub fn is_empty(&self) -> bool {
        self.stripped.is_empty()
    }

    #[inline(always)]
    pub fn left_padding(&self) -> usize {
        self.left_padding
    }

    #[inline(always)]
    pub fn right_padding(&self) -> usize {
        self.right_padding
    }

    /// Cut offsets in enzyme notation, ascending.
    #[inline(always)]
    pub fn cut_locations_in_enzyme_notation(&self) -> &[isize] {
        &self.offsets
    }

    /// Cut positions as 0-based gaps in the padded pattern; position `i`
    /// lies between padded symbols `i - 1` and `i`.
    pub fn cut_locations(&self) -> Vec<usize> {
        self.offsets
            .iter()
            .map(|o| self.to_absolute(*o))
            .collect()
    }

    #[inline(always)]
    pub fn to_absolute(&self, offset: isize) -> usize {
        (offset + self.left_padding as isize).max(0) as usize
    }

    #[inline(always)]
    pub fn to_enzyme_notation(&self, absolute: usize) -> isize {
        absolute as isize - self.left_padding as isize
    }

    /// Offsets counted from this strand's own 5' end.
    pub fn cut_locations_from_five_prime(&self) -> Vec<isize> {
        match self.strand {
            Strand::Primary => self.offsets.clone(),
            Strand::Complement => {
                let len = self.stripped.len() as isize;
                self.offsets.iter().rev().map(|o| len - o).collect()
            }
        }
    }

    /// The stripped sequence read from its 5' end.
    pub fn five_prime_to_three_prime(&self) -> String {
        match self.strand {
            Strand::Primary => self.stripped.clone(),
            Strand::Complement => self.stripped.chars().rev().collect(),
        }
    }

    pub fn is_palindromic(&self) -> bool {
        let seq = self.five_prime_to_three_prime().into_bytes();
        seq == iupac_code::reverse_complement(&seq)
    }

    /// The per-position codes of the stripped pattern.
    pub fn codes(&self) -> Vec<IupacCode> {
        self.stripped.bytes().map(IupacCode::from_letter).collect()
    }

    pub fn with_cut_symbols(&self) -> String {
        self.with_cut_symbols_using(&CutSymbol::default())
    }

    pub fn with_cut_symbols_using(&self, cut_symbol: &CutSymbol) -> String {
        let cuts = self.cut_locations();
        let mut ret = String::with_capacity(self.len() + cuts.len());
        for (pos, c) in self.pattern().chars().enumerate() {
            if cuts.contains(&pos) {
                ret.push(cut_symbol.symbol());
            }
            ret.push(c);
        }
        if cuts.contains(&self.len()) {
            ret.push(cut_symbol.symbol());
        }
        ret
    }

    pub fn with_spaces(&self) -> String {
        self.with_spaces_using(&CutSymbol::default())
    }

    pub fn with_spaces_using(&self, cut_symbol: &CutSymbol) -> String {
        let chars: Vec<String> = self
            .with_cut_symbols_using(cut_symbol)
            .chars()
            .map(String::from)
            .collect();
        chars.join(" ")
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.with_cut_symbols())
    }
}

fn out_of_range(offset: isize) -> DigestError {
    DigestError::ArityMismatch(format!("cut offset {offset} is out of range"))
}

fn padding(needed: Option<isize>, offset: isize) -> Result<usize> {
    needed
        .map(|n| n.max(0) as usize)
        .ok_or_else(|| out_of_range(offset))
}

/// Splits a notation string into its bases and the cut offsets marked in it.
/// Whitespace is ignored.
pub(crate) fn split_notation(
    notation: &str,
    cut_symbol: &CutSymbol,
) -> Result<(String, Vec<isize>)> {
    if cut_symbol.has_adjacent(notation) {
        return Err(DigestError::AdjacentMarkers(notation.to_string()));
    }
    let mut sequence = String::with_capacity(notation.len());
    let mut offsets = vec![];
    for c in notation.chars() {
        if c == cut_symbol.symbol() {
            offsets.push(sequence.len() as isize);
        } else if c.is_whitespace() {
            continue;
        } else if c.is_ascii() && IupacCode::is_valid_letter(c as u8) {
            sequence.push(c.to_ascii_lowercase());
        } else {
            return Err(DigestError::InvalidSymbol {
                pattern: notation.to_string(),
                symbol: c,
            });
        }
    }
    Ok((sequence, offsets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_offsets() {
        let p = Pattern::from_offsets("GAATTC", &[1]).unwrap();
        assert_eq!(p.stripped(), "gaattc");
        assert_eq!(p.pattern(), "gaattc");
        assert_eq!(p.cut_locations(), vec![1]);
        assert_eq!(p.with_cut_symbols(), "g^aattc");
        assert_eq!(p.orientation(), (5, 3));
        assert!(p.is_palindromic());
    }

    #[test]
    fn test_padding() {
        // EcoRII cuts in front of its site
        let p = Pattern::from_offsets("ccwgg", &[0]).unwrap();
        assert_eq!(p.left_padding(), 1);
        assert_eq!(p.right_padding(), 0);
        assert_eq!(p.pattern(), "nccwgg");
        assert_eq!(p.with_cut_symbols(), "n^ccwgg");
        assert_eq!(p.cut_locations(), vec![1]);

        // BsaI style cuts downstream of the site
        let p = Pattern::from_offsets("ggtctc", &[7, -2]).unwrap();
        assert_eq!(p.left_padding(), 3);
        assert_eq!(p.right_padding(), 2);
        assert_eq!(p.pattern(), "nnnggtctcnn");
        assert_eq!(p.with_cut_symbols(), "n^nnggtctcn^n");
        assert_eq!(p.cut_locations_in_enzyme_notation(), &[-2, 7]);
        assert_eq!(p.cut_locations(), vec![1, 10]);
        assert_eq!(p.to_enzyme_notation(10), 7);
        assert_eq!(p.len(), p.stripped().len() + p.left_padding() + p.right_padding());
        assert!(!p.is_palindromic());
    }

    #[test]
    fn test_cut_at_end() {
        let p = Pattern::from_offsets("gatc", &[4]).unwrap();
        assert_eq!(p.pattern(), "gatcn");
        assert_eq!(p.with_cut_symbols(), "gatc^n");
    }

    #[test]
    fn test_from_notation() {
        let p = Pattern::from_notation("g^aatt^c").unwrap();
        assert_eq!(p.cut_locations_in_enzyme_notation(), &[1, 5]);
        let p = Pattern::from_notation("^gatc").unwrap();
        assert_eq!(p.cut_locations_in_enzyme_notation(), &[0]);
        assert_eq!(p.with_cut_symbols(), "n^gatc");
        // Padding written out in the notation is stripped again
        let p = Pattern::from_notation("n^gatc").unwrap();
        assert_eq!(p.stripped(), "gatc");
        assert_eq!(p.cut_locations_in_enzyme_notation(), &[0]);
        assert_eq!(p.cut_locations(), vec![1]);
    }

    #[test]
    fn test_notation_round_trip() {
        for (seq, offsets) in [
            ("gaattc", vec![1, 5]),
            ("ccwgg", vec![0, 5]),
            ("ggtctc", vec![7, 11]),
            ("gcggccgc", vec![-3, 2]),
        ] {
            let p = Pattern::from_offsets(seq, &offsets).unwrap();
            let parsed = Pattern::from_notation(&p.with_cut_symbols()).unwrap();
            assert_eq!(parsed.cut_locations(), p.cut_locations());
            assert_eq!(parsed.stripped(), p.stripped());
            let parsed = Pattern::from_notation(&p.with_spaces()).unwrap();
            assert_eq!(parsed.cut_locations(), p.cut_locations());
        }
    }

    #[test]
    fn test_with_spaces() {
        let p = Pattern::from_notation("g^aattc").unwrap();
        assert_eq!(p.with_spaces(), "g ^ a a t t c");
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            Pattern::from_offsets("gaxttc", &[1]),
            Err(DigestError::InvalidSymbol {
                pattern: "gaxttc".to_string(),
                symbol: 'x'
            })
        );
        assert!(matches!(
            Pattern::from_offsets("g^aattc", &[1]),
            Err(DigestError::InvalidSymbol { symbol: '^', .. })
        ));
        assert_eq!(
            Pattern::from_offsets("gaattc", &[1, 3, 1]),
            Err(DigestError::DuplicateOffset { offset: 1 })
        );
        assert_eq!(Pattern::from_offsets("", &[1]), Err(DigestError::EmptyPattern));
        assert_eq!(Pattern::from_offsets("nnn", &[1]), Err(DigestError::EmptyPattern));
        assert!(Pattern::from_offsets("", &[]).is_ok());
        assert_eq!(
            Pattern::from_notation("ga^^attc"),
            Err(DigestError::AdjacentMarkers("ga^^attc".to_string()))
        );
    }

    #[test]
    fn test_extreme_offsets() {
        assert!(matches!(
            Pattern::from_offsets("gaattc", &[isize::MIN]),
            Err(DigestError::ArityMismatch(_))
        ));
        assert!(matches!(
            Pattern::from_offsets("nngaattc", &[isize::MIN + 1]),
            Err(DigestError::ArityMismatch(_))
        ));
        assert!(matches!(
            Pattern::from_offsets("gaattc", &[1, isize::MAX]),
            Err(DigestError::ArityMismatch(_))
        ));
        assert!(Pattern::from_offsets("gaattc", &[-1_000, 1_000]).is_ok());
    }

    #[test]
    fn test_complement_pattern() {
        // EcoRI bottom strand, written 3'->5' under "gaattc"
        let p = Pattern::complement_from_offsets("cttaag", &[5]).unwrap();
        assert_eq!(p.strand(), Strand::Complement);
        assert_eq!(p.orientation(), (3, 5));
        assert_eq!(p.with_cut_symbols(), "cttaa^g");
        assert_eq!(p.five_prime_to_three_prime(), "gaattc");
        assert_eq!(p.cut_locations_from_five_prime(), vec![1]);
        assert!(p.is_palindromic());

        let p = Pattern::complement_from_notation("ccagag^").unwrap();
        assert_eq!(p.cut_locations_in_enzyme_notation(), &[6]);
        assert!(!p.is_palindromic());
    }

    #[test]
    fn test_custom_cut_symbol() {
        let cs = CutSymbol::new('|').unwrap();
        let p = Pattern::from_notation_with("g|aattc", &cs).unwrap();
        assert_eq!(p.cut_locations_in_enzyme_notation(), &[1]);
        assert_eq!(p.with_cut_symbols_using(&cs), "g|aattc");
        assert_eq!(p.with_cut_symbols(), "g^aattc");
    }
}
