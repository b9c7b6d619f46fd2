//! The marker that denotes a cut point inside enzyme notation strings.
//!
//! A `CutSymbol` is an ordinary value: parsers and formatters take it as an
//! argument, and the `Default` is the conventional `^`.

use crate::{
    error::{DigestError, Result},
    iupac_code::IupacCode,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_CUT_SYMBOL: char = '^';

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub struct CutSymbol {
    symbol: char,
    single: Regex,
    adjacent: Regex,
}

impl CutSymbol {
    pub fn new(symbol: char) -> Result<Self> {
        if symbol.is_whitespace()
            || (symbol.is_ascii() && IupacCode::is_valid_letter(symbol as u8))
        {
            return Err(DigestError::InvalidCutSymbol(symbol));
        }
        let escaped = regex::escape(&symbol.to_string());
        let single =
            Regex::new(&escaped).map_err(|_| DigestError::InvalidCutSymbol(symbol))?;
        // Whitespace is ignored by the notation parser, so "^ ^" is as empty as "^^"
        let adjacent = Regex::new(&format!(r"{escaped}(?:\s*{escaped})+"))
            .map_err(|_| DigestError::InvalidCutSymbol(symbol))?;
        Ok(Self {
            symbol,
            single,
            adjacent,
        })
    }

    #[inline(always)]
    pub fn symbol(&self) -> char {
        self.symbol
    }

    /// Switch to another marker. Setting the current marker again is a no-op.
    pub fn set(&mut self, symbol: char) -> Result<()> {
        if symbol == self.symbol {
            return Ok(());
        }
        *self = Self::new(symbol)?;
        Ok(())
    }

    /// The marker escaped for embedding in a regular expression.
    pub fn escaped(&self) -> String {
        regex::escape(&self.symbol.to_string())
    }

    /// Matches one marker.
    pub fn regex(&self) -> &Regex {
        &self.single
    }

    /// Matches two or more markers with no base between them.
    pub fn adjacent_regex(&self) -> &Regex {
        &self.adjacent
    }

    pub fn has_adjacent(&self, notation: &str) -> bool {
        self.adjacent.is_match(notation)
    }

    pub fn count_in(&self, notation: &str) -> usize {
        self.single.find_iter(notation).count()
    }

    pub fn strip(&self, notation: &str) -> String {
        self.single.replace_all(notation, "").into_owned()
    }
}

impl Default for CutSymbol {
    fn default() -> Self {
        Self::new(DEFAULT_CUT_SYMBOL).expect("'^' is a valid cut symbol")
    }
}

impl PartialEq for CutSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for CutSymbol {}

impl TryFrom<char> for CutSymbol {
    type Error = DigestError;

    fn try_from(symbol: char) -> Result<Self> {
        Self::new(symbol)
    }
}

impl From<CutSymbol> for char {
    fn from(cut_symbol: CutSymbol) -> Self {
        cut_symbol.symbol
    }
}

impl fmt::Display for CutSymbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_symbol() {
        let cs = CutSymbol::default();
        assert_eq!(cs.symbol(), '^');
        assert_eq!(cs.escaped(), r"\^");
        assert_eq!(cs.count_in("g^aatt^c"), 2);
        assert_eq!(cs.strip("g^aatt^c"), "gaattc");
    }

    #[test]
    fn test_adjacent_markers() {
        let cs = CutSymbol::default();
        assert!(cs.has_adjacent("ga^^attc"));
        assert!(cs.has_adjacent("ga^ ^attc"));
        assert!(cs.has_adjacent("^^^gaattc"));
        assert!(!cs.has_adjacent("g^a^attc"));
        assert!(!cs.has_adjacent("^gaattc^"));
    }

    #[test]
    fn test_set_symbol() {
        let mut cs = CutSymbol::default();
        cs.set('^').unwrap();
        assert_eq!(cs, CutSymbol::default());
        cs.set('|').unwrap();
        assert_eq!(cs.symbol(), '|');
        assert!(cs.has_adjacent("g||aattc"));
        assert!(!cs.has_adjacent("g^^aattc"));
        assert_eq!(cs.strip("g|aattc"), "gaattc");
    }

    #[test]
    fn test_reject_bad_symbols() {
        assert_eq!(CutSymbol::new('a'), Err(DigestError::InvalidCutSymbol('a')));
        assert_eq!(CutSymbol::new('N'), Err(DigestError::InvalidCutSymbol('N')));
        assert_eq!(CutSymbol::new(' '), Err(DigestError::InvalidCutSymbol(' ')));
        let mut cs = CutSymbol::default();
        assert!(cs.set('g').is_err());
        assert_eq!(cs.symbol(), '^');
    }

    #[test]
    fn test_serde_as_char() {
        let cs = CutSymbol::new('|').unwrap();
        let json = serde_json::to_string(&cs).unwrap();
        assert_eq!(json, "\"|\"");
        let back: CutSymbol = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cs);
        assert!(serde_json::from_str::<CutSymbol>("\"a\"").is_err());
    }
}
