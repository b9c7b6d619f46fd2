const DNA_BITMASK_A: u8 = 1;
const DNA_BITMASK_C: u8 = 2;
const DNA_BITMASK_G: u8 = 4;
const DNA_BITMASK_T: u8 = 8;
const DNA_BITMASK_N: u8 = DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_G | DNA_BITMASK_T;

/// Lowercase IUPAC letter for every bitmask, indexed by the mask itself.
const BITMASK_LETTERS: [u8; 16] = [
    b'-', b'a', b'c', b'm', b'g', b'r', b's', b'v', b't', b'w', b'y', b'h', b'k', b'd', b'b', b'n',
];

/// The wildcard used to pad patterns out to their cut positions.
pub const WILDCARD: u8 = b'n';

/// A bitmasked IUPAC code for DNA bases, eg DNA_BITMASK_A|DNA_BITMASK_C
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct IupacCode(u8);

impl IupacCode {
    pub fn new(bitmask: u8) -> Self {
        Self(bitmask & DNA_BITMASK_N)
    }

    #[inline(always)]
    pub fn from_letter(letter: u8) -> Self {
        match letter.to_ascii_uppercase() {
            b'A' => Self(DNA_BITMASK_A),
            b'C' => Self(DNA_BITMASK_C),
            b'G' => Self(DNA_BITMASK_G),
            b'T' => Self(DNA_BITMASK_T),
            b'U' => Self(DNA_BITMASK_T),
            b'W' => Self(DNA_BITMASK_A | DNA_BITMASK_T),
            b'S' => Self(DNA_BITMASK_C | DNA_BITMASK_G),
            b'M' => Self(DNA_BITMASK_A | DNA_BITMASK_C),
            b'K' => Self(DNA_BITMASK_G | DNA_BITMASK_T),
            b'R' => Self(DNA_BITMASK_A | DNA_BITMASK_G),
            b'Y' => Self(DNA_BITMASK_C | DNA_BITMASK_T),
            b'B' => Self(DNA_BITMASK_C | DNA_BITMASK_G | DNA_BITMASK_T),
            b'D' => Self(DNA_BITMASK_A | DNA_BITMASK_G | DNA_BITMASK_T),
            b'H' => Self(DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_T),
            b'V' => Self(DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_G),
            b'N' => Self(DNA_BITMASK_N),
            _ => Self(0),
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub fn subset(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// True if every base `self` stands for is also allowed by `other`.
    #[inline(always)]
    pub fn is_within(self, other: Self) -> bool {
        !self.is_empty() && self.0 & other.0 == self.0
    }

    /// Does a single target letter satisfy this (possibly ambiguous) code?
    /// Letters outside the alphabet never match.
    #[inline(always)]
    pub fn matches(self, letter: u8) -> bool {
        Self::from_letter(letter).is_within(self)
    }

    #[inline(always)]
    pub fn complement(self) -> Self {
        let mut ret = 0;
        if self.0 & DNA_BITMASK_A != 0 {
            ret |= DNA_BITMASK_T;
        }
        if self.0 & DNA_BITMASK_T != 0 {
            ret |= DNA_BITMASK_A;
        }
        if self.0 & DNA_BITMASK_C != 0 {
            ret |= DNA_BITMASK_G;
        }
        if self.0 & DNA_BITMASK_G != 0 {
            ret |= DNA_BITMASK_C;
        }
        Self(ret)
    }

    #[inline(always)]
    pub fn to_letter(self) -> u8 {
        BITMASK_LETTERS[self.0 as usize]
    }

    #[inline(always)]
    pub fn is_valid_letter(letter: u8) -> bool {
        !Self::from_letter(letter).is_empty()
    }

    #[inline(always)]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut ret = Vec::with_capacity(4);
        if self.0 & DNA_BITMASK_A != 0 {
            ret.push(b'A');
        }
        if self.0 & DNA_BITMASK_C != 0 {
            ret.push(b'C');
        }
        if self.0 & DNA_BITMASK_G != 0 {
            ret.push(b'G');
        }
        if self.0 & DNA_BITMASK_T != 0 {
            ret.push(b'T');
        }
        ret
    }

    /// Complement of one letter, ambiguity codes included. Case is kept;
    /// letters outside the alphabet come back unchanged.
    #[inline(always)]
    pub fn letter_complement(letter: u8) -> u8 {
        let code = Self::from_letter(letter);
        if code.is_empty() {
            return letter;
        }
        let ret = code.complement().to_letter();
        if letter.is_ascii_uppercase() {
            ret.to_ascii_uppercase()
        } else {
            ret
        }
    }
}

/// Base-wise complement, read 3'->5' underneath the original.
pub fn complement(sequence: &[u8]) -> Vec<u8> {
    sequence
        .iter()
        .map(|c| IupacCode::letter_complement(*c))
        .collect()
}

pub fn reverse_complement(sequence: &[u8]) -> Vec<u8> {
    sequence
        .iter()
        .rev()
        .map(|c| IupacCode::letter_complement(*c))
        .collect()
}
