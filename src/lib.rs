use enzymes::Enzymes;
use lazy_static::lazy_static;

pub mod analysis;
pub mod cut_symbol;
pub mod enzyme_site;
pub mod enzymes;
pub mod error;
pub mod fragment;
pub mod int_set;
pub mod iupac_code;
pub mod pattern;
pub mod restriction_enzyme;

lazy_static! {
    // Restriction enzymes
    pub static ref ENZYMES: Enzymes = Enzymes::default();
}
