use crate::restriction_enzyme::RestrictionEnzyme;
use anyhow::{Result, anyhow};
use std::{collections::HashMap, fs};

const RUNTIME_REBASE_PATH: &str = "data/resources/rebase.enzymes.json";
const BUILTIN_ENZYMES_JSON: &str = include_str!("../assets/enzymes.json");

/// The enzyme reference table, keyed case-insensitively by name.
#[derive(Clone, Debug)]
pub struct Enzymes {
    restriction_enzymes: Vec<RestrictionEnzyme>,
    by_key: HashMap<String, usize>,
    max_re_length: usize,
    has_nonpalindromic_restriction_enzymes: bool,
}

impl Enzymes {
    pub fn from_json_text(json_text: &str) -> Result<Self> {
        let res: serde_json::Value = serde_json::from_str(json_text)?;
        let arr = res
            .as_array()
            .ok_or(anyhow!("Enzymes file is not a JSON array"))?;
        let mut restriction_enzymes = vec![];
        for row in arr {
            let enzyme_type = match row.get("type") {
                Some(et) => et,
                None => {
                    log::warn!("Skipping enzyme without type: {row}");
                    continue;
                }
            };
            match enzyme_type.as_str() {
                Some("restriction") => {
                    let mut re: RestrictionEnzyme = match serde_json::from_value(row.to_owned()) {
                        Ok(re) => re,
                        Err(e) => return Err(anyhow!("Bad restriction enzyme: {row}: {e}")),
                    };
                    re.check_palindromic();
                    restriction_enzymes.push(re);
                }
                // Mixed tables also list proteases, which never cut DNA
                Some("protease") => continue,
                Some(other) => return Err(anyhow!("Unknown enzyme type '{other}' in {}", row)),
                None => return Err(anyhow!("Missing enzyme type for {}", row)),
            }
        }
        Ok(Self::from_restriction_enzymes(restriction_enzymes))
    }

    pub fn from_path(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_text(&text)
    }

    pub fn from_restriction_enzymes(restriction_enzymes: Vec<RestrictionEnzyme>) -> Self {
        let mut ret = Self {
            restriction_enzymes,
            by_key: HashMap::new(),
            max_re_length: 0,
            has_nonpalindromic_restriction_enzymes: false,
        };
        ret.recompute_derived_fields();
        ret
    }

    pub fn restriction_enzymes(&self) -> &Vec<RestrictionEnzyme> {
        &self.restriction_enzymes
    }

    pub fn restriction_enzymes_by_name(&self, names: &[&str]) -> Vec<RestrictionEnzyme> {
        names
            .iter()
            .filter_map(|name| self.get(name))
            .cloned()
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&RestrictionEnzyme> {
        let idx = self.by_key.get(&Self::key(name))?;
        self.restriction_enzymes.get(*idx)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_key.contains_key(&Self::key(name))
    }

    pub fn names(&self) -> Vec<&str> {
        self.restriction_enzymes
            .iter()
            .map(|re| re.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.restriction_enzymes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restriction_enzymes.is_empty()
    }

    pub fn max_re_length(&self) -> usize {
        self.max_re_length
    }

    pub fn has_nonpalindromic_restriction_enzymes(&self) -> bool {
        self.has_nonpalindromic_restriction_enzymes
    }

    fn key(name: &str) -> String {
        name.trim().to_ascii_uppercase()
    }

    fn recompute_derived_fields(&mut self) {
        self.by_key = HashMap::new();
        for (idx, re) in self.restriction_enzymes.iter().enumerate() {
            let key = Self::key(&re.name);
            if !key.is_empty() {
                // First record wins, like a REBASE listing
                self.by_key.entry(key).or_insert(idx);
            }
        }
        self.max_re_length = self
            .restriction_enzymes
            .iter()
            .map(|re| re.sequence.len())
            .max()
            .unwrap_or(0);
        self.has_nonpalindromic_restriction_enzymes = self
            .restriction_enzymes
            .iter()
            .any(|re| !re.is_palindromic());
    }

    /// The built-in table, replaced by `path` when that file holds a usable
    /// non-empty table.
    pub fn load_with_override(path: &str) -> Self {
        let mut base = match Self::from_json_text(BUILTIN_ENZYMES_JSON) {
            Ok(base) => base,
            Err(e) => {
                log::warn!("Built-in enzyme table is unusable: {e}");
                Self::from_restriction_enzymes(vec![])
            }
        };
        if let Ok(text) = fs::read_to_string(path) {
            match Self::from_json_text(&text) {
                Ok(custom) if !custom.is_empty() => base = custom,
                Ok(_) => log::warn!("Enzyme table {path} is empty, keeping built-in enzymes"),
                Err(e) => log::warn!("Could not load enzyme table {path}: {e}"),
            }
        }
        base
    }
}

impl Default for Enzymes {
    fn default() -> Self {
        Self::load_with_override(RUNTIME_REBASE_PATH)
    }
}
