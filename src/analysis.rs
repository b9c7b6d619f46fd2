//! Digesting a target sequence with one or more enzymes.
//!
//! `cut_without_permutations` applies every recognition site at once.
//! `cut` also considers that a cut can destroy an overlapping recognition
//! site before its enzyme gets to it, and collects the fragments of every
//! order in which the sites can be cut.

use crate::{
    ENZYMES,
    cut_symbol::CutSymbol,
    enzyme_site::EnzymeSite,
    enzymes::Enzymes,
    error::{DigestError, Result},
    fragment::{self, Fragment, UniqueFragments},
    int_set::{IntSet, RangeIntSet, SortedIntSet},
    restriction_enzyme::RestrictionEnzymeSite,
};
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// One enzyme as a caller names it.
#[derive(Clone, Debug, PartialEq)]
pub enum EnzymeSpec {
    Site(EnzymeSite),
    Name(String),
    Notation(String),
    /// A notation if it contains the cut symbol, an enzyme name otherwise.
    Text(String),
}

impl From<EnzymeSite> for EnzymeSpec {
    fn from(site: EnzymeSite) -> Self {
        Self::Site(site)
    }
}

impl From<&EnzymeSite> for EnzymeSpec {
    fn from(site: &EnzymeSite) -> Self {
        Self::Site(site.clone())
    }
}

impl From<&str> for EnzymeSpec {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for EnzymeSpec {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestParameters {
    pub cut_symbol: CutSymbol,
    /// Largest group of mutually overlapping sites `cut` will enumerate.
    pub max_overlap_group_size: Option<usize>,
}

impl Default for DigestParameters {
    fn default() -> Self {
        Self {
            cut_symbol: CutSymbol::default(),
            max_overlap_group_size: None,
        }
    }
}

/// A target indexed by character, with one scanning byte per character.
struct Target {
    chars: Vec<char>,
    bases: Vec<u8>,
}

impl Target {
    // Never an IUPAC letter, so nothing matches across it
    const UNMATCHABLE: u8 = b'?';

    fn new(sequence: &str) -> Self {
        let chars: Vec<char> = sequence.chars().map(|c| c.to_ascii_lowercase()).collect();
        let bases = chars
            .iter()
            .map(|c| if c.is_ascii() { *c as u8 } else { Self::UNMATCHABLE })
            .collect();
        Self { chars, bases }
    }
}

#[derive(Clone, Debug)]
pub struct Analysis<'a> {
    enzymes: &'a Enzymes,
    parameters: DigestParameters,
}

impl Analysis<'static> {
    pub fn new() -> Self {
        Self::with_enzymes(&ENZYMES)
    }
}

impl Default for Analysis<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Analysis<'a> {
    pub fn with_enzymes(enzymes: &'a Enzymes) -> Self {
        Self {
            enzymes,
            parameters: DigestParameters::default(),
        }
    }

    pub fn with_parameters(mut self, parameters: DigestParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn parameters(&self) -> &DigestParameters {
        &self.parameters
    }

    pub fn enzymes(&self) -> &Enzymes {
        self.enzymes
    }

    pub fn resolve(&self, spec: &EnzymeSpec) -> Result<EnzymeSite> {
        let cut_symbol = &self.parameters.cut_symbol;
        match spec {
            EnzymeSpec::Site(site) => Ok(site.clone()),
            EnzymeSpec::Name(name) => EnzymeSite::from_name(name, self.enzymes),
            EnzymeSpec::Notation(notation) => EnzymeSite::from_notation_with(notation, cut_symbol),
            EnzymeSpec::Text(text) if cut_symbol.count_in(text) > 0 => {
                EnzymeSite::from_notation_with(text, cut_symbol)
            }
            EnzymeSpec::Text(text) => EnzymeSite::from_name(text, self.enzymes),
        }
    }

    pub fn resolve_all(&self, specs: &[EnzymeSpec]) -> Result<Vec<EnzymeSite>> {
        specs.iter().map(|spec| self.resolve(spec)).collect()
    }

    /// All recognition sites of `specs` in `sequence`, ordered by position.
    /// Positions count characters, not bytes.
    pub fn find_sites(
        &self,
        sequence: &str,
        specs: &[EnzymeSpec],
    ) -> Result<Vec<RestrictionEnzymeSite>> {
        let sites = self.resolve_all(specs)?;
        let target = Target::new(sequence);
        Ok(Self::locate(&target.bases, &sites))
    }

    /// Fragments from cutting every recognition site at once.
    pub fn cut_without_permutations(
        &self,
        sequence: &str,
        specs: &[EnzymeSpec],
    ) -> Result<UniqueFragments> {
        let sites = self.resolve_all(specs)?;
        let target = Target::new(sequence);
        let located = Self::locate(&target.bases, &sites);
        let (primary, complement): (RangeIntSet, RangeIntSet) = Self::collect_cuts(located.iter());
        log::debug!(
            "{} site(s), {} primary and {} complementary cut(s)",
            located.len(),
            primary.len(),
            complement.len()
        );
        Ok(UniqueFragments::new(Self::digest_with(
            &target.chars,
            &primary,
            &complement,
        )))
    }

    /// Every fragment that can arise from some order of cutting the sites.
    pub fn cut(&self, sequence: &str, specs: &[EnzymeSpec]) -> Result<UniqueFragments> {
        let sets = self.fragment_sets(sequence, specs)?;
        Ok(UniqueFragments::new(sets.into_iter().flatten()))
    }

    /// The distinct fragment sets behind `cut`, one per distinguishable
    /// outcome. The first set is the one `cut_without_permutations` returns,
    /// unless that is empty.
    pub fn fragment_sets(
        &self,
        sequence: &str,
        specs: &[EnzymeSpec],
    ) -> Result<Vec<UniqueFragments>> {
        let sites = self.resolve_all(specs)?;
        let target = Target::new(sequence);
        let located = Self::locate(&target.bases, &sites);
        if located.is_empty() {
            return Ok(vec![]);
        }

        let groups = Self::overlap_groups(&located);
        if let Some(limit) = self.parameters.max_overlap_group_size {
            if let Some(group) = groups.iter().find(|g| g.len() > limit) {
                return Err(DigestError::PermutationBudgetExceeded {
                    size: group.len(),
                    limit,
                });
            }
        }
        let mut fixed = vec![];
        let mut choices = vec![];
        for group in &groups {
            match group.as_slice() {
                [single] => fixed.push(*single),
                _ => choices.push(Self::cut_outcomes(&located, group)),
            }
        }
        log::debug!(
            "{} site(s) in {} group(s), {} with overlapping sites",
            located.len(),
            groups.len(),
            choices.len()
        );

        let mut ret: Vec<UniqueFragments> = vec![];
        let mut seen: HashSet<UniqueFragments> = HashSet::new();
        let mut add = |chosen: &[usize]| {
            let (primary, complement): (SortedIntSet, SortedIntSet) =
                Self::collect_cuts(chosen.iter().map(|i| &located[*i]));
            let fragments =
                UniqueFragments::new(Self::digest_with(&target.chars, &primary, &complement));
            if !fragments.is_empty() && seen.insert(fragments.clone()) {
                ret.push(fragments);
            }
        };

        let all: Vec<usize> = (0..located.len()).collect();
        add(&all);
        if !choices.is_empty() {
            for combination in choices.iter().map(|c| c.iter()).multi_cartesian_product() {
                let chosen: Vec<usize> = fixed
                    .iter()
                    .copied()
                    .chain(combination.into_iter().flatten().copied())
                    .collect();
                add(&chosen);
            }
        }
        log::debug!("{} distinct fragment set(s)", ret.len());
        Ok(ret)
    }

    fn locate(target: &[u8], sites: &[EnzymeSite]) -> Vec<RestrictionEnzymeSite> {
        let per_enzyme: Vec<Vec<RestrictionEnzymeSite>> =
            sites.par_iter().map(|site| site.get_sites(target)).collect();
        for (site, found) in sites.iter().zip(per_enzyme.iter()) {
            log::debug!("{}: {} recognition site(s)", site.label(), found.len());
        }
        let ret: Vec<RestrictionEnzymeSite> =
            per_enzyme.into_iter().flatten().sorted().dedup().collect();
        for site in &ret {
            log::trace!(
                "{} at {}..{} ({:?}), cuts {:?}/{:?}",
                site.enzyme,
                site.start,
                site.end,
                site.strand,
                site.primary_cuts,
                site.complement_cuts
            );
        }
        ret
    }

    fn collect_cuts<'s, S, I>(sites: I) -> (S, S)
    where
        S: IntSet,
        I: Iterator<Item = &'s RestrictionEnzymeSite>,
    {
        let mut primary = S::default();
        let mut complement = S::default();
        for site in sites {
            primary.extend_from(site.primary_cuts.iter().copied());
            complement.extend_from(site.complement_cuts.iter().copied());
        }
        (primary, complement)
    }

    /// Fragments of both strands, or nothing if no cut falls inside the target.
    fn digest_with<S: IntSet>(target: &[char], primary: &S, complement: &S) -> Vec<Fragment> {
        let len = target.len() as isize;
        let inside = |cuts: &S| cuts.iter().any(|c| 0 < c && c < len);
        if !inside(primary) && !inside(complement) {
            return vec![];
        }
        fragment::digest(target, primary, complement)
    }

    /// Connected components of sites whose cuts destroy one another.
    fn overlap_groups(sites: &[RestrictionEnzymeSite]) -> Vec<Vec<usize>> {
        fn root(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }

        let mut parent: Vec<usize> = (0..sites.len()).collect();
        for i in 0..sites.len() {
            for j in (i + 1)..sites.len() {
                if sites[i].cuts_into(&sites[j]) || sites[j].cuts_into(&sites[i]) {
                    let (a, b) = (root(&mut parent, i), root(&mut parent, j));
                    if a != b {
                        parent[b] = a;
                    }
                }
            }
        }
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..sites.len() {
            let r = root(&mut parent, i);
            groups.entry(r).or_default().push(i);
        }
        groups.into_values().collect()
    }

    /// The distinct sets of sites in `group` that end up cut, over every
    /// order of cutting. A cut site removes the intact sites it cuts into.
    fn cut_outcomes(sites: &[RestrictionEnzymeSite], group: &[usize]) -> Vec<Vec<usize>> {
        let mut outcomes: BTreeSet<Vec<usize>> = BTreeSet::new();
        let mut seen: HashSet<(Vec<usize>, Vec<usize>)> = HashSet::new();
        let mut stack: Vec<(Vec<usize>, Vec<usize>)> = vec![(group.to_vec(), vec![])];
        while let Some((intact, done)) = stack.pop() {
            if intact.is_empty() {
                outcomes.insert(done);
                continue;
            }
            if !seen.insert((intact.clone(), done.clone())) {
                continue;
            }
            for &next in &intact {
                let remaining: Vec<usize> = intact
                    .iter()
                    .copied()
                    .filter(|&i| i != next && !sites[next].cuts_into(&sites[i]))
                    .collect();
                let mut done = done.clone();
                let pos = done.partition_point(|&i| i < next);
                done.insert(pos, next);
                stack.push((remaining, done));
            }
        }
        outcomes.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{enzyme_site::CutOffsetPair, pattern::Strand};

    fn specs(items: &[&str]) -> Vec<EnzymeSpec> {
        items.iter().map(|s| EnzymeSpec::from(*s)).collect()
    }

    #[test]
    fn test_overlapping_palindromes() {
        let analysis = Analysis::new();
        let enzymes = specs(&["ag^ag"]);
        let f = analysis.cut_without_permutations("cagagag", &enzymes).unwrap();
        assert_eq!(f.primary(), vec!["ag", "cag"]);
        assert_eq!(f.complement(), vec!["gtc", "tc"]);
        // Neither site's cut lands inside the other
        let g = analysis.cut("cagagag", &enzymes).unwrap();
        assert_eq!(f, g);

        let f = analysis.cut_without_permutations("agagag", &enzymes).unwrap();
        assert_eq!(f.primary(), vec!["ag"]);
        assert_eq!(f.complement(), vec!["tc"]);
        let g = analysis.cut("agagag", &enzymes).unwrap();
        assert_eq!(f, g);
    }

    #[test]
    fn test_mutually_exclusive_sites() {
        let analysis = Analysis::new();
        let site = EnzymeSite::from_pattern("atgcatgc", &[CutOffsetPair::new(3, 3)]).unwrap();
        let enzymes = vec![EnzymeSpec::from(site)];

        let sites = analysis.find_sites("atgcatgcatgc", &enzymes).unwrap();
        let spans: Vec<(usize, usize, Strand)> =
            sites.iter().map(|s| (s.start, s.end, s.strand)).collect();
        assert_eq!(
            spans,
            vec![
                (0, 8, Strand::Primary),
                (2, 10, Strand::Complement),
                (4, 12, Strand::Primary)
            ]
        );

        let all_at_once = analysis
            .cut_without_permutations("atgcatgcatgc", &enzymes)
            .unwrap();
        assert_eq!(all_at_once.primary(), vec!["atg", "catg", "catgc"]);
        assert_eq!(all_at_once.complement(), vec!["gtac", "gtacg", "tac"]);

        let any_order = analysis.cut("atgcatgcatgc", &enzymes).unwrap();
        assert_eq!(any_order.primary(), vec!["atg", "atgcatg", "catg", "catgc"]);
        assert_eq!(
            any_order.complement(),
            vec!["gtac", "gtacg", "tac", "tacgtac"]
        );
        assert!(all_at_once.is_subset_of(&any_order));
        assert!(all_at_once.len() <= any_order.len());

        let sets = analysis.fragment_sets("atgcatgcatgc", &enzymes).unwrap();
        assert_eq!(sets[0], all_at_once);
        assert!(sets.contains(&UniqueFragments::new(vec![
            Fragment::new(Strand::Primary, "atgcatg"),
            Fragment::new(Strand::Primary, "catgc"),
            Fragment::new(Strand::Complement, "tacgtac"),
            Fragment::new(Strand::Complement, "gtacg"),
        ])));
    }

    #[test]
    fn test_competing_enzymes() {
        let analysis = Analysis::new();
        let enzymes = specs(&["EcoRI", "gaa^ttc"]);
        let all_at_once = analysis
            .cut_without_permutations("ttgaattctt", &enzymes)
            .unwrap();
        assert_eq!(all_at_once.primary(), vec!["aa", "ttctt", "ttg"]);
        assert_eq!(all_at_once.complement(), vec!["aa", "aactt", "gaa"]);

        let any_order = analysis.cut("ttgaattctt", &enzymes).unwrap();
        assert_eq!(
            any_order.primary(),
            vec!["aa", "aattctt", "ttctt", "ttg", "ttgaa"]
        );
        assert_eq!(
            any_order.complement(),
            vec!["aa", "aactt", "aacttaa", "aagaa", "gaa"]
        );
        assert!(all_at_once.is_subset_of(&any_order));
    }

    #[test]
    fn test_enzyme_by_name() {
        let analysis = Analysis::new();
        let f = analysis
            .cut_without_permutations("aaaGAATTCaaa", &specs(&["ecori"]))
            .unwrap();
        assert_eq!(f.primary(), vec!["aaag", "aattcaaa"]);
        assert_eq!(f.complement(), vec!["gttt", "tttcttaa"]);

        let f = analysis
            .cut_without_permutations(
                "aggtctcaaaaaaaaagagacctt",
                &[EnzymeSpec::Name("BsaI".to_string())],
            )
            .unwrap();
        assert_eq!(f.primary(), vec!["aaa", "aaaaagagacctt", "aggtctca"]);
        assert_eq!(f.complement(), vec!["tccagagttttt", "tctctggaa", "ttt"]);
    }

    #[test]
    fn test_cuts_at_sequence_ends() {
        // EcoRII cuts in front of the first and behind the last site
        let analysis = Analysis::new();
        let f = analysis
            .cut("ccaggaaaaacctgg", &specs(&["EcoRII"]))
            .unwrap();
        assert_eq!(f.primary(), vec!["ccaggaaaaa", "cctgg"]);
        assert_eq!(f.complement(), vec!["ggtcc", "tttttggacc"]);
    }

    #[test]
    fn test_nothing_to_cut() {
        let analysis = Analysis::new();
        let enzymes = specs(&["ag^ag"]);
        assert!(analysis.cut("", &enzymes).unwrap().is_empty());
        assert!(analysis.cut_without_permutations("", &enzymes).unwrap().is_empty());
        assert!(analysis.cut("cccccc", &enzymes).unwrap().is_empty());
        assert!(
            analysis
                .cut_without_permutations("cccccc", &enzymes)
                .unwrap()
                .is_empty()
        );
        assert!(analysis.fragment_sets("cccccc", &enzymes).unwrap().is_empty());
        // A site whose cut sits on the target's edge leaves it whole
        assert!(analysis.cut("agag", &specs(&["^agag"])).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_symbols_in_target() {
        let analysis = Analysis::new();
        let f = analysis
            .cut_without_permutations("cagxagag", &specs(&["ag^ag"]))
            .unwrap();
        assert_eq!(f.primary(), vec!["ag", "cagxag"]);
        assert_eq!(f.complement(), vec!["gtcxtc", "tc"]);

        let f = analysis
            .cut_without_permutations("aggtctcéé", &specs(&["BsaI"]))
            .unwrap();
        assert_eq!(f.primary(), vec!["aggtctcé", "é"]);
        assert_eq!(f.complement(), vec!["tccagagéé"]);
        assert_eq!(f.primary().concat().chars().count(), 9);

        let sites = analysis.find_sites("éaggtctc", &specs(&["BsaI"])).unwrap();
        assert_eq!((sites[0].start, sites[0].end), (2, 8));
    }

    #[test]
    fn test_palindrome_with_asymmetric_cuts() {
        let analysis = Analysis::new();
        let site = EnzymeSite::from_pattern("gaattc", &[CutOffsetPair::new(2, 2)]).unwrap();
        let enzymes = vec![EnzymeSpec::from(site)];

        let all_at_once = analysis
            .cut_without_permutations("aagaattcaa", &enzymes)
            .unwrap();
        assert_eq!(all_at_once.primary(), vec!["aaga", "at", "tcaa"]);
        assert_eq!(all_at_once.complement(), vec!["agtt", "ta", "ttct"]);

        // Each reading destroys the other
        let any_order = analysis.cut("aagaattcaa", &enzymes).unwrap();
        assert_eq!(
            any_order.primary(),
            vec!["aaga", "aagaat", "at", "attcaa", "tcaa"]
        );
        assert_eq!(
            any_order.complement(),
            vec!["agtt", "ta", "taagtt", "ttct", "ttctta"]
        );
        assert_eq!(
            analysis.fragment_sets("aagaattcaa", &enzymes).unwrap().len(),
            3
        );
    }

    #[test]
    fn test_bad_enzymes() {
        let analysis = Analysis::new();
        assert_eq!(
            analysis.cut("gaattc", &specs(&["NoSuchI"])),
            Err(DigestError::UnknownEnzyme("NoSuchI".to_string()))
        );
        assert!(matches!(
            analysis.cut("gaattc", &specs(&["ga^^attc"])),
            Err(DigestError::AdjacentMarkers(_))
        ));
        assert!(matches!(
            analysis.cut_without_permutations("gaattc", &specs(&["ga^xttc"])),
            Err(DigestError::InvalidSymbol { .. })
        ));
        assert!(matches!(
            analysis.find_sites("gaattc", &[EnzymeSpec::Notation("gaattc".to_string())]),
            Err(DigestError::ArityMismatch(_))
        ));
    }

    #[test]
    fn test_custom_enzyme_table() {
        let enzymes = Enzymes::from_json_text(
            r#"[{"type": "restriction", "name": "AgaI", "sequence": "AGAG", "cut": 2, "overlap": 0, "note": null}]"#,
        )
        .unwrap();
        let analysis = Analysis::with_enzymes(&enzymes);
        let f = analysis.cut("cagagag", &specs(&["agai"])).unwrap();
        assert_eq!(f.primary(), vec!["ag", "cag"]);
        assert!(analysis.cut("gaattc", &specs(&["EcoRI"])).is_err());
    }

    #[test]
    fn test_parameters() {
        let parameters = DigestParameters {
            cut_symbol: CutSymbol::new('|').unwrap(),
            max_overlap_group_size: Some(2),
        };
        let analysis = Analysis::new().with_parameters(parameters);
        let f = analysis.cut("cagagag", &specs(&["ag|ag"])).unwrap();
        assert_eq!(f.primary(), vec!["ag", "cag"]);
        // Without the configured cut symbol the text is taken as a name
        assert!(analysis.cut("cagagag", &specs(&["ag^ag"])).is_err());

        let site = EnzymeSite::from_pattern("atgcatgc", &[CutOffsetPair::new(3, 3)]).unwrap();
        let enzymes = vec![EnzymeSpec::from(&site)];
        assert_eq!(
            analysis.cut("atgcatgcatgc", &enzymes),
            Err(DigestError::PermutationBudgetExceeded { size: 3, limit: 2 })
        );
        assert!(
            analysis
                .cut_without_permutations("atgcatgcatgc", &enzymes)
                .is_ok()
        );

        let json = serde_json::to_string(analysis.parameters()).unwrap();
        let back: DigestParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, analysis.parameters());
        let partial: DigestParameters = serde_json::from_str("{}").unwrap();
        assert_eq!(partial, DigestParameters::default());
    }
}
