use super::error::ForceFieldError;
use super::selector::Selector;
use super::types::AtomType;

/// Absolute tolerance under which 1-4 scale factors from different documents
/// are considered equal when force fields are merged.
pub const SCALE_TOLERANCE: f64 = 1e-5;

/// A harmonic bond rule: two selectors, an equilibrium length, and a spring
/// constant.
#[derive(Debug, Clone, PartialEq)]
pub struct BondRule {
    pub selectors: [Selector; 2],
    pub length: f64,
    pub k: f64,
}

/// A harmonic angle rule: three selectors, an equilibrium angle (radians),
/// and a spring constant.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleRule {
    pub selectors: [Selector; 3],
    pub angle: f64,
    pub k: f64,
}

/// A periodic torsion rule: four selectors plus periodicity, phase (radians),
/// and barrier height. Used for both propers and impropers; for impropers the
/// first selector addresses the central atom.
#[derive(Debug, Clone, PartialEq)]
pub struct TorsionRule {
    pub selectors: [Selector; 4],
    pub periodicity: u32,
    pub phase: f64,
    pub k: f64,
}

/// A per-particle nonbonded rule: one selector plus charge and Lennard-Jones
/// parameters. The charge is optional because some force fields carry charges
/// on residue template atoms instead.
#[derive(Debug, Clone, PartialEq)]
pub struct NonbondedRule {
    pub selector: Selector,
    pub charge: Option<f64>,
    pub sigma: f64,
    pub epsilon: f64,
}

/// Ranking key for rule selection.
///
/// Lower sorts first: tier 0 is an exact type match at every position, tier 1
/// a wildcard-free match using at least one class selector, tier 2 any rule
/// with wildcards, ranked by how many it uses. The registration index is the
/// final tie-break (first registered wins) — deliberately so, since nothing
/// else distinguishes two wildcard rules that tie exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Specificity {
    tier: u8,
    wildcards: usize,
    index: usize,
}

fn specificity(selectors: &[Selector], index: usize) -> Specificity {
    let wildcards = selectors.iter().filter(|s| s.is_wildcard()).count();
    let tier = if wildcards > 0 {
        2
    } else if selectors.iter().all(Selector::is_type) {
        0
    } else {
        1
    };
    Specificity {
        tier,
        wildcards,
        index,
    }
}

fn matches_in_order(selectors: &[Selector], sites: &[&AtomType]) -> bool {
    selectors.len() == sites.len()
        && selectors
            .iter()
            .zip(sites.iter())
            .all(|(selector, site)| selector.matches(site))
}

/// Symmetric interactions admit both site orders with identical precedence.
fn matches_either_orientation(selectors: &[Selector], sites: &[&AtomType]) -> bool {
    if matches_in_order(selectors, sites) {
        return true;
    }
    let reversed: Vec<&AtomType> = sites.iter().rev().copied().collect();
    matches_in_order(selectors, &reversed)
}

/// Generic specificity-ordered selection shared by all bonded rule sets.
fn select_best<'a, R>(
    rules: &'a [R],
    selectors_of: impl Fn(&R) -> &[Selector],
    admits: impl Fn(&R) -> bool,
) -> Option<&'a R> {
    rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| admits(rule))
        .min_by_key(|(index, rule)| specificity(selectors_of(rule), *index))
        .map(|(_, rule)| rule)
}

/// Rule set for harmonic bond parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarmonicBondGenerator {
    rules: Vec<BondRule>,
}

impl HarmonicBondGenerator {
    pub fn register(&mut self, rule: BondRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[BondRule] {
        &self.rules
    }

    /// Selects the applicable rule for a bond between the two types, by
    /// specificity: exact type match beats class match beats wildcard rules
    /// (fewest wildcards first), registration order breaking remaining ties.
    pub fn resolve(&self, a: &AtomType, b: &AtomType) -> Option<&BondRule> {
        select_best(
            &self.rules,
            |rule| &rule.selectors,
            |rule| matches_either_orientation(&rule.selectors, &[a, b]),
        )
    }
}

/// Rule set for harmonic angle parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarmonicAngleGenerator {
    rules: Vec<AngleRule>,
}

impl HarmonicAngleGenerator {
    pub fn register(&mut self, rule: AngleRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[AngleRule] {
        &self.rules
    }

    pub fn resolve(&self, a: &AtomType, b: &AtomType, c: &AtomType) -> Option<&AngleRule> {
        select_best(
            &self.rules,
            |rule| &rule.selectors,
            |rule| matches_either_orientation(&rule.selectors, &[a, b, c]),
        )
    }
}

/// Rule set for periodic torsions, proper and improper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodicTorsionGenerator {
    propers: Vec<TorsionRule>,
    impropers: Vec<TorsionRule>,
}

/// Deterministic visitation order for the three outer atoms of an improper.
const IMPROPER_PERMUTATIONS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

impl PeriodicTorsionGenerator {
    pub fn register_proper(&mut self, rule: TorsionRule) {
        self.propers.push(rule);
    }

    pub fn register_improper(&mut self, rule: TorsionRule) {
        self.impropers.push(rule);
    }

    pub fn propers(&self) -> &[TorsionRule] {
        &self.propers
    }

    pub fn impropers(&self) -> &[TorsionRule] {
        &self.impropers
    }

    pub fn resolve_proper(
        &self,
        a: &AtomType,
        b: &AtomType,
        c: &AtomType,
        d: &AtomType,
    ) -> Option<&TorsionRule> {
        select_best(
            &self.propers,
            |rule| &rule.selectors,
            |rule| matches_either_orientation(&rule.selectors, &[a, b, c, d]),
        )
    }

    /// Selects an improper rule for a center with three bonded neighbors.
    ///
    /// The first selector addresses the central atom; the remaining three are
    /// matched against the neighbors in deterministic permutation order.
    pub fn resolve_improper(
        &self,
        center: &AtomType,
        neighbors: [&AtomType; 3],
    ) -> Option<&TorsionRule> {
        select_best(
            &self.impropers,
            |rule| &rule.selectors,
            |rule| {
                rule.selectors[0].matches(center)
                    && IMPROPER_PERMUTATIONS.iter().any(|perm| {
                        perm.iter()
                            .zip(&rule.selectors[1..])
                            .all(|(&n, selector)| selector.matches(neighbors[n]))
                    })
            },
        )
    }
}

/// Rule set for per-particle nonbonded parameters plus the 1-4 scale factors.
#[derive(Debug, Clone, PartialEq)]
pub struct NonbondedGenerator {
    pub coulomb14_scale: f64,
    pub lj14_scale: f64,
    /// When set, particle charges come from the matched template atom rather
    /// than from the rule.
    pub charge_from_residue: bool,
    rules: Vec<NonbondedRule>,
}

impl NonbondedGenerator {
    pub fn new(coulomb14_scale: f64, lj14_scale: f64) -> Self {
        Self {
            coulomb14_scale,
            lj14_scale,
            charge_from_residue: false,
            rules: Vec::new(),
        }
    }

    pub fn register(&mut self, rule: NonbondedRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[NonbondedRule] {
        &self.rules
    }

    pub fn resolve(&self, atom_type: &AtomType) -> Option<&NonbondedRule> {
        select_best(
            &self.rules,
            |rule| std::slice::from_ref(&rule.selector),
            |rule| rule.selector.matches(atom_type),
        )
    }

    /// Merges another nonbonded rule set into this one.
    ///
    /// The scale factors of both sets must agree within [`SCALE_TOLERANCE`];
    /// within tolerance the first-registered values are kept silently.
    ///
    /// # Errors
    ///
    /// Returns [`ForceFieldError::ScaleFactorConflict`] when a factor differs
    /// beyond tolerance, and [`ForceFieldError::ChargeSourceConflict`] when
    /// the sets disagree on where charges come from.
    pub fn merge(&mut self, other: NonbondedGenerator) -> Result<(), ForceFieldError> {
        check_scale("coulomb14_scale", self.coulomb14_scale, other.coulomb14_scale)?;
        check_scale("lj14_scale", self.lj14_scale, other.lj14_scale)?;
        if self.charge_from_residue != other.charge_from_residue {
            return Err(ForceFieldError::ChargeSourceConflict);
        }
        self.rules.extend(other.rules);
        Ok(())
    }
}

fn check_scale(name: &'static str, first: f64, second: f64) -> Result<(), ForceFieldError> {
    if (first - second).abs() < SCALE_TOLERANCE {
        Ok(())
    } else {
        Err(ForceFieldError::ScaleFactorConflict {
            name,
            first,
            second,
            tolerance: SCALE_TOLERANCE,
        })
    }
}
