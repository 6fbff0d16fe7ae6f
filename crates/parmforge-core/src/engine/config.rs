/// How the consuming engine should treat nonbonded interactions.
///
/// Forwarded verbatim to the system sink; this library attaches no numerical
/// meaning to the variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonbondedMethod {
    #[default]
    NoCutoff,
    CutoffNonPeriodic,
    CutoffPeriodic,
    Ewald,
    Pme,
}

/// Which interactions are converted into distance constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstraintLevel {
    /// No constraints beyond rigid water (if enabled).
    #[default]
    None,
    /// Constrain bonds that involve a hydrogen.
    HydrogenBonds,
    /// Constrain all bonds.
    AllBonds,
    /// Constrain all bonds, plus angles involving hydrogen
    /// (H-X-H always, H-O-X when the apex atom is an oxygen).
    HydrogenAngles,
}

/// Options controlling system construction.
///
/// All fields are pass-through configuration for the system sink except
/// `constraints`, `rigid_water`, and `hydrogen_mass`, which change how the
/// build translates interactions into terms.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub nonbonded_method: NonbondedMethod,
    /// Cutoff distance in nanometers.
    pub cutoff: f64,
    pub dispersion_correction: bool,
    pub constraints: ConstraintLevel,
    /// Replace water-residue bonds and angles with a rigid triangle.
    pub rigid_water: bool,
    /// When set, every hydrogen gets this mass (daltons); the difference is
    /// taken from the bonded heavy atom so total mass is preserved.
    pub hydrogen_mass: Option<f64>,
    pub solvent_dielectric: f64,
    pub solute_dielectric: f64,
    pub remove_cm_motion: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            nonbonded_method: NonbondedMethod::NoCutoff,
            cutoff: 1.0,
            dispersion_correction: true,
            constraints: ConstraintLevel::None,
            rigid_water: true,
            hydrogen_mass: None,
            solvent_dielectric: 78.3,
            solute_dielectric: 1.0,
            remove_cm_motion: true,
        }
    }
}

#[derive(Default)]
pub struct BuildConfigBuilder {
    config: BuildConfig,
}

impl BuildConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nonbonded_method(mut self, method: NonbondedMethod) -> Self {
        self.config.nonbonded_method = method;
        self
    }

    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.config.cutoff = cutoff;
        self
    }

    pub fn dispersion_correction(mut self, enabled: bool) -> Self {
        self.config.dispersion_correction = enabled;
        self
    }

    pub fn constraints(mut self, level: ConstraintLevel) -> Self {
        self.config.constraints = level;
        self
    }

    pub fn rigid_water(mut self, enabled: bool) -> Self {
        self.config.rigid_water = enabled;
        self
    }

    pub fn hydrogen_mass(mut self, mass: f64) -> Self {
        self.config.hydrogen_mass = Some(mass);
        self
    }

    pub fn solvent_dielectric(mut self, dielectric: f64) -> Self {
        self.config.solvent_dielectric = dielectric;
        self
    }

    pub fn solute_dielectric(mut self, dielectric: f64) -> Self {
        self.config.solute_dielectric = dielectric;
        self
    }

    pub fn remove_cm_motion(mut self, enabled: bool) -> Self {
        self.config.remove_cm_motion = enabled;
        self
    }

    pub fn build(self) -> BuildConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = BuildConfig::default();
        assert_eq!(config.nonbonded_method, NonbondedMethod::NoCutoff);
        assert_eq!(config.cutoff, 1.0);
        assert!(config.dispersion_correction);
        assert_eq!(config.constraints, ConstraintLevel::None);
        assert!(config.rigid_water);
        assert!(config.hydrogen_mass.is_none());
        assert!(config.remove_cm_motion);
    }

    #[test]
    fn builder_overrides_selected_fields_only() {
        let config = BuildConfigBuilder::new()
            .nonbonded_method(NonbondedMethod::Pme)
            .cutoff(2.0)
            .constraints(ConstraintLevel::HydrogenBonds)
            .rigid_water(false)
            .hydrogen_mass(4.0)
            .build();

        assert_eq!(config.nonbonded_method, NonbondedMethod::Pme);
        assert_eq!(config.cutoff, 2.0);
        assert_eq!(config.constraints, ConstraintLevel::HydrogenBonds);
        assert!(!config.rigid_water);
        assert_eq!(config.hydrogen_mass, Some(4.0));
        // Untouched fields keep their defaults.
        assert!(config.dispersion_correction);
        assert_eq!(config.solute_dielectric, 1.0);
    }
}
