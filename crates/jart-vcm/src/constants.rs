/// Constant table for the simplified JART VCM model.
///
/// Three groups of values:
///   - physical constants and the lumped electro-thermal parameters of the
///     JART VCM v1b variability model (series line, thermal resistances,
///     ion hopping parameters)
///   - the nominal device geometry that the variability parameters are
///     measured against, plus the relative spread that maps a radius or
///     length onto a normalized deviation in [-1, 1]
///   - the fitted coefficients of the explicit current equation, one set per
///     voltage polarity
///
/// Every fitted coefficient is affine (and in a few places quadratic) in the
/// normalized deviations:
///   value = nominal + r*d_r + r2*d_r^2 + l*d_l + rl*d_r*d_l + r2l*d_r^2*d_l
///
/// The physical block holds the published JART VCM v1b values. The two
/// current-equation blocks (`NEGATIVE`, `POSITIVE`) do NOT: they are
/// hand-set stand-ins that reproduce the qualitative switching loop (SET near
/// -1.1 V, RESET near +0.65 V, HRS/LRS window of two orders of magnitude) and
/// nothing more. Results compared against JART reference data are only
/// meaningful once the published fit coefficients are loaded through
/// `crate::config` (`vcm-bench --constants FILE`).
///
/// The table is plain data. `ModelConstants::default()` is `PLACEHOLDER`.

use serde::{Deserialize, Serialize};

use Coefficient as C;

/// Normalized variability deviations (d_r, d_l).
///
/// d = (value - nominal) / (spread * nominal), so the valid device range
/// (nominal +/- 10 %) maps to [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Deviation {
    pub r: f64,
    pub l: f64,
}

/// One fitted coefficient with its sensitivities to d_r and d_l.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Coefficient {
    pub nominal: f64,
    #[serde(default)]
    pub r: f64,
    #[serde(default)]
    pub r2: f64,
    #[serde(default)]
    pub l: f64,
    /// d_r * d_l cross term (only p7_2 of the positive branch uses it)
    #[serde(default)]
    pub rl: f64,
    /// d_r^2 * d_l cross term
    #[serde(default)]
    pub r2l: f64,
}

impl Coefficient {
    /// Coefficient with no variability dependence.
    pub const fn fixed(nominal: f64) -> Self {
        Self { nominal, r: 0.0, r2: 0.0, l: 0.0, rl: 0.0, r2l: 0.0 }
    }

    /// Coefficient linear in d_r and d_l.
    pub const fn linear(nominal: f64, r: f64, l: f64) -> Self {
        Self { nominal, r, r2: 0.0, l, rl: 0.0, r2l: 0.0 }
    }

    pub const fn with_r2(mut self, r2: f64) -> Self {
        self.r2 = r2;
        self
    }

    /// Add the d_r dependence of the d_l sensitivity: l_eff = l + rl*d_r + r2l*d_r^2.
    pub const fn with_cross(mut self, rl: f64, r2l: f64) -> Self {
        self.rl = rl;
        self.r2l = r2l;
        self
    }

    /// Evaluate at the given deviation.
    #[inline]
    pub fn at(&self, d: Deviation) -> f64 {
        let l_eff = self.l + self.rl * d.r + self.r2l * d.r * d.r;
        self.nominal + self.r * d.r + self.r2 * d.r * d.r + l_eff * d.l
    }
}

/// Physical constants and lumped electro-thermal parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhysicalConstants {
    /// Elementary charge (C)
    pub elementary_charge: f64,
    /// Boltzmann constant (J/K)
    pub boltzmann: f64,
    /// Ambient temperature (K)
    pub ambient_temperature: f64,
    /// Oxygen vacancy charge number
    pub vacancy_valence: f64,
    /// Electron mobility in the disc (m^2/Vs)
    pub electron_mobility: f64,
    /// Vacancy concentration of the plug region (1e26 m^-3)
    pub plug_concentration: f64,
    /// Ion hopping distance (m)
    pub hopping_distance: f64,
    /// Attempt frequency (Hz)
    pub attempt_frequency: f64,
    /// Activation energy for ion hopping (eV)
    pub activation_energy: f64,
    /// Total cell length (nm)
    pub cell_length: f64,
    /// Effective thermal resistance at nominal radius (K/W)
    pub thermal_resistance: f64,
    /// Thermal resistance scaling for positive (RESET) polarity
    pub thermal_resistance_scaling: f64,
    /// TiOx series layer resistance (ohm)
    pub series_resistance: f64,
    /// Line resistance at ambient (ohm)
    pub line_resistance: f64,
    /// Line thermal resistance (K/W)
    pub line_thermal_resistance: f64,
    /// Line temperature coefficient (1/K)
    pub line_temperature_coefficient: f64,
}

/// Nominal device geometry and variability normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NominalDevice {
    /// Nominal filament radius (m)
    pub radius: f64,
    /// Nominal disc length (nm)
    pub length: f64,
    /// Relative radius spread mapped to d_r = +/-1
    pub radius_spread: f64,
    /// Relative length spread mapped to d_l = +/-1
    pub length_spread: f64,
    /// Reference concentration N_ref of the current fit: ln(N / N_ref)
    pub reference_concentration: f64,
}

/// Current-equation coefficients for V < 0 (SET polarity).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NegativeFit {
    // p1 = p1_0 * (p1_1 V + p1_2 V^2) / (1 + p1_3 V + p1_4 V^2)
    pub p1_0: Coefficient,
    pub p1_1: Coefficient,
    pub p1_2: Coefficient,
    pub p1_3: Coefficient,
    pub p1_4: Coefficient,
    pub p2_0: Coefficient,
    // p3 = p3_0 + p3_1 V
    pub p3_0: Coefficient,
    pub p3_1: Coefficient,
    // p4 = p4_0 - p4_1 exp(-p4_2 V)
    pub p4_0: Coefficient,
    pub p4_1: Coefficient,
    pub p4_2: Coefficient,
    // p5 = p5_1 V + p5_2 V^2
    pub p5_1: Coefficient,
    pub p5_2: Coefficient,
    pub p7_0: Coefficient,
    // p9, p10, 1/p11: logistic sigmoids in V (low-V value, high-|V| value, center, width)
    pub p9_0: Coefficient,
    pub p9_1: Coefficient,
    pub p9_2: Coefficient,
    pub p9_3: Coefficient,
    pub p10_0: Coefficient,
    pub p10_1: Coefficient,
    pub p10_2: Coefficient,
    pub p10_3: Coefficient,
    pub p11_0: Coefficient,
    pub p11_1: Coefficient,
    pub p11_2: Coefficient,
    pub p11_3: Coefficient,
}

/// Current-equation coefficients for V >= 0 (RESET polarity).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PositiveFit {
    /// p5 = p5_1 * (1 - exp(-p5_2 V)); the fit ties p5_0 to p5_1
    pub p5_1: Coefficient,
    pub p5_2: Coefficient,
    pub p6_0: Coefficient,
    pub p6_1: Coefficient,
    // p7 = p7_0 + p7_1 V + p7_2 exp(-p7_3 V)
    pub p7_0: Coefficient,
    pub p7_1: Coefficient,
    pub p7_2: Coefficient,
    pub p7_3: Coefficient,
    pub p8_0: Coefficient,
    pub p8_1: Coefficient,
    pub p10_0: Coefficient,
    pub p10_1: Coefficient,
    pub p10_2: Coefficient,
    pub p11_0: Coefficient,
    pub p11_1: Coefficient,
    pub p11_2: Coefficient,
}

/// The complete constant table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConstants {
    pub physical: PhysicalConstants,
    pub nominal: NominalDevice,
    pub negative: NegativeFit,
    pub positive: PositiveFit,
}

impl Default for ModelConstants {
    fn default() -> Self {
        PLACEHOLDER
    }
}

/// Concentration unit of the state variable (m^-3).
pub const CONCENTRATION_UNIT: f64 = 1e26;

/// JART VCM v1b electro-thermal parameters.
pub const PHYSICAL: PhysicalConstants = PhysicalConstants {
    elementary_charge: 1.602e-19,
    boltzmann: 1.3807e-23,
    ambient_temperature: 293.0,
    vacancy_valence: 2.0,
    electron_mobility: 4e-6,
    plug_concentration: 20.0,
    hopping_distance: 0.25e-9,
    attempt_frequency: 2e13,
    activation_energy: 1.35,
    cell_length: 3.0,
    thermal_resistance: 1.572e7,
    thermal_resistance_scaling: 0.27,
    series_resistance: 650.0,
    line_resistance: 719.2437,
    line_thermal_resistance: 90471.47,
    line_temperature_coefficient: 3.92e-3,
};

pub const NOMINAL: NominalDevice = NominalDevice {
    radius: 45e-9,
    length: 0.4,
    radius_spread: 0.1,
    length_spread: 0.1,
    reference_concentration: 8e-3,
};

/// SET-branch stand-in coefficients (not a published fit).
///
/// HRS current ~ -5 uA and LRS ~ -0.3 mA at -1 V for the nominal device;
/// the generalized-logistic step sits near N = 2..5 (ln(N/N_ref) ~ 5.5..6.5).
pub const NEGATIVE: NegativeFit = NegativeFit {
    p1_0: C::linear(1.6e-6, 2.9e-7, -1.4e-7),
    p1_1: C::linear(1.0, 0.02, -0.01),
    p1_2: C::linear(-0.3, -0.01, 0.005),
    p1_3: C::linear(0.0, 0.01, -0.01),
    p1_4: C::linear(0.2, 0.005, -0.004),
    p2_0: C::fixed(0.5),
    p3_0: C::linear(-1.5, -0.05, 0.04),
    p3_1: C::linear(0.2, 0.01, -0.01),
    p4_0: C::fixed(3.0),
    p4_1: C::linear(0.4, 0.02, -0.02),
    p4_2: C::fixed(0.8),
    p5_1: C::linear(2.2e-4, 3.5e-5, -2e-5),
    p5_2: C::linear(-2.7e-5, -4e-6, 0.0).with_r2(-5e-7),
    p7_0: C::linear(1.0, -0.05, 0.06),
    p9_0: C::linear(5.5, -0.12, 0.1),
    p9_1: C::fixed(6.5),
    p9_2: C::fixed(-0.8),
    p9_3: C::linear(0.15, 0.005, 0.0),
    p10_0: C::fixed(1.6),
    p10_1: C::linear(1.2, 0.04, 0.0),
    p10_2: C::fixed(-0.7),
    p10_3: C::fixed(0.2),
    p11_0: C::linear(1.0, 0.02, 0.0),
    p11_1: C::fixed(0.8),
    p11_2: C::fixed(-0.9),
    p11_3: C::fixed(0.2),
};

/// RESET-branch stand-in coefficients (not a published fit).
///
/// LRS current saturates toward p5_1 ~ 0.8 mA; HRS set by p7 (~100 at 1 V).
/// The LRS amplitude keeps I * R_series below the applied voltage at every
/// variability corner, otherwise the filament temperature goes negative.
pub const POSITIVE: PositiveFit = PositiveFit {
    p5_1: C::linear(8e-4, 1.2e-4, -6e-5),
    p5_2: C::fixed(0.6),
    p6_0: C::linear(1.0, 0.02, 0.0),
    p6_1: C::fixed(0.1),
    p7_0: C::linear(50.0, -4.0, 3.5).with_r2(0.3),
    p7_1: C::fixed(20.0),
    p7_2: C::linear(400.0, -30.0, 25.0).with_r2(2.0).with_cross(-2.0, 0.2),
    p7_3: C::fixed(2.0),
    p8_0: C::linear(0.5, 0.0, -0.02),
    p8_1: C::fixed(0.2),
    p10_0: C::linear(1.0, 0.0, -0.03),
    p10_1: C::fixed(0.2),
    p10_2: C::fixed(-0.05),
    p11_0: C::linear(1.0, 0.0, 0.02),
    p11_1: C::fixed(0.1),
    p11_2: C::fixed(0.02),
};

/// Published physical block with stand-in current coefficients.
pub const PLACEHOLDER: ModelConstants = ModelConstants {
    physical: PHYSICAL,
    nominal: NOMINAL,
    negative: NEGATIVE,
    positive: POSITIVE,
};

impl NominalDevice {
    /// Normalized deviations of a (radius, length) pair from nominal.
    pub fn deviation(&self, radius: f64, length: f64) -> Deviation {
        Deviation {
            r: (radius - self.radius) / (self.radius_spread * self.radius),
            l: (length - self.length) / (self.length_spread * self.length),
        }
    }
}
