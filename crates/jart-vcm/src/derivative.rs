/// State equation dN/dt = g(V, N, r, l, N_min, N_max).
///
/// The rate of change of the disc vacancy concentration is the ionic current
/// through the disc, from the JART VCM v1b transport model:
///
///   V_series = I * (R_TiOx + R0 * (1 + R0 * alpha_line * I^2 * Rth_line))
///   V_disc   = I * l / (N * z * e * mu_n * A)
///   E        = V_disc / l                         (V < 0, SET)
///            = (V - V_series) / l_cell            (V >= 0, RESET)
///   gamma    = z * E * a / (pi * dWa)
///   dWa_min  = dWa * (sqrt(1 - gamma^2) - gamma*pi/2 + gamma*asin(gamma))
///   dWa_max  = dWa * (sqrt(1 - gamma^2) + gamma*pi/2 + gamma*asin(gamma))
///   T        = I * (V - V_series) * Rth_eff + T0
///   I_ion    = z * e * c_vo * a * nu0 * A * (exp(-dWa_min/kT) - exp(-dWa_max/kT)) * F_lim
///   dN/dt    = -I_ion / (A * l * e * z)
///
/// F_lim shuts the ionic current off as N approaches the bound it is being
/// driven toward: 1 - (N/N_max)^10 for SET, 1 - (N_min/N)^10 for RESET.
///
/// gamma is not clamped. |gamma| > 1 puts sqrt/asin outside their real domain
/// and the NaN propagates to the caller like every other numerical excursion.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::constants::{CONCENTRATION_UNIT, ModelConstants};
use crate::current;
use crate::device::{StateBounds, Variability};
use crate::waveform::Waveform;

/// Intermediate quantities of one state-equation evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transport {
    /// Device current (A)
    pub current: f64,
    /// Voltage across the series resistance (V)
    pub series_drop: f64,
    /// Voltage across the disc (V)
    pub disc_drop: f64,
    /// Driving field for ion hopping (V/m)
    pub field: f64,
    /// Field-normalized barrier lowering
    pub gamma: f64,
    /// Filament temperature (K)
    pub temperature: f64,
    /// Boundary limiting factor F_lim
    pub limiter: f64,
    /// Ionic current (A)
    pub ionic_current: f64,
    /// dN/dt (1e26 m^-3 / s)
    pub rate: f64,
}

/// dN/dt for a given voltage.
///
/// NaN if `state` is outside the tolerance-padded bounds. Exactly 0 when the
/// state is already past the bound the voltage pushes it toward.
pub fn state_derivative(
    c: &ModelConstants,
    voltage: f64,
    state: f64,
    var: &Variability,
    bounds: &StateBounds,
) -> f64 {
    if !bounds.admits(state) {
        log::trace!("state {state:e} outside {:?}", bounds.padded());
        return f64::NAN;
    }
    if is_saturated(voltage, state, bounds) {
        return 0.0;
    }
    transport(c, voltage, state, var, bounds).rate
}

/// dN/dt at time `t`, with the voltage taken from `waveform`.
pub fn derivative_at(
    c: &ModelConstants,
    t: f64,
    state: f64,
    var: &Variability,
    bounds: &StateBounds,
    waveform: &Waveform,
) -> f64 {
    state_derivative(c, waveform.voltage_at(t), state, var, bounds)
}

/// Bind everything but (t, y) into an ODE right-hand side `f(t, y) -> dy/dt`.
pub fn ode_rhs<'a>(
    c: &'a ModelConstants,
    var: Variability,
    bounds: StateBounds,
    waveform: &'a Waveform,
) -> impl Fn(f64, f64) -> f64 + 'a {
    move |t, y| derivative_at(c, t, y, &var, &bounds, waveform)
}

/// True when the state sits beyond the bound the voltage drives it toward.
pub fn is_saturated(voltage: f64, state: f64, bounds: &StateBounds) -> bool {
    (state < bounds.min() && voltage > 0.0) || (state > bounds.max() && voltage < 0.0)
}

/// Full transport evaluation, without the domain guard or the saturation clamp.
pub fn transport(
    c: &ModelConstants,
    voltage: f64,
    state: f64,
    var: &Variability,
    bounds: &StateBounds,
) -> Transport {
    let k = &c.physical;
    let charge = k.vacancy_valence * k.elementary_charge;

    let i = current::current(c, voltage, state, var);
    let radius = var.radius();
    let length = var.length() * 1e-9;
    let area = PI * radius * radius;

    // Series line self-heats: R0 rises with I^2 through the line thermal resistance
    let r_series = k.series_resistance
        + k.line_resistance
            * (1.0 + k.line_resistance * k.line_temperature_coefficient * i * i * k.line_thermal_resistance);
    let series_drop = i * r_series;

    let r_disc = length / (state * CONCENTRATION_UNIT * charge * k.electron_mobility * area);
    let disc_drop = i * r_disc;

    let c_vo = (k.plug_concentration + state) / 2.0 * CONCENTRATION_UNIT;
    let geometry = (c.nominal.radius / radius).powi(2);

    let (field, r_th_eff, limiter) = if voltage < 0.0 {
        (
            disc_drop / length,
            k.thermal_resistance * geometry,
            1.0 - (state / bounds.max()).powi(10),
        )
    } else {
        (
            (voltage - series_drop) / (k.cell_length * 1e-9),
            k.thermal_resistance * k.thermal_resistance_scaling * geometry,
            1.0 - (bounds.min() / state).powi(10),
        )
    };

    let gamma = k.vacancy_valence * field * k.hopping_distance / (PI * k.activation_energy);
    let root = (1.0 - gamma * gamma).sqrt();
    let arc = gamma * gamma.asin();
    let barrier = k.activation_energy * k.elementary_charge;
    let barrier_min = barrier * (root - gamma * FRAC_PI_2 + arc);
    let barrier_max = barrier * (root + gamma * FRAC_PI_2 + arc);

    let temperature = i * (voltage - series_drop) * r_th_eff + k.ambient_temperature;
    let kt = k.boltzmann * temperature;

    let ionic_current = charge * c_vo * k.hopping_distance * k.attempt_frequency * area
        * ((-barrier_min / kt).exp() - (-barrier_max / kt).exp())
        * limiter;
    let rate = -ionic_current / (area * length * charge) / CONCENTRATION_UNIT;

    Transport {
        current: i,
        series_drop,
        disc_drop,
        field,
        gamma,
        temperature,
        limiter,
        ionic_current,
        rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PLACEHOLDER;

    fn nominal() -> (Variability, StateBounds) {
        (
            Variability::new(45e-9, 0.4).unwrap(),
            StateBounds::new(4e-3, 22.0).unwrap(),
        )
    }

    #[test]
    fn test_out_of_bounds_is_nan() {
        let (var, bounds) = nominal();
        let lo = 4e-3 * (1.0 - 1e-8);
        let hi = 22.0 * (1.0 + 1e-8);
        for &v in &[-1.3, -0.4, 0.0, 0.4, 1.3] {
            for &n in &[0.0, -0.1, lo * (1.0 - 1e-9), hi * (1.0 + 1e-9), 100.0, f64::NAN] {
                let rate = state_derivative(&PLACEHOLDER, v, n, &var, &bounds);
                assert!(rate.is_nan(), "dN/dt({v}, {n}) = {rate}, expected NaN");
            }
        }
    }

    #[test]
    fn test_saturation_clamps_to_exact_zero() {
        let (var, bounds) = nominal();
        // Below N_min (inside tolerance) while RESET voltage applied
        let below = 4e-3 * (1.0 - 0.5e-8);
        for &v in &[1e-3, 0.7, 1.3] {
            assert_eq!(state_derivative(&PLACEHOLDER, v, below, &var, &bounds), 0.0);
        }
        // Above N_max while SET voltage applied
        let above = 22.0 * (1.0 + 0.5e-8);
        for &v in &[-1e-3, -0.7, -1.3] {
            assert_eq!(state_derivative(&PLACEHOLDER, v, above, &var, &bounds), 0.0);
        }
        // Opposite polarity is not clamped
        let set = state_derivative(&PLACEHOLDER, -1.3, below, &var, &bounds);
        assert!(set > 0.0, "SET from below N_min: {set}");
        let reset = state_derivative(&PLACEHOLDER, 1.3, above, &var, &bounds);
        assert!(reset < 0.0, "RESET from above N_max: {reset}");
    }

    #[test]
    fn test_set_and_reset_directions() {
        let (var, bounds) = nominal();
        for &n in &[0.01, 0.1, 1.0, 5.0] {
            let set = state_derivative(&PLACEHOLDER, -1.0, n, &var, &bounds);
            assert!(set > 0.0, "negative voltage should grow N={n}: {set}");
            let reset = state_derivative(&PLACEHOLDER, 1.0, n, &var, &bounds);
            assert!(reset < 0.0, "positive voltage should shrink N={n}: {reset}");
        }
    }

    #[test]
    fn test_zero_voltage_is_quiescent() {
        let (var, bounds) = nominal();
        for &n in &[4e-3, 0.01, 1.0, 22.0] {
            let rate = state_derivative(&PLACEHOLDER, 0.0, n, &var, &bounds);
            assert_eq!(rate, 0.0, "dN/dt at 0 V, N={n}");
        }
    }

    #[test]
    fn test_rate_is_strongly_nonlinear_in_voltage() {
        // Ion hopping is thermally activated: a few hundred mV more drive
        // speeds SET by orders of magnitude.
        let (var, bounds) = nominal();
        let slow = state_derivative(&PLACEHOLDER, -0.5, 0.1, &var, &bounds);
        let fast = state_derivative(&PLACEHOLDER, -1.0, 0.1, &var, &bounds);
        assert!(fast / slow > 1e3, "SET speed-up only {:.1}x", fast / slow);
    }

    #[test]
    fn test_limiter_vanishes_at_bounds() {
        let (var, bounds) = nominal();
        let t = transport(&PLACEHOLDER, -1.0, 22.0, &var, &bounds);
        assert!(t.limiter.abs() < 1e-12, "F_lim at N_max: {}", t.limiter);
        assert!(t.rate.abs() < 1e-6, "SET rate at N_max: {}", t.rate);

        let t = transport(&PLACEHOLDER, 1.0, 4e-3, &var, &bounds);
        assert!(t.limiter.abs() < 1e-12, "F_lim at N_min: {}", t.limiter);
    }

    #[test]
    fn test_joule_heating() {
        let (var, bounds) = nominal();
        let t = transport(&PLACEHOLDER, 1.0, 20.0, &var, &bounds);
        assert!(t.temperature > 400.0, "LRS at 1 V should self-heat: {} K", t.temperature);
        let cold = transport(&PLACEHOLDER, 0.05, 0.01, &var, &bounds);
        assert!(
            (cold.temperature - 293.0).abs() < 1.0,
            "HRS at 50 mV should stay near ambient: {} K",
            cold.temperature
        );
    }

    #[test]
    fn test_gamma_beyond_unity_propagates_nan() {
        // A very short cell puts the whole RESET drop across a few pm
        let mut c = PLACEHOLDER;
        c.physical.cell_length = 1e-3;
        let (var, bounds) = nominal();
        let t = transport(&c, 1.0, 0.01, &var, &bounds);
        assert!(t.gamma > 1.0, "gamma = {}", t.gamma);
        assert!(state_derivative(&c, 1.0, 0.01, &var, &bounds).is_nan());
    }

    #[test]
    fn test_ode_rhs_binds_arguments() {
        let (var, bounds) = nominal();
        let wave = Waveform::constant(-0.8);
        let f = ode_rhs(&PLACEHOLDER, var, bounds, &wave);
        let direct = state_derivative(&PLACEHOLDER, -0.8, 0.3, &var, &bounds);
        assert_eq!(f(12.5, 0.3), direct);
        assert!(f(0.0, 50.0).is_nan());
    }
}
