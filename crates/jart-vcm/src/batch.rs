//! Element-wise evaluation over slices.
//!
//! Paired inputs are zipped, so the output has the length of the shorter
//! input. The `_at_state` / `_at_voltage` variants hold one argument fixed.

use crate::constants::ModelConstants;
use crate::current::current;
use crate::derivative::state_derivative;
use crate::device::{StateBounds, Variability};

/// I(V_i, N_i) for each pair.
pub fn currents(c: &ModelConstants, voltages: &[f64], states: &[f64], var: &Variability) -> Vec<f64> {
    voltages
        .iter()
        .zip(states)
        .map(|(&v, &n)| current(c, v, n, var))
        .collect()
}

/// I(V_i, N) for one fixed state: an I-V trace.
pub fn currents_at_state(c: &ModelConstants, voltages: &[f64], state: f64, var: &Variability) -> Vec<f64> {
    voltages.iter().map(|&v| current(c, v, state, var)).collect()
}

/// dN/dt(V_i, N_i) for each pair.
pub fn state_derivatives(
    c: &ModelConstants,
    voltages: &[f64],
    states: &[f64],
    var: &Variability,
    bounds: &StateBounds,
) -> Vec<f64> {
    voltages
        .iter()
        .zip(states)
        .map(|(&v, &n)| state_derivative(c, v, n, var, bounds))
        .collect()
}

/// dN/dt(V, N_i) for one fixed voltage.
pub fn state_derivatives_at_voltage(
    c: &ModelConstants,
    voltage: f64,
    states: &[f64],
    var: &Variability,
    bounds: &StateBounds,
) -> Vec<f64> {
    states
        .iter()
        .map(|&n| state_derivative(c, voltage, n, var, bounds))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PLACEHOLDER;

    #[test]
    fn test_matches_scalar_evaluation() {
        let var = Variability::new(43e-9, 0.42).unwrap();
        let bounds = StateBounds::new(4e-3, 22.0).unwrap();
        let v = [-1.2, -0.3, 0.0, 0.4, 1.1];
        let n = [0.01, 2.0, 5.0, 20.0, 0.5];

        let i = currents(&PLACEHOLDER, &v, &n, &var);
        let d = state_derivatives(&PLACEHOLDER, &v, &n, &var, &bounds);
        for k in 0..v.len() {
            assert_eq!(i[k].to_bits(), current(&PLACEHOLDER, v[k], n[k], &var).to_bits());
            assert_eq!(
                d[k].to_bits(),
                state_derivative(&PLACEHOLDER, v[k], n[k], &var, &bounds).to_bits()
            );
        }
    }

    #[test]
    fn test_length_mismatch_truncates() {
        let var = Variability::default();
        let bounds = StateBounds::default();
        assert_eq!(currents(&PLACEHOLDER, &[0.1, 0.2, 0.3], &[1.0], &var).len(), 1);
        assert_eq!(state_derivatives(&PLACEHOLDER, &[0.1], &[1.0, 2.0], &var, &bounds).len(), 1);
        assert!(currents(&PLACEHOLDER, &[], &[1.0], &var).is_empty());
    }

    #[test]
    fn test_fixed_argument_helpers() {
        let var = Variability::default();
        let bounds = StateBounds::default();
        let sweep: Vec<f64> = (0..=20).map(|k| -1.0 + 0.1 * k as f64).collect();
        let trace = currents_at_state(&PLACEHOLDER, &sweep, 1.0, &var);
        assert_eq!(trace.len(), sweep.len());
        assert!(trace[0] < 0.0 && trace[20] > 0.0);

        let rates = state_derivatives_at_voltage(&PLACEHOLDER, -1.0, &[0.01, 50.0, 1.0], &var, &bounds);
        assert!(rates[0] > 0.0);
        assert!(rates[1].is_nan());
        assert!(rates[2] > rates[0]);
    }
}
