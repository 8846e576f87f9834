/// Stateless model: the constant table plus pure evaluators.
///
/// State and variability are arguments, so one `VcmModel` can serve any number
/// of devices and concurrent integrations.

use crate::constants::ModelConstants;
use crate::device::{DeviceState, Memristor, StateBounds, Variability};
use crate::waveform::Waveform;
use crate::{current, derivative};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VcmModel {
    constants: ModelConstants,
}

impl VcmModel {
    pub fn new(constants: ModelConstants) -> Self {
        Self { constants }
    }

    pub fn constants(&self) -> &ModelConstants {
        &self.constants
    }

    /// Device current (A).
    pub fn current(&self, voltage: f64, state: f64, var: &Variability) -> f64 {
        current::current(&self.constants, voltage, state, var)
    }

    /// dN/dt at a given voltage.
    pub fn state_derivative(&self, voltage: f64, state: f64, var: &Variability, bounds: &StateBounds) -> f64 {
        derivative::state_derivative(&self.constants, voltage, state, var, bounds)
    }

    /// dN/dt at time `t` under `waveform`.
    pub fn derivative_at(
        &self,
        t: f64,
        state: f64,
        var: &Variability,
        bounds: &StateBounds,
        waveform: &Waveform,
    ) -> f64 {
        derivative::derivative_at(&self.constants, t, state, var, bounds, waveform)
    }

    /// ODE right-hand side `f(t, y)` for one device under `waveform`.
    pub fn rhs<'a>(&'a self, device: DeviceState, waveform: &'a Waveform) -> impl Fn(f64, f64) -> f64 + 'a {
        derivative::ode_rhs(&self.constants, device.variability(), device.bounds(), waveform)
    }

    /// Owning wrapper that commits trial states into `device`.
    pub fn memristor(&self, device: DeviceState) -> Memristor<'_> {
        Memristor::new(&self.constants, device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_model_types_are_send_sync() {
        assert_send_sync::<VcmModel>();
        assert_send_sync::<DeviceState>();
        assert_send_sync::<Waveform>();
        assert_send_sync::<Memristor<'static>>();
    }

    #[test]
    fn test_rhs_matches_owning_wrapper() {
        let model = VcmModel::default();
        let device = DeviceState::new(0.01, 4e-3, 22.0, 45e-9, 0.4).unwrap();
        let wave = Waveform::triangular(-1.3, 1.3, 1.3, 1.3).unwrap();
        let f = model.rhs(device, &wave);
        let mut mem = model.memristor(device);
        for &(t, y) in &[(0.3, 0.01), (1.25, 0.02), (3.8, 20.0), (4.4, 5.0)] {
            assert_eq!(f(t, y).to_bits(), mem.derivative(t, y, &wave).to_bits(), "t={t}");
        }
    }

    #[test]
    fn test_start_of_demo_sweep() {
        let model = VcmModel::default();
        let device = DeviceState::new(0.01, 4e-3, 22.0, 45e-9, 0.4).unwrap();
        let var = device.variability();
        let bounds = device.bounds();
        let wave = Waveform::triangular(-1.3, 1.3, 1.3, 1.3).unwrap();

        // V(0) = 0: positive branch, no current, no drift
        assert_eq!(model.current(wave.voltage_at(0.0), 0.01, &var), 0.0);
        assert_eq!(model.derivative_at(0.0, 0.01, &var, &bounds, &wave), 0.0);

        // Early in the SET half-cycle
        let i = model.current(wave.voltage_at(0.5), 0.01, &var);
        let d = model.derivative_at(0.5, 0.01, &var, &bounds, &wave);
        assert!(i < 0.0 && i.is_finite(), "I = {i}");
        assert!(d > 0.0 && d.is_finite(), "dN/dt = {d}");
    }
}
