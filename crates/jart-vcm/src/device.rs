//! Per-device state: the state variable N_disc, its bounds, and the two
//! variability parameters (filament radius, disc length).
//!
//! Every value is range-checked when it is written. Out-of-range bounds or
//! variability parameters are configuration errors. The state variable gets a
//! relative tolerance of 1e-8 on both bounds because it is written from inside
//! an ODE solver, which can overshoot a bound by a rounding error.
//!
//! `Memristor` is the owning wrapper: it pairs a `DeviceState` with a borrowed
//! constant table and commits each trial state the solver hands it.

use thiserror::Error;

use crate::constants::ModelConstants;
use crate::waveform::Waveform;
use crate::{current, derivative};

/// Hard limits for N_disc,min (1e26 m^-3).
pub const STATE_MIN_RANGE: (f64, f64) = (4e-3, 25e-2);
/// Hard limits for N_disc,max (1e26 m^-3).
pub const STATE_MAX_RANGE: (f64, f64) = (18.0, 22.0);
/// Filament radius band: 45 nm +/- 10 % (m).
pub const RADIUS_RANGE: (f64, f64) = (40.5e-9, 49.5e-9);
/// Disc length band: 0.4 nm +/- 10 % (nm).
pub const LENGTH_RANGE: (f64, f64) = (0.36, 0.44);
/// Relative slack on the state bounds for solver overshoot.
pub const STATE_TOLERANCE: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    #[error("{field} = {value:e} is outside its physical range [{min:e}, {max:e}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

fn check(field: &'static str, value: f64, (min, max): (f64, f64)) -> Result<f64, DeviceError> {
    // NaN fails the containment test too
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(DeviceError::OutOfRange { field, value, min, max })
    }
}

/// Device-to-device variability parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Variability {
    radius: f64,
    length: f64,
}

impl Variability {
    /// `radius` in metres, `length` in nanometres.
    pub fn new(radius: f64, length: f64) -> Result<Self, DeviceError> {
        Ok(Self {
            radius: check("radius", radius, RADIUS_RANGE)?,
            length: check("length", length, LENGTH_RANGE)?,
        })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn length(&self) -> f64 {
        self.length
    }
}

impl Default for Variability {
    fn default() -> Self {
        Self { radius: 45e-9, length: 0.4 }
    }
}

/// Lower and upper bound of the state variable for one device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateBounds {
    min: f64,
    max: f64,
}

impl StateBounds {
    pub fn new(min: f64, max: f64) -> Result<Self, DeviceError> {
        Ok(Self {
            min: check("state_min", min, STATE_MIN_RANGE)?,
            max: check("state_max", max, STATE_MAX_RANGE)?,
        })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Tolerance-padded range a trial state must fall in.
    pub fn padded(&self) -> (f64, f64) {
        (self.min * (1.0 - STATE_TOLERANCE), self.max * (1.0 + STATE_TOLERANCE))
    }

    /// True if `state` is inside the padded range (false for NaN).
    pub fn admits(&self, state: f64) -> bool {
        let (lo, hi) = self.padded();
        (lo..=hi).contains(&state)
    }
}

impl Default for StateBounds {
    fn default() -> Self {
        Self { min: 8e-3, max: 20.0 }
    }
}

/// Validated per-device record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceState {
    state: f64,
    bounds: StateBounds,
    variability: Variability,
}

impl DeviceState {
    /// Validation order: bounds, then the initial state against them, then
    /// radius and length. The first failure is reported.
    pub fn new(
        initial_state: f64,
        state_min: f64,
        state_max: f64,
        radius: f64,
        length: f64,
    ) -> Result<Self, DeviceError> {
        let bounds = StateBounds::new(state_min, state_max)?;
        let state = check("state", initial_state, bounds.padded())?;
        let variability = Variability::new(radius, length)?;
        log::debug!(
            "device: N={state:e} bounds=[{state_min:e}, {state_max:e}] r={radius:e} m l={length} nm"
        );
        Ok(Self { state, bounds, variability })
    }

    pub fn from_parts(
        initial_state: f64,
        bounds: StateBounds,
        variability: Variability,
    ) -> Result<Self, DeviceError> {
        let state = check("state", initial_state, bounds.padded())?;
        Ok(Self { state, bounds, variability })
    }

    pub fn state(&self) -> f64 {
        self.state
    }

    /// Overwrite the state variable. Rejects values outside the padded bounds.
    pub fn set_state(&mut self, value: f64) -> Result<(), DeviceError> {
        self.state = check("state", value, self.bounds.padded())?;
        Ok(())
    }

    pub fn bounds(&self) -> StateBounds {
        self.bounds
    }

    pub fn variability(&self) -> Variability {
        self.variability
    }
}

impl Default for DeviceState {
    /// Near-HRS device at nominal variability.
    fn default() -> Self {
        Self {
            state: 0.010,
            bounds: StateBounds::default(),
            variability: Variability::default(),
        }
    }
}

/// A device that owns its state and evaluates the model against it.
///
/// Not shareable between concurrent integrations: `derivative` takes
/// `&mut self` because it commits the trial state.
#[derive(Debug, Clone)]
pub struct Memristor<'c> {
    constants: &'c ModelConstants,
    device: DeviceState,
}

impl<'c> Memristor<'c> {
    pub fn new(constants: &'c ModelConstants, device: DeviceState) -> Self {
        Self { constants, device }
    }

    pub fn device(&self) -> &DeviceState {
        &self.device
    }

    pub fn state(&self) -> f64 {
        self.device.state
    }

    pub fn set_state(&mut self, value: f64) -> Result<(), DeviceError> {
        self.device.set_state(value)
    }

    /// Device current (A) at `voltage` for the committed state.
    pub fn current(&self, voltage: f64) -> f64 {
        current::current(self.constants, voltage, self.device.state, &self.device.variability)
    }

    /// ODE right-hand side dN/dt at time `t` for trial state `y`.
    ///
    /// Returns NaN, without touching the committed state, if `y` is outside
    /// the padded bounds. Otherwise `y` becomes the committed state.
    pub fn derivative(&mut self, t: f64, y: f64, waveform: &Waveform) -> f64 {
        if self.device.set_state(y).is_err() {
            log::trace!("trial state {y:e} rejected at t={t}");
            return f64::NAN;
        }
        let voltage = waveform.voltage_at(t);
        derivative::state_derivative(
            self.constants,
            voltage,
            self.device.state,
            &self.device.variability,
            &self.device.bounds,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PLACEHOLDER;

    #[test]
    fn test_bounds_checked_in_order() {
        let err = DeviceState::new(0.01, 1e-3, 30.0, 1.0, 1.0).unwrap_err();
        let DeviceError::OutOfRange { field, .. } = err;
        assert_eq!(field, "state_min");

        let err = DeviceState::new(0.01, 4e-3, 30.0, 45e-9, 0.4).unwrap_err();
        let DeviceError::OutOfRange { field, .. } = err;
        assert_eq!(field, "state_max");

        let err = DeviceState::new(0.01, 4e-3, 22.0, 50e-9, 0.4).unwrap_err();
        let DeviceError::OutOfRange { field, value, .. } = err;
        assert_eq!(field, "radius");
        assert_eq!(value, 50e-9);

        let err = DeviceState::new(0.01, 4e-3, 22.0, 45e-9, 0.3).unwrap_err();
        let DeviceError::OutOfRange { field, .. } = err;
        assert_eq!(field, "length");
    }

    #[test]
    fn test_range_edges_are_inclusive() {
        assert!(StateBounds::new(4e-3, 18.0).is_ok());
        assert!(StateBounds::new(25e-2, 22.0).is_ok());
        assert!(Variability::new(40.5e-9, 0.36).is_ok());
        assert!(Variability::new(49.5e-9, 0.44).is_ok());
    }

    #[test]
    fn test_nan_parameters_rejected() {
        assert!(Variability::new(f64::NAN, 0.4).is_err());
        assert!(StateBounds::new(8e-3, f64::NAN).is_err());
        let mut dev = DeviceState::default();
        assert!(dev.set_state(f64::NAN).is_err());
    }

    #[test]
    fn test_state_tolerance_absorbs_overshoot() {
        let mut dev = DeviceState::new(0.01, 4e-3, 22.0, 45e-9, 0.4).unwrap();
        assert!(dev.set_state(22.0 * (1.0 + 0.5e-8)).is_ok());
        assert!(dev.set_state(4e-3 * (1.0 - 0.5e-8)).is_ok());
        assert!(dev.set_state(22.0 * (1.0 + 2e-8)).is_err());
        assert!(dev.set_state(4e-3 * (1.0 - 2e-8)).is_err());
        // A rejected write leaves the previous value in place
        assert_eq!(dev.state(), 4e-3 * (1.0 - 0.5e-8));
    }

    #[test]
    fn test_initial_state_outside_bounds() {
        let err = DeviceState::new(25.0, 4e-3, 22.0, 45e-9, 0.4).unwrap_err();
        let DeviceError::OutOfRange { field, .. } = err;
        assert_eq!(field, "state");
    }

    #[test]
    fn test_error_message_names_field() {
        let err = Variability::new(45e-9, 0.5).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("length"), "unexpected message: {msg}");
    }

    #[test]
    fn test_default_device() {
        let dev = DeviceState::default();
        assert_eq!(dev.state(), 0.010);
        assert_eq!(dev.bounds().min(), 8e-3);
        assert_eq!(dev.bounds().max(), 20.0);
        assert_eq!(dev.variability(), Variability::new(45e-9, 0.4).unwrap());
    }

    #[test]
    fn test_derivative_rejects_without_commit() {
        let wave = Waveform::constant(-1.0);
        let dev = DeviceState::new(0.01, 4e-3, 22.0, 45e-9, 0.4).unwrap();
        let mut mem = Memristor::new(&PLACEHOLDER, dev);

        assert!(mem.derivative(0.0, 30.0, &wave).is_nan());
        assert_eq!(mem.state(), 0.01);

        let rate = mem.derivative(0.0, 0.5, &wave);
        assert!(rate.is_finite(), "rate at N=0.5: {rate}");
        assert_eq!(mem.state(), 0.5);
    }

    #[test]
    fn test_owning_and_stateless_agree() {
        let wave = Waveform::sinusoidal(1.1, 2.0, 0.3, 0.0).unwrap();
        let dev = DeviceState::new(0.2, 4e-3, 22.0, 42e-9, 0.41).unwrap();
        let mut mem = Memristor::new(&PLACEHOLDER, dev);

        for &t in &[0.0, 0.4, 0.9, 1.7] {
            let owned = mem.derivative(t, 0.2, &wave);
            let free = derivative::derivative_at(
                &PLACEHOLDER,
                t,
                0.2,
                &dev.variability(),
                &dev.bounds(),
                &wave,
            );
            assert_eq!(owned.to_bits(), free.to_bits(), "t={t}");
            let v = wave.voltage_at(t);
            assert_eq!(
                mem.current(v).to_bits(),
                current::current(&PLACEHOLDER, v, 0.2, &dev.variability()).to_bits()
            );
        }
    }
}
