//! JART VCM compact model: simplified, variability-aware valence-change memristor.
//!
//! Pure model math with no integrator. The caller drives the state equation
//! with an ODE solver of its choice; see `tools/vcm-bench` for one.

// Model data
pub mod config;
pub mod constants;
pub mod device;

// Model equations
pub mod batch;
pub mod current;
pub mod derivative;
pub mod model;

// Stimulus
pub mod waveform;

pub use constants::ModelConstants;
pub use device::{DeviceError, DeviceState, Memristor, StateBounds, Variability};
pub use model::VcmModel;
pub use waveform::{Family, Waveform, WaveformError, WaveformParams};
