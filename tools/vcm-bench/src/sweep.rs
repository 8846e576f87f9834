//! Switching sweep: integrate the state equation under a stimulus and record
//! V, I, N at every accepted step.
//!
//! The default stimulus is the classic JART characterization loop: a
//! triangular sweep to -1.3 V (SET) and back, then to +1.3 V (RESET) and back,
//! at 1 V/s.

use jart_vcm::batch;
use jart_vcm::{DeviceState, Memristor, ModelConstants, Waveform, WaveformError};

use crate::ode::{self, SolveError, SolverParams};

/// Filament radii of the variability corners (m).
pub const CORNER_RADII: [f64; 3] = [40.5e-9, 45e-9, 49.5e-9];
/// Disc lengths of the variability corners (nm).
pub const CORNER_LENGTHS: [f64; 3] = [0.36, 0.4, 0.44];

/// All nine (radius, length) corner pairs, radius-major.
pub fn corners() -> Vec<(f64, f64)> {
    CORNER_RADII
        .iter()
        .flat_map(|&r| CORNER_LENGTHS.iter().map(move |&l| (r, l)))
        .collect()
}

/// Triangular sweep with the SET half-cycle first.
pub fn demo_waveform(amplitude: f64, half_period: f64) -> Result<Waveform, WaveformError> {
    Waveform::triangular(-amplitude, half_period, amplitude, half_period)
}

/// Accepted points of one integrated sweep.
#[derive(Debug, Clone)]
pub struct Trace {
    pub time: Vec<f64>,
    pub voltage: Vec<f64>,
    pub current: Vec<f64>,
    pub state: Vec<f64>,
    pub radius: f64,
    pub length: f64,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
}

impl Trace {
    /// CSV rows with header `time,Vm,Im,Nd,rd,ld`.
    pub fn csv_lines(&self, with_header: bool) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.time.len() + 1);
        if with_header {
            lines.push("time,Vm,Im,Nd,rd,ld".to_string());
        }
        for i in 0..self.time.len() {
            lines.push(format!(
                "{:e},{:e},{:e},{:e},{:e},{}",
                self.time[i], self.voltage[i], self.current[i], self.state[i], self.radius, self.length
            ));
        }
        lines
    }

    pub fn max_state(&self) -> f64 {
        self.state.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn final_state(&self) -> f64 {
        self.state.last().copied().unwrap_or(f64::NAN)
    }
}

/// Integrate `device` under `waveform` over [0, duration].
pub fn run(
    constants: &ModelConstants,
    device: DeviceState,
    waveform: &Waveform,
    duration: f64,
    rtol: f64,
) -> Result<Trace, SolveError> {
    let params = SolverParams {
        rtol,
        ..SolverParams::for_span(duration)
    };
    let var = device.variability();
    let mut mem = Memristor::new(constants, device);
    let y0 = mem.state();

    let sol = ode::solve(|t, y| mem.derivative(t, y, waveform), 0.0, duration, y0, &params)?;

    let voltage = waveform.sample(&sol.t);
    let current = batch::currents(constants, &voltage, &sol.y, &var);
    Ok(Trace {
        time: sol.t,
        voltage,
        current,
        state: sol.y,
        radius: var.radius(),
        length: var.length(),
        accepted_steps: sol.accepted_steps,
        rejected_steps: sol.rejected_steps,
    })
}

/// Applied voltages at which the state first crosses `threshold` upward (SET)
/// and then back downward (RESET).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Switching {
    pub set_voltage: Option<f64>,
    pub reset_voltage: Option<f64>,
}

pub fn switching_voltages(trace: &Trace, threshold: f64) -> Switching {
    let mut set_voltage = None;
    let mut reset_voltage = None;
    for i in 1..trace.state.len() {
        let (prev, next) = (trace.state[i - 1], trace.state[i]);
        if set_voltage.is_none() {
            if prev <= threshold && next > threshold {
                set_voltage = Some(trace.voltage[i]);
            }
        } else if prev >= threshold && next < threshold {
            reset_voltage = Some(trace.voltage[i]);
            break;
        }
    }
    Switching {
        set_voltage,
        reset_voltage,
    }
}
