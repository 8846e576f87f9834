//! Applied-voltage stimulus V(t).
//!
//! Four families:
//!
//!   DC      V(t) = A
//!   trig    +V_p ramp up and back over 2 t_p, then V_n ramp out and back over 2 t_n
//!   square  low for delay, linear rise, high for width, linear fall, low for wait
//!   sin     V(t) = offset + A sin(2 pi t / T + phi0)
//!
//! The periodic families reduce t into [0, period) with `rem_euclid`, so
//! samples at t and t + k*period agree. Negative times continue the periodic
//! extension; they do not extrapolate the first ramp backwards as a
//! sign-preserving remainder would. Segment boundaries are closed on the left
//! segment: V(t_p) is exactly V_p.

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WaveformError {
    #[error("{family} waveform selected but `{param}` is missing")]
    MissingParameter {
        family: Family,
        param: &'static str,
    },
    #[error("unknown waveform family `{0}` (expected DC, trig, square or sin)")]
    UnknownFamily(String),
    #[error("`{param}` = {value} is not a valid duration")]
    InvalidDuration { param: &'static str, value: f64 },
}

/// Stimulus family tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Constant,
    Triangular,
    Square,
    Sinusoidal,
}

impl Family {
    /// Short name used on the command line and in `from_params`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Constant => "DC",
            Self::Triangular => "trig",
            Self::Square => "square",
            Self::Sinusoidal => "sin",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Family {
    type Err = WaveformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DC" => Ok(Self::Constant),
            "trig" => Ok(Self::Triangular),
            "square" => Ok(Self::Square),
            "sin" => Ok(Self::Sinusoidal),
            other => Err(WaveformError::UnknownFamily(other.to_string())),
        }
    }
}

/// Loose parameter set: every family's parameters, all optional.
///
/// Only the selected family's fields are read. A NaN counts as missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaveformParams {
    pub dc_amplitude: Option<f64>,

    pub tri_positive_peak: Option<f64>,
    pub tri_positive_duration: Option<f64>,
    pub tri_negative_peak: Option<f64>,
    pub tri_negative_duration: Option<f64>,

    pub sq_low: Option<f64>,
    pub sq_high: Option<f64>,
    pub sq_delay: Option<f64>,
    pub sq_rise: Option<f64>,
    pub sq_width: Option<f64>,
    pub sq_fall: Option<f64>,
    pub sq_wait: Option<f64>,

    pub sin_amplitude: Option<f64>,
    pub sin_period: Option<f64>,
    pub sin_phase: Option<f64>,
    pub sin_offset: Option<f64>,
}

fn required(family: Family, param: &'static str, value: Option<f64>) -> Result<f64, WaveformError> {
    match value {
        Some(v) if !v.is_nan() => Ok(v),
        _ => Err(WaveformError::MissingParameter { family, param }),
    }
}

fn positive(param: &'static str, value: f64) -> Result<f64, WaveformError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(WaveformError::InvalidDuration { param, value })
    }
}

fn non_negative(param: &'static str, value: f64) -> Result<f64, WaveformError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(WaveformError::InvalidDuration { param, value })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Shape {
    Constant {
        amplitude: f64,
    },
    Triangular {
        positive_peak: f64,
        positive_duration: f64,
        negative_peak: f64,
        negative_duration: f64,
    },
    Square {
        low: f64,
        high: f64,
        delay: f64,
        rise: f64,
        width: f64,
        fall: f64,
        wait: f64,
    },
    Sinusoidal {
        amplitude: f64,
        period: f64,
        phase: f64,
        offset: f64,
    },
}

/// Immutable voltage stimulus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waveform {
    shape: Shape,
}

impl Waveform {
    pub fn constant(amplitude: f64) -> Self {
        log::debug!("waveform: DC {amplitude} V");
        Self {
            shape: Shape::Constant { amplitude },
        }
    }

    /// Ramp 0 -> `positive_peak` -> 0 over 2 `positive_duration`, then
    /// 0 -> `negative_peak` -> 0 over 2 `negative_duration`.
    ///
    /// The names follow the first and second half-cycle; either peak may
    /// carry either sign. One half may have zero duration for a single-polarity
    /// sweep, but not both.
    pub fn triangular(
        positive_peak: f64,
        positive_duration: f64,
        negative_peak: f64,
        negative_duration: f64,
    ) -> Result<Self, WaveformError> {
        let positive_duration = non_negative("tri_positive_duration", positive_duration)?;
        let negative_duration = non_negative("tri_negative_duration", negative_duration)?;
        positive("period", 2.0 * positive_duration + 2.0 * negative_duration)?;
        log::debug!(
            "waveform: trig {positive_peak} V / {positive_duration} s, {negative_peak} V / {negative_duration} s"
        );
        Ok(Self {
            shape: Shape::Triangular {
                positive_peak,
                positive_duration,
                negative_peak,
                negative_duration,
            },
        })
    }

    /// Trapezoidal pulse train. Zero-length ramps give a true square edge;
    /// the whole period must still be positive.
    pub fn square(
        low: f64,
        high: f64,
        delay: f64,
        rise: f64,
        width: f64,
        fall: f64,
        wait: f64,
    ) -> Result<Self, WaveformError> {
        let delay = non_negative("sq_delay", delay)?;
        let rise = non_negative("sq_rise", rise)?;
        let width = non_negative("sq_width", width)?;
        let fall = non_negative("sq_fall", fall)?;
        let wait = non_negative("sq_wait", wait)?;
        positive("period", delay + rise + width + fall + wait)?;
        log::debug!(
            "waveform: square {low}..{high} V, d={delay} r={rise} w={width} f={fall} wait={wait} s"
        );
        Ok(Self {
            shape: Shape::Square {
                low,
                high,
                delay,
                rise,
                width,
                fall,
                wait,
            },
        })
    }

    /// `offset + amplitude * sin(2 pi t / period + initial_phase)`.
    pub fn sinusoidal(
        amplitude: f64,
        period: f64,
        initial_phase: f64,
        offset: f64,
    ) -> Result<Self, WaveformError> {
        let period = positive("sin_period", period)?;
        log::debug!("waveform: sin {amplitude} V, T={period} s, phi0={initial_phase}, offset={offset} V");
        Ok(Self {
            shape: Shape::Sinusoidal {
                amplitude,
                period,
                phase: initial_phase,
                offset,
            },
        })
    }

    /// Build from a family name and a loose parameter set.
    ///
    /// Missing parameters are reported in the order the family declares them.
    pub fn from_params(family: &str, p: &WaveformParams) -> Result<Self, WaveformError> {
        let fam: Family = family.parse()?;
        match fam {
            Family::Constant => Ok(Self::constant(required(fam, "dc_amplitude", p.dc_amplitude)?)),
            Family::Triangular => Self::triangular(
                required(fam, "tri_positive_peak", p.tri_positive_peak)?,
                required(fam, "tri_positive_duration", p.tri_positive_duration)?,
                required(fam, "tri_negative_peak", p.tri_negative_peak)?,
                required(fam, "tri_negative_duration", p.tri_negative_duration)?,
            ),
            Family::Square => Self::square(
                required(fam, "sq_low", p.sq_low)?,
                required(fam, "sq_high", p.sq_high)?,
                required(fam, "sq_delay", p.sq_delay)?,
                required(fam, "sq_rise", p.sq_rise)?,
                required(fam, "sq_width", p.sq_width)?,
                required(fam, "sq_fall", p.sq_fall)?,
                required(fam, "sq_wait", p.sq_wait)?,
            ),
            Family::Sinusoidal => Self::sinusoidal(
                required(fam, "sin_amplitude", p.sin_amplitude)?,
                required(fam, "sin_period", p.sin_period)?,
                required(fam, "sin_phase", p.sin_phase)?,
                required(fam, "sin_offset", p.sin_offset)?,
            ),
        }
    }

    pub fn family(&self) -> Family {
        match self.shape {
            Shape::Constant { .. } => Family::Constant,
            Shape::Triangular { .. } => Family::Triangular,
            Shape::Square { .. } => Family::Square,
            Shape::Sinusoidal { .. } => Family::Sinusoidal,
        }
    }

    /// Repetition period (s), `None` for DC.
    pub fn period(&self) -> Option<f64> {
        match self.shape {
            Shape::Constant { .. } => None,
            Shape::Triangular {
                positive_duration,
                negative_duration,
                ..
            } => Some(2.0 * positive_duration + 2.0 * negative_duration),
            Shape::Square {
                delay,
                rise,
                width,
                fall,
                wait,
                ..
            } => Some(delay + rise + width + fall + wait),
            Shape::Sinusoidal { period, .. } => Some(period),
        }
    }

    /// Voltage (V) at time `t` (s).
    pub fn voltage_at(&self, t: f64) -> f64 {
        match self.shape {
            Shape::Constant { amplitude } => amplitude,

            Shape::Triangular {
                positive_peak: vp,
                positive_duration: tp,
                negative_peak: vn,
                negative_duration: tn,
            } => {
                let tm = t.rem_euclid(2.0 * tp + 2.0 * tn);
                // A zero-length half is skipped entirely
                if tp > 0.0 && tm <= tp {
                    vp * (tm / tp)
                } else if tp > 0.0 && tm <= 2.0 * tp {
                    2.0 * vp - vp * (tm / tp)
                } else if tm <= 2.0 * tp + tn {
                    vn * ((tm - 2.0 * tp) / tn)
                } else {
                    2.0 * vn - vn * ((tm - 2.0 * tp) / tn)
                }
            }

            Shape::Square {
                low,
                high,
                delay,
                rise,
                width,
                fall,
                wait,
            } => {
                let tm = t.rem_euclid(delay + rise + width + fall + wait);
                let rise_end = delay + rise;
                let high_end = rise_end + width;
                let fall_end = high_end + fall;
                // A zero-length ramp is never selected: its start test already matched
                if tm <= delay {
                    low
                } else if tm <= rise_end {
                    low + (high - low) * (tm - delay) / rise
                } else if tm <= high_end {
                    high
                } else if tm <= fall_end {
                    high - (high - low) * (tm - high_end) / fall
                } else {
                    low
                }
            }

            Shape::Sinusoidal {
                amplitude,
                period,
                phase,
                offset,
            } => amplitude * (TAU * t / period + phase).sin() + offset,
        }
    }

    /// One voltage per time, in input order.
    pub fn sample(&self, times: &[f64]) -> Vec<f64> {
        times.iter().map(|&t| self.voltage_at(t)).collect()
    }
}
