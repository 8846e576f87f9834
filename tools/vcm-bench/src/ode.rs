/// Adaptive Dormand–Prince 5(4) integrator for a scalar ODE y' = f(t, y).
///
/// Step error is |y5 - y4| / (atol + rtol * max(|y|, |y5|)); a step is
/// accepted when that ratio is <= 1. The stage-7 derivative is reused as the
/// first stage of the next step (FSAL).
///
/// A non-finite stage derivative rejects the step and quarters h. The JART
/// state equation returns NaN for trial states outside the device bounds, so
/// this is how the solver backs off a boundary it overshot.

use thiserror::Error;

// ─── Butcher tableau ────────────────────────────────────────────────────────

const C: [f64; 7] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];

const A: [[f64; 6]; 7] = [
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0, 0.0],
    [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0, 0.0],
    [35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0],
];

/// 5th-order weights (equal to the last row of A).
const B5: [f64; 7] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
    0.0,
];

/// Embedded 4th-order weights.
const B4: [f64; 7] = [
    5179.0 / 57600.0,
    0.0,
    7571.0 / 16695.0,
    393.0 / 640.0,
    -92097.0 / 339200.0,
    187.0 / 2100.0,
    1.0 / 40.0,
];

// ─── Controller ─────────────────────────────────────────────────────────────

const SAFETY: f64 = 0.9;
const MAX_GROWTH: f64 = 5.0;
const MAX_SHRINK: f64 = 0.2;
const NAN_SHRINK: f64 = 0.25;

/// Step-size control parameters.
#[derive(Debug, Clone)]
pub struct SolverParams {
    /// Relative tolerance.
    pub rtol: f64,
    /// Absolute tolerance.
    pub atol: f64,
    /// Initial step (s). `None`: 1e-3 of the span.
    pub h_init: Option<f64>,
    /// Step below which the solve is abandoned (s).
    pub h_min: f64,
    /// Largest step (s).
    pub h_max: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-12,
            h_init: None,
            h_min: 1e-18,
            h_max: f64::INFINITY,
        }
    }
}

impl SolverParams {
    /// Defaults with at least 1000 steps over `span`.
    pub fn for_span(span: f64) -> Self {
        Self {
            h_max: span / 1000.0,
            ..Default::default()
        }
    }
}

/// Accepted points plus step statistics.
#[derive(Debug, Clone)]
pub struct Solution {
    pub t: Vec<f64>,
    pub y: Vec<f64>,
    pub accepted_steps: usize,
    /// Rejections from the error test plus non-finite stages.
    pub rejected_steps: usize,
    pub min_step_used: f64,
    pub max_step_used: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("integration span [{t0}, {t1}] is empty or not finite")]
    InvalidSpan { t0: f64, t1: f64 },
    #[error("derivative is not finite at the initial point (t = {t}, y = {y:e})")]
    NonFiniteStart { t: f64, y: f64 },
    #[error("step size underflow at t = {t} (h = {h:e})")]
    StepUnderflow { t: f64, h: f64 },
}

/// Integrate y' = f(t, y) from (t0, y0) to t1.
pub fn solve<F>(mut f: F, t0: f64, t1: f64, y0: f64, params: &SolverParams) -> Result<Solution, SolveError>
where
    F: FnMut(f64, f64) -> f64,
{
    if !(t0.is_finite() && t1.is_finite() && t1 > t0) {
        return Err(SolveError::InvalidSpan { t0, t1 });
    }

    let mut t = t0;
    let mut y = y0;
    let mut k1 = f(t, y);
    if !k1.is_finite() {
        return Err(SolveError::NonFiniteStart { t, y });
    }

    let mut sol = Solution {
        t: vec![t0],
        y: vec![y0],
        accepted_steps: 0,
        rejected_steps: 0,
        min_step_used: f64::INFINITY,
        max_step_used: 0.0,
    };

    let mut h = params.h_init.unwrap_or((t1 - t0) * 1e-3).min(params.h_max);

    while t < t1 {
        h = h.min(t1 - t).min(params.h_max);

        let mut k = [0.0; 7];
        k[0] = k1;
        for s in 1..7 {
            let mut acc = 0.0;
            for j in 0..s {
                acc += A[s][j] * k[j];
            }
            k[s] = f(t + C[s] * h, y + h * acc);
        }

        let mut d5 = 0.0;
        let mut d4 = 0.0;
        for i in 0..7 {
            d5 += B5[i] * k[i];
            d4 += B4[i] * k[i];
        }
        let y5 = y + h * d5;
        let y4 = y + h * d4;

        let scale = params.atol + params.rtol * y.abs().max(y5.abs());
        let err = (y5 - y4).abs() / scale;

        if !err.is_finite() || !y5.is_finite() {
            sol.rejected_steps += 1;
            log::trace!("non-finite stage at t={t} h={h:e}, shrinking");
            h *= NAN_SHRINK;
            if h < params.h_min {
                return Err(SolveError::StepUnderflow { t, h });
            }
            continue;
        }

        if err <= 1.0 {
            let last = h >= t1 - t;
            t = if last { t1 } else { t + h };
            y = y5;
            k1 = k[6];
            sol.t.push(t);
            sol.y.push(y);
            sol.accepted_steps += 1;
            sol.min_step_used = sol.min_step_used.min(h);
            sol.max_step_used = sol.max_step_used.max(h);

            let factor = if err > 0.0 { SAFETY * err.powf(-0.2) } else { MAX_GROWTH };
            h *= factor.clamp(MAX_SHRINK, MAX_GROWTH);
        } else {
            sol.rejected_steps += 1;
            h *= (SAFETY * err.powf(-0.25)).max(MAX_SHRINK);
            if h < params.h_min {
                return Err(SolveError::StepUnderflow { t, h });
            }
        }
    }

    log::debug!(
        "solve: {} accepted, {} rejected, h in [{:e}, {:e}]",
        sol.accepted_steps,
        sol.rejected_steps,
        sol.min_step_used,
        sol.max_step_used
    );
    Ok(sol)
}
