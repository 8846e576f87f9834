/// Explicit current equation I = f(V, N, r, l).
///
/// Both polarities share one closed form in x = ln(N / N_ref):
///
///   I = p1 * (p2 * (exp((x - p3) / p4) - 1) + (x - p3))          ExpLin
///     + p5 / (p6 + p7 * (p8 * exp(x - p9))^(-p10))^(1 / p11)      generalized logistic
///
/// The eleven shape parameters p1..p11 depend on V through rational,
/// exponential and sigmoid expressions, and on the variability parameters
/// through the fitted coefficients in `constants`. The negative branch uses
/// both terms; the positive branch zeroes the ExpLin term.
///
/// The two branches are separate fits and do not meet at V = 0: the positive
/// branch gives exactly 0 A there, the negative branch tends to 0 only as V -> 0-.
///
/// N <= 0 returns NaN instead of failing. Solvers probe non-physical trial
/// states and rely on NaN to reject the step. Likewise a negative base under
/// a fractional power comes out as NaN from `powf`.

use crate::constants::{Deviation, ModelConstants, NegativeFit, PositiveFit};
use crate::device::Variability;

/// Voltage-dependent shape parameters of the current equation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParameters {
    pub p1: f64,
    pub p2: f64,
    pub p3: f64,
    pub p4: f64,
    pub p5: f64,
    pub p6: f64,
    pub p7: f64,
    pub p8: f64,
    pub p9: f64,
    pub p10: f64,
    pub p11: f64,
}

impl ShapeParameters {
    /// Combine into a current for x = ln(N / N_ref).
    #[inline]
    pub fn evaluate(&self, x: f64) -> f64 {
        let exp_lin = self.p1 * (self.p2 * (((x - self.p3) / self.p4).exp() - 1.0) + (x - self.p3));
        let base = self.p8 * (x - self.p9).exp();
        let logistic = self.p5 / (self.p6 + self.p7 * base.powf(-self.p10)).powf(1.0 / self.p11);
        exp_lin + logistic
    }
}

/// Device current (A).
pub fn current(c: &ModelConstants, voltage: f64, state: f64, var: &Variability) -> f64 {
    if state.is_nan() || state <= 0.0 {
        return f64::NAN;
    }
    let shape = shape_parameters(c, voltage, var);
    shape.evaluate((state / c.nominal.reference_concentration).ln())
}

/// Shape parameters for the branch selected by the sign of `voltage`.
pub fn shape_parameters(c: &ModelConstants, voltage: f64, var: &Variability) -> ShapeParameters {
    let d = c.nominal.deviation(var.radius(), var.length());
    if voltage < 0.0 {
        negative_branch(&c.negative, voltage, d)
    } else {
        positive_branch(&c.positive, voltage, d)
    }
}

/// Logistic step in V: `lo` above `center`, `hi` below, transition `width`.
#[inline]
fn sigmoid(v: f64, lo: f64, hi: f64, center: f64, width: f64) -> f64 {
    lo + (hi - lo) / (1.0 + ((v - center) / width).exp())
}

fn negative_branch(fit: &NegativeFit, v: f64, d: Deviation) -> ShapeParameters {
    let v2 = v * v;

    let p1_0 = fit.p1_0.at(d);
    let p1_1 = fit.p1_1.at(d);
    let p1_2 = fit.p1_2.at(d);
    let p1_3 = fit.p1_3.at(d);
    let p1_4 = fit.p1_4.at(d);

    let p3_0 = fit.p3_0.at(d);
    let p3_1 = fit.p3_1.at(d);

    let p4_0 = fit.p4_0.at(d);
    let p4_1 = fit.p4_1.at(d);
    let p4_2 = fit.p4_2.at(d);

    // p5_0 is zero for this branch
    let p5_1 = fit.p5_1.at(d);
    let p5_2 = fit.p5_2.at(d);

    let p9 = sigmoid(v, fit.p9_0.at(d), fit.p9_1.at(d), fit.p9_2.at(d), fit.p9_3.at(d));
    let p10 = sigmoid(v, fit.p10_0.at(d), fit.p10_1.at(d), fit.p10_2.at(d), fit.p10_3.at(d));
    let inv_p11 = sigmoid(v, fit.p11_0.at(d), fit.p11_1.at(d), fit.p11_2.at(d), fit.p11_3.at(d));

    ShapeParameters {
        p1: p1_0 * (p1_1 * v + p1_2 * v2) / (1.0 + p1_3 * v + p1_4 * v2),
        p2: fit.p2_0.at(d),
        p3: p3_0 + p3_1 * v,
        p4: p4_0 - p4_1 * (-p4_2 * v).exp(),
        p5: p5_1 * v + p5_2 * v2,
        p6: 1.0,
        p7: fit.p7_0.at(d),
        p8: 1.0,
        p9,
        p10,
        p11: 1.0 / inv_p11,
    }
}

fn positive_branch(fit: &PositiveFit, v: f64, d: Deviation) -> ShapeParameters {
    let v2 = v * v;

    let p5_1 = fit.p5_1.at(d);
    let p5_2 = fit.p5_2.at(d);

    let p6_0 = fit.p6_0.at(d);
    let p6_1 = fit.p6_1.at(d);

    let p7_0 = fit.p7_0.at(d);
    let p7_1 = fit.p7_1.at(d);
    let p7_2 = fit.p7_2.at(d);
    let p7_3 = fit.p7_3.at(d);

    let p8_0 = fit.p8_0.at(d);
    let p8_1 = fit.p8_1.at(d);

    let p10_0 = fit.p10_0.at(d);
    let p10_1 = fit.p10_1.at(d);
    let p10_2 = fit.p10_2.at(d);

    let p11_0 = fit.p11_0.at(d);
    let p11_1 = fit.p11_1.at(d);
    let p11_2 = fit.p11_2.at(d);

    ShapeParameters {
        p1: 0.0,
        p2: 0.0,
        p3: 0.0,
        p4: 1.0,
        // p5_0 == p5_1: saturating rise from 0 A at V = 0
        p5: p5_1 - p5_1 * (-p5_2 * v).exp(),
        p6: p6_0 + p6_1 * v,
        p7: p7_0 + p7_1 * v + p7_2 * (-p7_3 * v).exp(),
        p8: p8_0 + p8_1 * v,
        p9: 0.0,
        p10: p10_0 + p10_1 * v + p10_2 * v2,
        p11: p11_0 + p11_1 * v + p11_2 * v2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PLACEHOLDER;

    fn nominal() -> Variability {
        Variability::new(45e-9, 0.4).unwrap()
    }

    fn corners() -> Vec<Variability> {
        let mut v = Vec::new();
        for &r in &[40.5e-9, 45e-9, 49.5e-9] {
            for &l in &[0.36, 0.4, 0.44] {
                v.push(Variability::new(r, l).unwrap());
            }
        }
        v
    }

    #[test]
    fn test_non_positive_state_is_nan() {
        let var = nominal();
        for &v in &[-1.3, -0.2, 0.0, 0.4, 1.3] {
            for &n in &[0.0, -1e-12, -5.0, f64::NAN] {
                let i = current(&PLACEHOLDER, v, n, &var);
                assert!(i.is_nan(), "I({v}, {n}) should be NaN, got {i}");
            }
        }
    }

    #[test]
    fn test_current_sign_follows_voltage() {
        for var in corners() {
            for &n in &[4e-3, 0.01, 0.1, 1.0, 5.0, 20.0, 22.0] {
                for &v in &[-1.3, -1.0, -0.5, -0.05] {
                    let i = current(&PLACEHOLDER, v, n, &var);
                    assert!(i < 0.0 && i.is_finite(), "I({v}, {n}) = {i} for {var:?}");
                }
                for &v in &[0.05, 0.5, 1.0, 1.3] {
                    let i = current(&PLACEHOLDER, v, n, &var);
                    assert!(i > 0.0 && i.is_finite(), "I({v}, {n}) = {i} for {var:?}");
                }
            }
        }
    }

    #[test]
    fn test_current_grows_with_state() {
        let var = nominal();
        for &v in &[-1.0, -0.3, 0.3, 1.0] {
            let mut prev = 0.0;
            for &n in &[4e-3, 0.01, 0.1, 1.0, 5.0, 20.0] {
                let i = current(&PLACEHOLDER, v, n, &var).abs();
                assert!(i > prev, "|I| not increasing at V={v}, N={n}: {i} <= {prev}");
                prev = i;
            }
        }
    }

    #[test]
    fn test_lrs_hrs_window() {
        // Read at +/-0.5 V: LRS (N=20) vs HRS (N=0.01)
        let var = nominal();
        for &v in &[-0.5, 0.5] {
            let lrs = current(&PLACEHOLDER, v, 20.0, &var).abs();
            let hrs = current(&PLACEHOLDER, v, 0.01, &var).abs();
            let ratio = lrs / hrs;
            assert!(ratio > 50.0, "on/off ratio at {v} V too small: {ratio:.1}");
            assert!(lrs > 1e-4 && lrs < 1e-3, "LRS current at {v} V: {lrs:e}");
        }
    }

    #[test]
    fn test_positive_branch_zero_at_origin() {
        for var in corners() {
            let i = current(&PLACEHOLDER, 0.0, 1.0, &var);
            assert_eq!(i, 0.0, "positive branch at V=0 for {var:?}");
        }
    }

    #[test]
    fn test_branch_gap_at_zero_is_small_but_documented() {
        // The fits are independent; approaching 0 from either side both tend
        // to zero current, but the slopes differ. Record the gap rather than
        // asserting continuity.
        let var = nominal();
        for &n in &[0.01, 1.0, 20.0] {
            let below = current(&PLACEHOLDER, -1e-9, n, &var);
            let above = current(&PLACEHOLDER, 0.0, n, &var);
            assert!(below <= 0.0 && above == 0.0);
            assert!((below - above).abs() < 1e-9, "gap at N={n}: {below:e} vs {above:e}");

            let slope_neg = current(&PLACEHOLDER, -1e-3, n, &var) / -1e-3;
            let slope_pos = current(&PLACEHOLDER, 1e-3, n, &var) / 1e-3;
            assert!(slope_neg > 0.0 && slope_pos > 0.0);
            assert!(
                (slope_neg / slope_pos - 1.0).abs() > 1e-3,
                "conductance at 0- and 0+ unexpectedly identical at N={n}"
            );
        }
    }

    #[test]
    fn test_variability_shifts_current() {
        // Wider filament conducts more in LRS
        let thin = Variability::new(40.5e-9, 0.4).unwrap();
        let wide = Variability::new(49.5e-9, 0.4).unwrap();
        for &v in &[-1.0, 1.0] {
            let i_thin = current(&PLACEHOLDER, v, 20.0, &thin).abs();
            let i_wide = current(&PLACEHOLDER, v, 20.0, &wide).abs();
            assert!(i_wide > i_thin, "V={v}: wide {i_wide:e} <= thin {i_thin:e}");
        }
    }

    #[test]
    fn test_negative_power_base_propagates_nan() {
        // Force p8 < 0 so the generalized-logistic base goes negative
        let mut c = PLACEHOLDER;
        c.positive.p8_0.nominal = -1.0;
        let i = current(&c, 0.5, 1.0, &nominal());
        assert!(i.is_nan(), "expected NaN, got {i}");
    }

    #[test]
    fn test_negative_sigmoids_saturate() {
        let var = nominal();
        let low = shape_parameters(&PLACEHOLDER, -1e-6, &var);
        let high = shape_parameters(&PLACEHOLDER, -5.0, &var);
        assert!((low.p9 - 5.5).abs() < 1e-2, "p9 near 0 V: {}", low.p9);
        assert!((high.p9 - 6.5).abs() < 1e-6, "p9 at -5 V: {}", high.p9);
        assert!((low.p11 - 1.0).abs() < 1e-2, "p11 near 0 V: {}", low.p11);
        assert!((high.p11 - 1.0 / 0.8).abs() < 1e-6, "p11 at -5 V: {}", high.p11);
    }
}
