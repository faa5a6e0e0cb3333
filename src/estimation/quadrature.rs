//! estimation::quadrature — globally adaptive Gauss–Kronrod integration.
//!
//! Purpose
//! -------
//! Integrate smooth scalar functions over finite intervals with an error
//! estimate. Used to obtain half-line masses and first moments of a fitted
//! KDE over [-1, 0] and [0, 1].
//!
//! Key behaviors
//! -------------
//! - Apply the 7-point Gauss / 15-point Kronrod pair on each subinterval;
//!   the local error estimate is `|K₁₅ − G₇|`.
//! - Keep a pool of subintervals and repeatedly bisect the one with the
//!   largest error until the total error is within
//!   `max(epsabs, epsrel·|I|)` or the subdivision limit is reached.
//! - Report the estimate, absolute error, number of subintervals and
//!   whether the tolerance was met in a [`QuadOutcome`]; reaching the limit
//!   is *not* an error here. The caller decides how to treat the error.
//!
//! Invariants & assumptions
//! ------------------------
//! - `a <= b` and both are finite; `a == b` yields an exact zero.
//! - The integrand is finite on `[a, b]`.
//!
//! Testing notes
//! -------------
//! - Unit tests integrate polynomials (exact for degree ≤ 22 on one panel),
//!   a narrow Gaussian bump that forces subdivision, and check the
//!   limit/`converged` reporting.

/// Kronrod abscissae on [0, 1] (symmetric about zero); odd indices are the
/// Gauss nodes.
const XGK: [f64; 8] = [
    0.991_455_371_120_812_639_206_854_697_526_329,
    0.949_107_912_342_758_524_526_189_684_047_851,
    0.864_864_423_359_769_072_789_712_788_640_926,
    0.741_531_185_599_394_439_863_864_773_280_788,
    0.586_087_235_467_691_130_294_144_845_693_013,
    0.405_845_151_377_397_166_906_606_412_076_961,
    0.207_784_955_007_898_467_600_689_403_773_245,
    0.0,
];

/// Kronrod weights matching [`XGK`].
const WGK: [f64; 8] = [
    0.022_935_322_010_529_224_963_732_008_058_970,
    0.063_092_092_629_978_553_290_700_663_189_204,
    0.104_790_010_322_250_183_839_876_322_541_518,
    0.140_653_259_715_525_918_745_189_590_510_238,
    0.169_004_726_639_267_902_826_583_426_598_550,
    0.190_350_578_064_785_409_913_256_402_421_014,
    0.204_432_940_075_298_892_414_161_999_234_649,
    0.209_482_141_084_727_828_012_999_174_891_714,
];

/// Gauss weights for `XGK[1]`, `XGK[3]`, `XGK[5]`, `XGK[7]`.
const WG: [f64; 4] = [
    0.129_484_966_168_869_693_270_611_432_679_082,
    0.279_705_391_489_276_667_901_467_771_423_780,
    0.381_830_050_505_118_944_950_369_775_488_975,
    0.417_959_183_673_469_387_755_102_040_816_327,
];

/// QuadOutcome — result of an adaptive integration.
///
/// Fields
/// ------
/// - `value`: integral estimate.
/// - `abs_err`: summed absolute error estimate over all subintervals.
/// - `subintervals`: number of panels in the final partition.
/// - `converged`: whether `abs_err <= max(epsabs, epsrel·|value|)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadOutcome {
    pub value: f64,
    pub abs_err: f64,
    pub subintervals: usize,
    pub converged: bool,
}

impl QuadOutcome {
    /// Relative error `abs_err / |value|`; `0` when both are zero and `∞`
    /// when only the value is zero.
    pub fn rel_err(&self) -> f64 {
        if self.abs_err == 0.0 {
            0.0
        } else if self.value == 0.0 {
            f64::INFINITY
        } else {
            self.abs_err / self.value.abs()
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Panel {
    a: f64,
    b: f64,
    value: f64,
    err: f64,
}

/// Integrate `f` over `[a, b]`.
///
/// Parameters
/// ----------
/// - `epsabs`, `epsrel`: absolute and relative tolerances; the loop stops
///   once the total error is at most `max(epsabs, epsrel·|I|)`.
/// - `limit`: maximum number of subintervals (≥ 1).
///
/// Examples
/// --------
/// ```rust
/// use rust_polarization::estimation::quadrature::integrate;
///
/// let out = integrate(|x| x * x, 0.0, 1.0, 1e-10, 1e-10, 50);
/// assert!((out.value - 1.0 / 3.0).abs() < 1e-12);
/// assert!(out.converged);
/// ```
pub fn integrate<F>(f: F, a: f64, b: f64, epsabs: f64, epsrel: f64, limit: usize) -> QuadOutcome
where
    F: Fn(f64) -> f64,
{
    if a == b {
        return QuadOutcome { value: 0.0, abs_err: 0.0, subintervals: 1, converged: true };
    }

    let limit = limit.max(1);
    let mut panels = vec![gauss_kronrod_15(&f, a, b)];

    loop {
        let value: f64 = panels.iter().map(|p| p.value).sum();
        let abs_err: f64 = panels.iter().map(|p| p.err).sum();
        let tolerance = epsabs.max(epsrel * value.abs());

        if abs_err <= tolerance || panels.len() >= limit {
            return QuadOutcome {
                value,
                abs_err,
                subintervals: panels.len(),
                converged: abs_err <= tolerance,
            };
        }

        let worst = panels
            .iter()
            .enumerate()
            .max_by(|(_, l), (_, r)| l.err.total_cmp(&r.err))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let panel = panels.swap_remove(worst);
        let mid = 0.5 * (panel.a + panel.b);

        // Stop splitting once the midpoint is no longer representable.
        if mid <= panel.a || mid >= panel.b {
            panels.push(panel);
            let value: f64 = panels.iter().map(|p| p.value).sum();
            let abs_err: f64 = panels.iter().map(|p| p.err).sum();
            return QuadOutcome {
                value,
                abs_err,
                subintervals: panels.len(),
                converged: abs_err <= epsabs.max(epsrel * value.abs()),
            };
        }

        panels.push(gauss_kronrod_15(&f, panel.a, mid));
        panels.push(gauss_kronrod_15(&f, mid, panel.b));
    }
}

/// One 7/15-point Gauss–Kronrod panel on `[a, b]`.
fn gauss_kronrod_15<F>(f: &F, a: f64, b: f64) -> Panel
where
    F: Fn(f64) -> f64,
{
    let center = 0.5 * (a + b);
    let half = 0.5 * (b - a);

    let f_center = f(center);
    let mut kronrod = WGK[7] * f_center;
    let mut gauss = WG[3] * f_center;

    for (j, (&x, &w)) in XGK.iter().zip(WGK.iter()).take(7).enumerate() {
        let dx = half * x;
        let pair = f(center - dx) + f(center + dx);
        kronrod += w * pair;
        if j % 2 == 1 {
            gauss += WG[j / 2] * pair;
        }
    }

    Panel { a, b, value: kronrod * half, err: ((kronrod - gauss) * half).abs() }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Exactness on low-degree polynomials with a single panel.
    // - Adaptive subdivision on a sharply peaked integrand.
    // - `converged` / `rel_err` reporting when the limit is hit and for
    //   zero-valued integrals.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that a cubic is integrated exactly on the first panel.
    //
    // Given
    // -----
    // - f(x) = 4x³ − x + 2 on [-1, 0].
    //
    // Expect
    // ------
    // - Value 1.5 to machine precision, one subinterval, converged.
    fn polynomial_is_exact_on_single_panel() {
        // Arrange
        let f = |x: f64| 4.0 * x.powi(3) - x + 2.0;

        // Act
        let out = integrate(f, -1.0, 0.0, 1.49e-8, 1.49e-8, 50);

        // Assert
        assert!((out.value - 1.5).abs() < 1e-14, "value = {}", out.value);
        assert_eq!(out.subintervals, 1);
        assert!(out.converged);
    }

    #[test]
    // Purpose
    // -------
    // Ensure that a narrow Gaussian bump forces subdivision and is still
    // integrated to high accuracy.
    //
    // Given
    // -----
    // - Unnormalized bump exp(−½((x − 0.3)/0.01)²) on [0, 1], whose integral
    //   is 0.01·√(2π) to double precision.
    //
    // Expect
    // ------
    // - More than one subinterval, converged, relative error below 1e-10.
    fn narrow_peak_triggers_subdivision() {
        // Arrange
        let sigma = 0.01;
        let f = |x: f64| (-0.5 * ((x - 0.3) / sigma).powi(2)).exp();
        let exact = sigma * (2.0 * std::f64::consts::PI).sqrt();

        // Act
        let out = integrate(f, 0.0, 1.0, 1e-14, 1e-11, 200);

        // Assert
        assert!(out.subintervals > 1);
        assert!(out.converged);
        assert!(((out.value - exact) / exact).abs() < 1e-10, "value = {}", out.value);
    }

    #[test]
    // Purpose
    // -------
    // Verify that hitting the subdivision limit is reported rather than
    // looping or erroring.
    //
    // Given
    // -----
    // - The same narrow bump, impossible tolerances and `limit = 2`.
    //
    // Expect
    // ------
    // - `subintervals == 2` and `converged == false`.
    fn limit_is_reported_as_not_converged() {
        // Arrange
        let f = |x: f64| (-0.5 * ((x - 0.3) / 0.005).powi(2)).exp();

        // Act
        let out = integrate(f, 0.0, 1.0, 0.0, 0.0, 2);

        // Assert
        assert_eq!(out.subintervals, 2);
        assert!(!out.converged);
        assert!(out.rel_err() > 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Check the degenerate interval and `rel_err` conventions.
    //
    // Given
    // -----
    // - An empty interval [0.5, 0.5].
    //
    // Expect
    // ------
    // - Exact zero value with zero relative error.
    fn empty_interval_yields_zero() {
        // Act
        let out = integrate(|x| x, 0.5, 0.5, 1e-8, 1e-8, 50);

        // Assert
        assert_eq!(out.value, 0.0);
        assert_eq!(out.rel_err(), 0.0);
        assert!(out.converged);
    }
}
