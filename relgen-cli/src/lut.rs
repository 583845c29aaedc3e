//! Absolute-humidity lookup-table generator.
//!
//! Standalone numeric utility with no ties to the amalgamation engine: it
//! emits the `AH_LUT_100RH` table embedded in the humidity-conversion helper
//! sources, together with the mean interpolation error over a region of
//! interest. Temperatures in °C, relative humidity in %, absolute humidity
//! in g/m^3 (the C table is scaled to mg/m^3).

/// Mathematically correct absolute-humidity computation (Magnus formula).
pub fn calc_ah(t: f64, rh: f64) -> f64 {
    216.7 * ((rh / 100.0 * 6.112 * (17.62 * t / (243.12 + t)).exp()) / (273.15 + t))
}

/// Lookup table at 100 %RH over `t_lo..=t_hi` in `step` °C increments
/// (0..100 %RH scales linearly).
pub fn gen_ah_lut(t_lo: i32, t_hi: i32, step: i32) -> Vec<f64> {
    (t_lo..=t_hi)
        .step_by(step as usize)
        .map(|t| calc_ah(f64::from(t), 100.0))
        .collect()
}

/// Linear interpolation over the table, mirroring the fixed-point C helper.
pub fn ah_lookup(lut: &[f64], t_lo: f64, t_hi: f64, temp: f64, rh: f64) -> f64 {
    if rh == 0.0 {
        return 0.0;
    }

    let t_step = (t_hi - t_lo) / (lut.len() - 1) as f64;
    let t = temp - t_lo;
    let i = (t / t_step) as usize;
    let rem = t % t_step;

    if i >= lut.len() - 1 {
        return lut[lut.len() - 1] * (rh / 100.0);
    }
    if rem == 0.0 {
        return lut[i] * (rh / 100.0);
    }
    (lut[i] + (lut[i + 1] - lut[i]) * rem / t_step) * rh / 100.0
}

/// Mean absolute interpolation error over 1 °C × 1 %RH grid points in the
/// given region of interest.
pub fn mean_abs_error(
    lut: &[f64],
    t_lo: f64,
    t_hi: f64,
    t_range: std::ops::Range<i32>,
    rh_range: std::ops::Range<i32>,
) -> f64 {
    let mut sum = 0.0;
    let mut samples = 0u32;
    for t in t_range {
        for rh in rh_range.clone() {
            let t = f64::from(t);
            let rh = f64::from(rh);
            sum += (calc_ah(t, rh) - ah_lookup(lut, t_lo, t_hi, t, rh)).abs();
            samples += 1;
        }
    }
    if samples == 0 {
        return 0.0;
    }
    sum / f64::from(samples)
}

/// Render the table as the C definitions pasted into the conversion sources,
/// values scaled to mg/m^3.
pub fn render_c_source(t_lo: i32, t_hi: i32, lut: &[f64]) -> String {
    let entries: Vec<String> = lut.iter().map(|ah| format!("{:.0}", ah * 1000.0)).collect();
    format!(
        "#define T_LO ({t_lo})\n#define T_HI ({t_hi})\nstatic const uint32_t AH_LUT_100RH[] = {{{}}};\n",
        entries.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::{ah_lookup, calc_ah, gen_ah_lut, mean_abs_error, render_c_source};

    #[test]
    fn default_table_matches_the_shipped_c_table() {
        let lut = gen_ah_lut(-20, 70, 10);
        let rendered = render_c_source(-20, 70, &lut);
        assert_eq!(
            rendered,
            "#define T_LO (-20)\n#define T_HI (70)\n\
             static const uint32_t AH_LUT_100RH[] = {1078, 2364, 4849, 9383, 17243, 30264, 50983, 82785, 130048, 198277};\n"
        );
    }

    #[test]
    fn lookup_is_exact_on_sampling_points() {
        let lut = gen_ah_lut(-20, 70, 10);
        let exact = calc_ah(20.0, 100.0);
        let interpolated = ah_lookup(&lut, -20.0, 70.0, 20.0, 100.0);
        assert!((exact - interpolated).abs() < 1e-9);
    }

    #[test]
    fn lookup_scales_linearly_in_humidity() {
        let lut = gen_ah_lut(-20, 70, 10);
        let full = ah_lookup(&lut, -20.0, 70.0, 25.0, 100.0);
        let half = ah_lookup(&lut, -20.0, 70.0, 25.0, 50.0);
        assert!((full / 2.0 - half).abs() < 1e-9);
        assert_eq!(ah_lookup(&lut, -20.0, 70.0, 25.0, 0.0), 0.0);
    }

    #[test]
    fn lookup_clamps_above_the_table() {
        let lut = gen_ah_lut(-20, 70, 10);
        let top = lut[lut.len() - 1];
        assert!((ah_lookup(&lut, -20.0, 70.0, 140.0, 100.0) - top).abs() < 1e-9);
    }

    #[test]
    fn interpolation_error_stays_small_in_the_region_of_interest() {
        let lut = gen_ah_lut(-20, 70, 10);
        let err = mean_abs_error(&lut, -20.0, 70.0, -20..45, 20..80);
        assert!(err < 0.1, "mean error {err} g/m^3 too large");
    }
}
