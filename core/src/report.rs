//! Plain-text report of a transit search.
//!
//! The layout is a pair of tab-separated tables, one for dips and one for
//! planets, each preceded by a count line.  Numbers use a "general" format
//! with six significant digits: fixed notation with trailing zeros removed
//! for moderate magnitudes, `d.dddddE+XX` otherwise.  Durations are shown in
//! hours.

use std::fmt;

use crate::types::{Dip, Planet};

const HOURS_PER_DAY: f64 = 24.0;

/// Significant digits in report numbers.
const SIG_DIGITS: i32 = 6;

/// Format `value` with six significant digits.
///
/// Decimal exponents in `-4..6` print in fixed notation, anything else in
/// scientific notation with a signed, zero-padded two-digit exponent.
pub fn format_g6(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞" } else { "-∞" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round once in scientific form so the exponent reflects any carry
    // (999999.5 -> 1.00000e6).
    let sci = format!("{:.*e}", (SIG_DIGITS - 1) as usize, value);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return sci;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= SIG_DIGITS {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}E{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (SIG_DIGITS - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

/// Renders dips and planets as the two-table text report.
pub struct Report<'a> {
    dips: &'a [Dip],
    planets: &'a [Planet],
}

impl<'a> Report<'a> {
    pub fn new(dips: &'a [Dip], planets: &'a [Planet]) -> Self {
        Self { dips, planets }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dips\t{}", self.dips.len())?;
        if !self.dips.is_empty() {
            writeln!(f, "\nStart_d\tDur_h\tDepth\tPlanet")?;
        }
        for dip in self.dips {
            writeln!(
                f,
                "{}\t{}\t{}\t{}",
                format_g6(dip.start),
                format_g6(dip.duration * HOURS_PER_DAY),
                format_g6(dip.depth),
                format_g6(f64::from(dip.planet)),
            )?;
        }

        writeln!(f, "\nPlanets\t{}", self.planets.len())?;
        if !self.planets.is_empty() {
            writeln!(f, "\nPer_d\tDur_h\tTransits\tDepth")?;
        }
        for planet in self.planets {
            writeln!(
                f,
                "{}\t{}\t{}\t{}",
                format_g6(planet.period),
                format_g6(planet.duration * HOURS_PER_DAY),
                planet.transits,
                format_g6(planet.depth),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn g6_fixed_notation() {
        assert_eq!(format_g6(0.0), "0");
        assert_eq!(format_g6(1.0), "1");
        assert_eq!(format_g6(131.51234567), "131.512");
        assert_eq!(format_g6(-2.5), "-2.5");
        assert_eq!(format_g6(0.0123456789), "0.0123457");
        assert_eq!(format_g6(123456.4), "123456");
        assert_eq!(format_g6(0.0001234), "0.0001234");
    }

    #[test]
    fn g6_scientific_notation() {
        assert_eq!(format_g6(1234567.0), "1.23457E+06");
        assert_eq!(format_g6(0.00001234), "1.234E-05");
        assert_eq!(format_g6(999999.5), "1E+06");
        assert_eq!(format_g6(-3.0e-9), "-3E-09");
        assert_eq!(format_g6(6.02214076e23), "6.02214E+23");
        assert_eq!(format_g6(1.5e200), "1.5E+200");
    }

    #[test]
    fn g6_special_values() {
        assert_eq!(format_g6(f64::NAN), "NaN");
        assert_eq!(format_g6(f64::INFINITY), "∞");
        assert_eq!(format_g6(f64::NEG_INFINITY), "-∞");
    }

    #[test]
    fn empty_report_omits_table_headers() {
        let text = Report::new(&[], &[]).to_string();
        assert_eq!(text, "Dips\t0\n\nPlanets\t0\n");
    }

    #[test]
    fn report_lists_dips_and_planets() {
        let mut dip = Dip::new(131.5, 0.25, 0.0123);
        dip.planet = 1;
        let planet = Planet::new(3.5224991, 0.25, 3, 0.0123);
        let text = Report::new(&[dip], &[planet]).to_string();

        let expected = "Dips\t1\n\
                        \n\
                        Start_d\tDur_h\tDepth\tPlanet\n\
                        131.5\t6\t0.0123\t1\n\
                        \n\
                        Planets\t1\n\
                        \n\
                        Per_d\tDur_h\tTransits\tDepth\n\
                        3.5225\t6\t3\t0.0123\n";
        assert_eq!(text, expected);
    }
}
