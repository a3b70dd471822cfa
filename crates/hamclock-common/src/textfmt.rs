//! Byte-exact numeric formatting for client artifacts.
//!
//! The client parses these files with fixed scanf-style patterns, so the
//! emitted text must match the historical service down to exponent digits
//! and trailing-zero trimming.

/// Scientific notation with a two-digit signed exponent (`1.89e-08`).
///
/// Rust's `{:e}` drops the exponent sign and leading zero; the client
/// expects the printf form.
pub fn sci(v: f64) -> String {
    if v == 0.0 {
        return "0.00e+00".to_string();
    }
    let neg = v < 0.0;
    let a = v.abs();
    let mut exp = a.log10().floor() as i32;
    let mut mant = a / 10f64.powi(exp);
    mant = (mant * 100.0).round() / 100.0;
    if mant >= 10.0 {
        mant /= 10.0;
        exp += 1;
    }
    format!(
        "{}{:.2}e{}{:02}",
        if neg { "-" } else { "" },
        mant,
        if exp < 0 { "-" } else { "+" },
        exp.abs()
    )
}

/// Fixed-point with trailing zeros (and a bare trailing dot) trimmed:
/// `12.50` becomes `12.5`, `3.00` becomes `3`.
pub fn trim_fixed(v: f64, decimals: usize) -> String {
    let s = format!("{v:.decimals$}");
    let s = s.trim_end_matches('0');
    s.trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sci_matches_reference_rows() {
        assert_eq!(sci(1.89e-8), "1.89e-08");
        assert_eq!(sci(6.82e-7), "6.82e-07");
        assert_eq!(sci(1.72e-5), "1.72e-05");
        assert_eq!(sci(0.0), "0.00e+00");
        assert_eq!(sci(2.5), "2.50e+00");
        assert_eq!(sci(9.999e-7), "1.00e-06");
    }

    #[test]
    fn trim_fixed_strips_zeros() {
        assert_eq!(trim_fixed(12.50, 2), "12.5");
        assert_eq!(trim_fixed(3.004, 2), "3");
        assert_eq!(trim_fixed(418.6, 1), "418.6");
        assert_eq!(trim_fixed(400.0, 1), "400");
    }
}
