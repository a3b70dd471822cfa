//! Sliding-window shaping for scalar feed series.
//!
//! Readers always see exactly N records: short upstream responses are
//! padded at the front with the oldest available sample (or a feed
//! sentinel), long ones are truncated keeping the most recent N.

/// Fit `values` to exactly `n` entries.
///
/// Padding repeats the oldest sample; an empty input is filled with
/// `sentinel` clones.
pub fn fit_window<T: Clone>(values: &[T], n: usize, sentinel: T) -> Vec<T> {
    let mut out: Vec<T> = if values.len() > n {
        values[values.len() - n..].to_vec()
    } else {
        values.to_vec()
    };
    if out.len() < n {
        let pad = out.first().cloned().unwrap_or(sentinel);
        let mut padded = vec![pad; n - out.len()];
        padded.extend(out);
        out = padded;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_keeping_most_recent() {
        let v: Vec<u32> = (0..100).collect();
        let w = fit_window(&v, 31, 0);
        assert_eq!(w.len(), 31);
        assert_eq!(w[0], 69);
        assert_eq!(w[30], 99);
    }

    #[test]
    fn pads_front_with_oldest() {
        let w = fit_window(&[5.0, 6.0], 4, 0.0);
        assert_eq!(w, vec![5.0, 5.0, 5.0, 6.0]);
    }

    #[test]
    fn empty_input_uses_sentinel() {
        let w: Vec<&str> = fit_window(&[], 3, "0");
        assert_eq!(w, vec!["0", "0", "0"]);
    }

    #[test]
    fn exact_length_is_identity() {
        let v = vec![1, 2, 3];
        assert_eq!(fit_window(&v, 3, 0), v);
    }
}
