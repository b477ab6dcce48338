//! Exponential Moving Average indicator.
//!
//! k = 2/(span+1), seeded with the first value (no warmup), then
//! EMA[i] = V[i]*k + EMA[i-1]*(1-k). Defined from index 0.

pub fn calculate_ema(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 || values.is_empty() {
        return Vec::new();
    }

    let k = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = values[0];
    out.push(ema);

    for &value in &values[1..] {
        ema = value * k + ema * (1.0 - k);
        out.push(ema);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ema_seeded_with_first_value() {
        let series = calculate_ema(&[10.0, 20.0, 30.0], 3);
        assert_eq!(series.len(), 3);
        assert_relative_eq!(series[0], 10.0);
    }

    #[test]
    fn ema_recursive_calculation() {
        let series = calculate_ema(&[10.0, 20.0, 30.0, 40.0], 3);
        let k = 0.5;

        let e1 = 20.0 * k + 10.0 * (1.0 - k);
        let e2 = 30.0 * k + e1 * (1.0 - k);
        let e3 = 40.0 * k + e2 * (1.0 - k);

        assert_relative_eq!(series[1], e1);
        assert_relative_eq!(series[2], e2);
        assert_relative_eq!(series[3], e3);
    }

    #[test]
    fn ema_span_1_tracks_input() {
        let series = calculate_ema(&[10.0, 20.0, 30.0], 1);
        assert_eq!(series, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn ema_flat_input_stays_flat() {
        let series = calculate_ema(&[100.0; 6], 9);
        for v in series {
            assert_relative_eq!(v, 100.0);
        }
    }

    #[test]
    fn ema_shorter_span_reacts_faster() {
        let prices = [100.0, 100.0, 100.0, 110.0];
        let fast = calculate_ema(&prices, 3);
        let slow = calculate_ema(&prices, 10);
        assert!(fast[3] > slow[3]);
    }

    #[test]
    fn ema_empty_values() {
        assert!(calculate_ema(&[], 3).is_empty());
    }

    #[test]
    fn ema_span_0() {
        assert!(calculate_ema(&[10.0, 20.0], 0).is_empty());
    }
}
