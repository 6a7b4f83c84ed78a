//! Trailing simple moving average.
//!
//! O(n) sliding window: SMA(n)[i] = (P[i-n+1] + ... + P[i]) / n.
//! Warmup: the first (n-1) points have no full window and are `None`.

use crate::domain::price_series::PricePoint;

pub fn trailing_sma(points: &[PricePoint], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; points.len()];
    }

    let mut values = Vec::with_capacity(points.len());
    let mut window_sum = 0.0;

    for (i, point) in points.iter().enumerate() {
        window_sum += point.close;
        if i >= window {
            window_sum -= points[i - window].close;
        }

        if i + 1 >= window {
            values.push(Some(window_sum / window as f64));
        } else {
            values.push(None);
        }
    }

    values
}
