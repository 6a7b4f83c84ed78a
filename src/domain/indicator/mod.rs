//! Single-ticker price analytics: gain/loss, trailing moving average and
//! close-above-average crossovers.
//!
//! All functions read one [`PriceSeries`]. Dates that fall between priced
//! days (weekends, holidays) resolve to the priced date on or before them.

pub mod sma;

use chrono::NaiveDate;

use crate::domain::error::StockfolioError;
use crate::domain::price_series::PriceSeries;

/// Close on `recent` minus close on `initial`.
pub fn gain_loss(
    series: &PriceSeries,
    recent: NaiveDate,
    initial: NaiveDate,
) -> Result<f64, StockfolioError> {
    Ok(series.price_on(recent)? - series.price_on(initial)?)
}

/// Mean of the `window` closes ending at `date` inclusive.
pub fn moving_average(
    series: &PriceSeries,
    date: NaiveDate,
    window: usize,
) -> Result<f64, StockfolioError> {
    if window == 0 {
        return Err(StockfolioError::InvalidWindow { window });
    }
    let end = series.index_within_range(date)?;
    let have = end + 1;
    if have < window {
        return Err(StockfolioError::InsufficientHistory {
            ticker: series.ticker.clone(),
            date,
            have,
            need: window,
        });
    }

    let sum: f64 = series.points()[have - window..have]
        .iter()
        .map(|p| p.close)
        .sum();
    Ok(sum / window as f64)
}

/// Priced dates in `[start, end]` whose close is strictly above their own
/// trailing `window`-day average. Dates without a full window are skipped.
pub fn find_crossovers(
    series: &PriceSeries,
    start: NaiveDate,
    end: NaiveDate,
    window: usize,
) -> Result<Vec<NaiveDate>, StockfolioError> {
    if window == 0 {
        return Err(StockfolioError::InvalidWindow { window });
    }
    if end < start {
        return Err(StockfolioError::InvalidDate {
            date: end.to_string(),
            reason: format!("end date is before start date {start}"),
        });
    }

    let averages = sma::trailing_sma(series.points(), window);
    let crossovers = series
        .points()
        .iter()
        .zip(averages)
        .filter(|(point, _)| point.date >= start && point.date <= end)
        .filter_map(|(point, avg)| match avg {
            Some(avg) if point.close > avg => Some(point.date),
            _ => None,
        })
        .collect();
    Ok(crossovers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price_series::PricePoint;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn series_from(closes: &[f64]) -> PriceSeries {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint::new(d(2023, 1, 2 + i as u32), close))
            .collect();
        PriceSeries::new("AAA", points)
    }

    #[test]
    fn gain_loss_between_dates() {
        let series = series_from(&[100.0, 102.0, 99.0, 110.0]);
        let gl = gain_loss(&series, d(2023, 1, 5), d(2023, 1, 2)).unwrap();
        assert!((gl - 10.0).abs() < 1e-12);
        let gl = gain_loss(&series, d(2023, 1, 4), d(2023, 1, 3)).unwrap();
        assert!((gl - (-3.0)).abs() < 1e-12);
    }

    #[test]
    fn gain_loss_before_history_fails() {
        let series = series_from(&[100.0, 102.0]);
        assert!(matches!(
            gain_loss(&series, d(2023, 1, 3), d(2022, 12, 1)),
            Err(StockfolioError::NoPriceData { .. })
        ));
    }

    #[test]
    fn moving_average_includes_date() {
        let series = series_from(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let avg = moving_average(&series, d(2023, 1, 6), 3).unwrap();
        assert!((avg - 40.0).abs() < 1e-12);
    }

    #[test]
    fn moving_average_full_history() {
        let series = series_from(&[10.0, 20.0, 30.0]);
        let avg = moving_average(&series, d(2023, 1, 4), 3).unwrap();
        assert!((avg - 20.0).abs() < 1e-12);
    }

    #[test]
    fn moving_average_not_enough_samples() {
        let series = series_from(&[10.0, 20.0, 30.0]);
        let err = moving_average(&series, d(2023, 1, 3), 3).unwrap_err();
        assert!(matches!(
            err,
            StockfolioError::InsufficientHistory { have: 2, need: 3, .. }
        ));
    }

    #[test]
    fn moving_average_zero_window() {
        let series = series_from(&[10.0]);
        assert!(matches!(
            moving_average(&series, d(2023, 1, 2), 0),
            Err(StockfolioError::InvalidWindow { window: 0 })
        ));
    }

    #[test]
    fn moving_average_outside_range() {
        let series = series_from(&[10.0, 20.0]);
        assert!(matches!(
            moving_average(&series, d(2023, 2, 1), 1),
            Err(StockfolioError::InvalidDate { .. })
        ));
    }

    #[test]
    fn crossovers_flat_series_is_empty() {
        let series = series_from(&[50.0; 5]);
        let result = find_crossovers(&series, d(2023, 1, 2), d(2023, 1, 6), 3).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn crossovers_rising_series_flags_full_windows() {
        let series = series_from(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = find_crossovers(&series, d(2023, 1, 2), d(2023, 1, 6), 3).unwrap();
        assert_eq!(result, vec![d(2023, 1, 4), d(2023, 1, 5), d(2023, 1, 6)]);
    }

    #[test]
    fn crossovers_use_no_future_data() {
        // The spike on the last day must not influence earlier dates.
        let series = series_from(&[10.0, 10.0, 10.0, 9.0, 100.0]);
        let result = find_crossovers(&series, d(2023, 1, 2), d(2023, 1, 6), 2).unwrap();
        assert_eq!(result, vec![d(2023, 1, 6)]);
    }

    #[test]
    fn crossovers_respect_range() {
        let series = series_from(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let result = find_crossovers(&series, d(2023, 1, 5), d(2023, 1, 5), 2).unwrap();
        assert_eq!(result, vec![d(2023, 1, 5)]);
    }

    #[test]
    fn crossovers_reversed_range_fails() {
        let series = series_from(&[10.0, 11.0]);
        assert!(matches!(
            find_crossovers(&series, d(2023, 1, 3), d(2023, 1, 2), 1),
            Err(StockfolioError::InvalidDate { .. })
        ));
    }
}
