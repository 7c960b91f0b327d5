//! Calendar-day regularisation of observation sequences.

use chrono::Duration;

use super::observation::Observation;

/// Average observations sharing a date. Input must be sorted by date.
pub fn aggregate_daily(observations: &[Observation]) -> Vec<Observation> {
    let mut out: Vec<Observation> = Vec::with_capacity(observations.len());
    let mut count = 0usize;
    for obs in observations {
        match out.last_mut() {
            Some(last) if last.date == obs.date => {
                count += 1;
                last.price += (obs.price - last.price) / count as f64;
            }
            _ => {
                out.push(*obs);
                count = 1;
            }
        }
    }
    out
}

/// Insert linearly interpolated observations for missing calendar days.
/// Input must be sorted with unique dates.
pub fn fill_missing_days(observations: &[Observation]) -> Vec<Observation> {
    let mut out = Vec::with_capacity(observations.len());
    for pair in observations.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        out.push(a);
        let gap = (b.date - a.date).num_days();
        for k in 1..gap {
            let frac = k as f64 / gap as f64;
            out.push(Observation::new(
                a.date + Duration::days(k),
                a.price + (b.price - a.price) * frac,
            ));
        }
    }
    if let Some(last) = observations.last() {
        out.push(*last);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn obs(day: u32, price: f64) -> Observation {
        Observation::new(NaiveDate::from_ymd_opt(2024, 5, day).unwrap(), price)
    }

    #[test]
    fn same_day_prices_are_averaged() {
        let out = aggregate_daily(&[obs(1, 10.0), obs(1, 20.0), obs(1, 30.0), obs(2, 5.0)]);
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0].price, 20.0, epsilon = 1e-12);
        assert_relative_eq!(out[1].price, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn gaps_are_interpolated() {
        let out = fill_missing_days(&[obs(1, 10.0), obs(4, 16.0)]);
        assert_eq!(out.len(), 4);
        assert_relative_eq!(out[1].price, 12.0, epsilon = 1e-12);
        assert_relative_eq!(out[2].price, 14.0, epsilon = 1e-12);
        assert_eq!(out[3].date, NaiveDate::from_ymd_opt(2024, 5, 4).unwrap());
    }

    #[test]
    fn single_observation_passes_through() {
        assert_eq!(fill_missing_days(&[obs(1, 3.0)]), vec![obs(1, 3.0)]);
        assert!(fill_missing_days(&[]).is_empty());
    }
}
