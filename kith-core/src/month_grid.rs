//! Month grid construction for calendar views.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::{KithError, KithResult};

/// A displayed month, padded to full weeks starting on Sunday.
///
/// Cells outside the month are `None`, mirroring the empty leading and
/// trailing cells of a calendar page. The cell count is always a
/// multiple of seven.
#[derive(Debug, Clone)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    cells: Vec<Option<NaiveDate>>,
}

impl MonthGrid {
    pub fn new(year: i32, month: u32) -> KithResult<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| KithError::InvalidDate(format!("{}-{:02}", year, month)))?;

        let lead = first.weekday().num_days_from_sunday() as i64;
        let days_in_month = days_in_month(year, month) as i64;
        let total = (lead + days_in_month).div_ceil(7) * 7;

        let cells = (0..total)
            .map(|i| {
                let day = i - lead;
                if (0..days_in_month).contains(&day) {
                    Some(first + Duration::days(day))
                } else {
                    None
                }
            })
            .collect();

        Ok(MonthGrid { year, month, cells })
    }

    /// All cells, including the empty padding cells.
    pub fn cells(&self) -> &[Option<NaiveDate>] {
        &self.cells
    }

    /// Rows of seven cells, for rendering.
    pub fn weeks(&self) -> impl Iterator<Item = &[Option<NaiveDate>]> {
        self.cells.chunks(7)
    }

    /// The month's dates in order, without padding.
    pub fn days(&self) -> Vec<NaiveDate> {
        self.cells.iter().flatten().copied().collect()
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("validated by caller");
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("first of month is always valid");
    (next - first).num_days() as u32
}

/// Parse YYYY-MM into (year, month).
pub fn parse_month(s: &str) -> KithResult<(i32, u32)> {
    let parsed = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
        .map_err(|_| KithError::InvalidDate(format!("'{}'. Expected YYYY-MM", s)))?;
    Ok((parsed.year(), parsed.month()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn test_march_2024_grid_shape() {
        // March 1st 2024 is a Friday: five leading pads, 31 days, six pads after
        let grid = MonthGrid::new(2024, 3).unwrap();

        assert_eq!(grid.cells().len(), 42, "should pad to six full weeks");
        assert!(grid.cells()[..5].iter().all(Option::is_none));
        assert_eq!(
            grid.cells()[5],
            Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(
            grid.cells()[35],
            Some(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap())
        );
        assert!(grid.cells()[36..].iter().all(Option::is_none));
    }

    #[test]
    fn test_days_are_contiguous_and_complete() {
        let grid = MonthGrid::new(2024, 2).unwrap();
        let days = grid.days();

        assert_eq!(days.len(), 29, "2024 is a leap year");
        for pair in days.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::days(1));
        }
    }

    #[test]
    fn test_grid_starts_weeks_on_sunday() {
        let grid = MonthGrid::new(2024, 9).unwrap();
        // September 1st 2024 is a Sunday: no leading pads
        assert_eq!(
            grid.cells()[0],
            Some(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap())
        );
        assert_eq!(grid.days()[0].weekday(), Weekday::Sun);
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(MonthGrid::new(2024, 13).is_err());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2024-03").unwrap(), (2024, 3));
        assert!(parse_month("2024-3-x").is_err());
        assert!(parse_month("march").is_err());
    }
}
