//! Exogenous features: temperatures, calendar fields and holidays.
//!
//! The builder never touches its input series; it derives new, named columns
//! and returns them as separate blocks that the pipeline concatenates with the
//! load column.
//!
//! Alignment: the feature matrix pairs load at `t` with exogenous values at
//! `t + 1`, so both shifted blocks start at the second row of the series.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use nalgebra::DMatrix;

use crate::domain::{HOURS_PER_DAY, LoadSeries, N_TEMPERATURE, TARGET_COLUMN};
use crate::error::AppError;

/// Fixed-date holidays observed in the New England area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Holiday {
    NewYearsDay,
    IndependenceDay,
    VeteransDay,
    Christmas,
}

impl Holiday {
    pub const ALL: [Holiday; 4] = [
        Holiday::NewYearsDay,
        Holiday::IndependenceDay,
        Holiday::VeteransDay,
        Holiday::Christmas,
    ];

    /// `(day, month)` of the holiday; the same every year.
    pub fn day_month(self) -> (u32, u32) {
        match self {
            Holiday::NewYearsDay => (1, 1),
            Holiday::IndependenceDay => (4, 7),
            Holiday::VeteransDay => (11, 11),
            Holiday::Christmas => (25, 12),
        }
    }

    pub fn on(date: NaiveDate) -> Option<Holiday> {
        let key = (date.day(), date.month());
        Self::ALL.into_iter().find(|h| h.day_month() == key)
    }
}

pub fn is_holiday(date: NaiveDate) -> bool {
    Holiday::on(date).is_some()
}

/// Calendar fields derived from a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub holiday: bool,
}

impl CalendarFields {
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            holiday: is_holiday(dt.date()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CalendarField {
    Year,
    Month,
    Day,
    Hour,
    Holiday,
}

impl CalendarField {
    fn name(self) -> &'static str {
        match self {
            CalendarField::Year => "year",
            CalendarField::Month => "month",
            CalendarField::Day => "day",
            CalendarField::Hour => "hour",
            CalendarField::Holiday => "holiday",
        }
    }

    fn value(self, f: &CalendarFields) -> i64 {
        match self {
            CalendarField::Year => i64::from(f.year),
            CalendarField::Month => i64::from(f.month),
            CalendarField::Day => i64::from(f.day),
            CalendarField::Hour => i64::from(f.hour),
            CalendarField::Holiday => i64::from(f.holiday),
        }
    }
}

/// Named one-hot columns for every known calendar category.
///
/// Years span the observed range; the other fields use their full domain so
/// the layout does not depend on which values happen to occur.
#[derive(Debug, Clone)]
struct OneHotLayout {
    columns: Vec<(CalendarField, i64)>,
}

impl OneHotLayout {
    fn for_years(first: i32, last: i32) -> Self {
        let mut columns = Vec::new();
        columns.extend((first..=last).map(|y| (CalendarField::Year, i64::from(y))));
        columns.extend((1..=12).map(|m| (CalendarField::Month, m)));
        columns.extend((1..=31).map(|d| (CalendarField::Day, d)));
        columns.extend((0..HOURS_PER_DAY as i64).map(|h| (CalendarField::Hour, h)));
        columns.extend((0..=1).map(|v| (CalendarField::Holiday, v)));
        Self { columns }
    }

    fn names(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|(field, v)| format!("{}_{v}", field.name()))
            .collect()
    }

    fn encode(&self, rows: &[CalendarFields]) -> DMatrix<f64> {
        DMatrix::from_fn(rows.len(), self.columns.len(), |i, j| {
            let (field, v) = self.columns[j];
            if field.value(&rows[i]) == v { 1.0 } else { 0.0 }
        })
    }
}

/// A matrix plus the names of its columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBlock {
    pub columns: Vec<String>,
    pub values: DMatrix<f64>,
}

impl FeatureBlock {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Copy of the named columns, in the requested order.
    pub fn select(&self, names: &[&str]) -> Result<FeatureBlock, AppError> {
        let idx = names
            .iter()
            .map(|n| {
                self.column_index(n)
                    .ok_or_else(|| AppError::data(format!("Unknown feature column `{n}`")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FeatureBlock {
            columns: names.iter().map(|n| n.to_string()).collect(),
            values: self.values.select_columns(&idx),
        })
    }
}

/// Temperature and calendar blocks produced by [`add_exogenous_variables`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExogenousBlocks {
    pub temperature: FeatureBlock,
    pub calendar: FeatureBlock,
}

/// Temperature column names `w1`..`w25`.
pub fn temperature_columns() -> Vec<String> {
    (1..=N_TEMPERATURE).map(|i| format!("w{i}")).collect()
}

/// Build the exogenous feature blocks for `series`.
///
/// - `temperature`: `w1..w25`, shifted by one row.
/// - `calendar` with `one_hot = true`: `year_*`, `month_*`, `day_*`, `hour_*`,
///   `holiday_*` indicator columns, shifted by one row.
/// - `calendar` with `one_hot = false`: the unshifted augmented table
///   (`LOAD`, `w1..w25`, `year`, `month`, `day`, `hour`, `holiday`).
pub fn add_exogenous_variables(series: &LoadSeries, one_hot: bool) -> Result<ExogenousBlocks, AppError> {
    let records = series.records();
    if records.is_empty() {
        return Err(AppError::data("Cannot build exogenous features for an empty series."));
    }
    let shifted = &records[1..];

    let temperature = FeatureBlock {
        columns: temperature_columns(),
        values: DMatrix::from_fn(shifted.len(), N_TEMPERATURE, |i, j| shifted[i].temperatures[j]),
    };

    let fields: Vec<CalendarFields> = records
        .iter()
        .map(|r| CalendarFields::from_datetime(r.datetime))
        .collect();

    let calendar = if one_hot {
        // Records are time-sorted, so the first and last rows bound the years.
        let first = fields[0].year;
        let last = fields[fields.len() - 1].year;
        let layout = OneHotLayout::for_years(first, last);
        FeatureBlock {
            columns: layout.names(),
            values: layout.encode(&fields[1..]),
        }
    } else {
        let mut columns = vec![TARGET_COLUMN.to_string()];
        columns.extend(temperature_columns());
        columns.extend(["year", "month", "day", "hour", "holiday"].map(String::from));

        let width = columns.len();
        let values = DMatrix::from_fn(records.len(), width, |i, j| {
            let (r, f) = (&records[i], &fields[i]);
            match j {
                0 => r.load,
                j if j <= N_TEMPERATURE => r.temperatures[j - 1],
                j => match j - N_TEMPERATURE - 1 {
                    0 => f64::from(f.year),
                    1 => f64::from(f.month),
                    2 => f64::from(f.day),
                    3 => f64::from(f.hour),
                    _ => f64::from(u8::from(f.holiday)),
                },
            }
        });
        FeatureBlock { columns, values }
    };

    Ok(ExogenousBlocks { temperature, calendar })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LoadRecord;
    use chrono::Duration;

    fn hourly_series(start: NaiveDateTime, n: usize) -> LoadSeries {
        let records = (0..n)
            .map(|i| {
                let mut temperatures = [0.0; N_TEMPERATURE];
                for (k, t) in temperatures.iter_mut().enumerate() {
                    *t = (i * 100 + k) as f64;
                }
                LoadRecord {
                    datetime: start + Duration::hours(i as i64),
                    load: i as f64,
                    temperatures,
                }
            })
            .collect();
        LoadSeries::new(records).unwrap()
    }

    #[test]
    fn holiday_flags_match_exactly_four_dates_across_years() {
        let mut day = NaiveDate::from_ymd_opt(2004, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2007, 12, 31).unwrap();
        let mut flagged = Vec::new();
        while day <= end {
            if is_holiday(day) {
                flagged.push((day.day(), day.month()));
            }
            day = day.succ_opt().unwrap();
        }
        assert_eq!(flagged.len(), 4 * 4);
        for dm in flagged {
            assert!(matches!(dm, (1, 1) | (4, 7) | (11, 11) | (25, 12)), "{dm:?}");
        }
    }

    #[test]
    fn one_hot_block_is_shifted_and_named() {
        let start = NaiveDate::from_ymd_opt(2005, 12, 31).unwrap().and_hms_opt(22, 0, 0).unwrap();
        let s = hourly_series(start, 4);
        let blocks = add_exogenous_variables(&s, true).unwrap();

        assert_eq!(blocks.temperature.values.nrows(), 3);
        assert_eq!(blocks.temperature.values[(0, 0)], 100.0);
        assert_eq!(blocks.temperature.columns[24], "w25");

        let cal = &blocks.calendar;
        // 2 years + 12 months + 31 days + 24 hours + 2 holiday states.
        assert_eq!(cal.columns.len(), 2 + 12 + 31 + 24 + 2);
        assert_eq!(cal.values.nrows(), 3);

        // Row 0 of the block is the series' second row: 2005-12-31 23:00.
        let picked = cal
            .select(&["year_2005", "month_12", "day_31", "hour_23", "holiday_0", "holiday_1"])
            .unwrap();
        assert_eq!(picked.values.row(0).iter().copied().collect::<Vec<_>>(), vec![1.0, 1.0, 1.0, 1.0, 1.0, 0.0]);

        // Row 1 is New Year's Day, 00:00.
        let picked = cal.select(&["year_2006", "day_1", "hour_0", "holiday_1"]).unwrap();
        assert!(picked.values.row(1).iter().all(|v| *v == 1.0));

        // Exactly one indicator per field per row.
        for row in cal.values.row_iter() {
            assert_eq!(row.iter().sum::<f64>(), 5.0);
        }
    }

    #[test]
    fn raw_block_keeps_all_rows_and_fields() {
        let start = NaiveDate::from_ymd_opt(2008, 7, 4).unwrap().and_hms_opt(5, 0, 0).unwrap();
        let s = hourly_series(start, 3);
        let blocks = add_exogenous_variables(&s, false).unwrap();
        let cal = &blocks.calendar;
        assert_eq!(cal.values.nrows(), 3);
        assert_eq!(cal.columns.len(), 1 + N_TEMPERATURE + 5);

        let row = cal.select(&["LOAD", "w2", "year", "month", "day", "hour", "holiday"]).unwrap();
        let values: Vec<f64> = row.values.row(2).iter().copied().collect();
        assert_eq!(values, vec![2.0, 201.0, 2008.0, 7.0, 4.0, 7.0, 1.0]);
    }

    #[test]
    fn input_series_is_not_mutated() {
        let start = NaiveDate::from_ymd_opt(2005, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let s = hourly_series(start, 5);
        let before = s.clone();
        let _ = add_exogenous_variables(&s, true).unwrap();
        assert_eq!(s, before);
    }

    #[test]
    fn unknown_column_selection_fails() {
        let start = NaiveDate::from_ymd_opt(2005, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let blocks = add_exogenous_variables(&hourly_series(start, 2), true).unwrap();
        assert!(blocks.calendar.select(&["minute_0"]).is_err());
    }
}
