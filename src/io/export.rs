//! Write a cleaned series in the merged `gefcom2014.csv` layout.
//!
//! This is how the output of `load_raw_dataset` (or a synthetic series) becomes
//! input for `load_dataset`.

use std::fs::{File, create_dir_all};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{DATETIME_COLUMN, DATETIME_FORMAT, LoadSeries, TARGET_COLUMN};
use crate::error::AppError;
use crate::prep::temperature_columns;

pub fn write_series_csv(path: &Path, series: &LoadSeries) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|e| AppError::from_io(&e, format!("directory '{}'", parent.display())))?;
    }
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create series CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);

    writeln!(
        out,
        "{DATETIME_COLUMN},{TARGET_COLUMN},{}",
        temperature_columns().join(",")
    )
    .map_err(|e| AppError::io(format!("Failed to write series CSV header: {e}")))?;

    for r in series.records() {
        let temps: Vec<String> = r.temperatures.iter().map(|t| t.to_string()).collect();
        writeln!(
            out,
            "{},{},{}",
            r.datetime.format(DATETIME_FORMAT),
            r.load,
            temps.join(",")
        )
        .map_err(|e| AppError::io(format!("Failed to write series CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::io(format!("Failed to flush series CSV '{}': {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FillNan, LoadRecord, N_TEMPERATURE};
    use crate::io::ingest::{CsvSource, SeriesSource};
    use crate::prep::fill_missing;
    use chrono::NaiveDate;

    #[test]
    fn exported_series_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("gefcom2014.csv");
        let datetime = NaiveDate::from_ymd_opt(2010, 6, 1).unwrap().and_hms_opt(13, 0, 0).unwrap();
        let mut temperatures = [0.0; N_TEMPERATURE];
        temperatures[3] = 71.25;
        let series = LoadSeries::new(vec![LoadRecord {
            datetime,
            load: 1234.5,
            temperatures,
        }])
        .unwrap();

        write_series_csv(&path, &series).unwrap();
        let records = CsvSource::new(&path).load_records().unwrap();
        let back = fill_missing(&records, FillNan::Drop).unwrap();
        assert_eq!(back, series);
    }
}
