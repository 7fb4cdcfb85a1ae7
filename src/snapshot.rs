use calamine::{Data, Reader, Xlsx, open_workbook};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::{
    config::Config,
    error::SnapshotError,
    source::{KeyedRow, KeyedTable, SnapshotSource},
};

/// Offline copy of the Eurostat table, as exported to Excel.
pub struct XlsxSnapshot {
    path: PathBuf,
    sheet: String,
    skip_header: usize,
    skip_footer: usize,
    years: Vec<String>,
}

impl XlsxSnapshot {
    pub fn from_config(config: &Config) -> Self {
        Self {
            path: config.snapshot.path.clone(),
            sheet: config.snapshot.sheet.clone(),
            skip_header: config.snapshot.skip_header,
            skip_footer: config.snapshot.skip_footer,
            years: config.snapshot_years(),
        }
    }
}

impl SnapshotSource for XlsxSnapshot {
    fn load(&self) -> Result<KeyedTable, SnapshotError> {
        info!(path = %self.path.display(), sheet = %self.sheet, "Reading local snapshot");
        let mut workbook: Xlsx<_> = open_workbook(&self.path).map_err(|source| SnapshotError::Open {
            path: self.path.clone(),
            source,
        })?;
        let range = workbook
            .worksheet_range(&self.sheet)
            .map_err(|source| SnapshotError::Sheet { sheet: self.sheet.clone(), source })?;

        // Range zaczyna się od pierwszej niepustej komórki; liczymy wiersze od A1
        let Some((end_row, _)) = range.end() else {
            return Err(SnapshotError::TooShort { rows: 0 });
        };
        let columns = self.years.len() as u32 + 1;
        let grid: Vec<Vec<Data>> = (0..=end_row)
            .map(|r| {
                (0..columns)
                    .map(|c| range.get_value((r, c)).cloned().unwrap_or(Data::Empty))
                    .collect()
            })
            .collect();
        parse_rows(&grid, self.skip_header, self.skip_footer, &self.years)
    }
}

/// Skips the non-data rows; column 0 is the country name, then one cell per year.
pub fn parse_rows(
    grid: &[Vec<Data>],
    skip_header: usize,
    skip_footer: usize,
    years: &[String],
) -> Result<KeyedTable, SnapshotError> {
    if grid.len() <= skip_header + skip_footer {
        return Err(SnapshotError::TooShort { rows: grid.len() });
    }
    let mut rows = Vec::new();
    for cells in &grid[skip_header..grid.len() - skip_footer] {
        let name = cells.first().map(cell_text).unwrap_or_default();
        if name.is_empty() {
            debug!("Skipping snapshot row without a country name");
            continue;
        }
        let hours = (1..=years.len())
            .map(|i| cells.get(i).and_then(cell_value))
            .collect();
        rows.push(KeyedRow { key: name, hours });
    }
    Ok(KeyedTable { years: years.to_vec(), rows })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => {
            let number = s.split_whitespace().next()?;
            if number == ":" { None } else { number.parse().ok() }
        }
        _ => None,
    }
}
