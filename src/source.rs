use tracing::{debug, info, warn};

use crate::{
    countries,
    data::{WideRow, WideTable},
    error::{AcquisitionError, RemoteError, SchemaError, SnapshotError},
};

/// Dimension columns of the Eurostat table that carry no information here.
pub const DROPPED_DIMENSIONS: [&str; 7] = ["freq", "isco08", "wstatus", "worktime", "age", "unit", "sex"];
pub const GEO_DIMENSION: &str = "geo\\TIME_PERIOD";
pub const ISO2_COLUMN: &str = "ISO2";

/// Tabela zwrócona przez zdalne źródło: wymiary + kolumny okresów
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawTable {
    pub dimensions: Vec<String>,
    pub periods: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RawRow {
    pub dimensions: Vec<String>,
    pub values: Vec<Option<f64>>,
}

/// Rows keyed by whatever the source exposes: a code remotely, a name locally.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyedTable {
    pub years: Vec<String>,
    pub rows: Vec<KeyedRow>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct KeyedRow {
    pub key: String,
    pub hours: Vec<Option<f64>>,
}

pub trait RemoteProvider {
    /// `Ok(None)` means the provider answered but had nothing for this series.
    fn fetch_series(&self, series_id: &str) -> Result<Option<RawTable>, RemoteError>;
}

pub trait SnapshotSource {
    fn load(&self) -> Result<KeyedTable, SnapshotError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Remote,
    LocalSnapshot,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Acquired {
    pub table: WideTable,
    pub origin: Origin,
}

/// Eurostat first, the local workbook when that fails.
pub struct DataSource {
    series_id: String,
    remote: Box<dyn RemoteProvider>,
    snapshot: Box<dyn SnapshotSource>,
}

impl DataSource {
    pub fn new(
        series_id: impl Into<String>,
        remote: Box<dyn RemoteProvider>,
        snapshot: Box<dyn SnapshotSource>,
    ) -> Self {
        Self { series_id: series_id.into(), remote, snapshot }
    }

    pub fn acquire(&self) -> Result<Acquired, AcquisitionError> {
        match self.acquire_remote() {
            Ok(table) => {
                info!(series = %self.series_id, countries = table.rows.len(), "Loaded data from Eurostat");
                Ok(Acquired { table, origin: Origin::Remote })
            }
            Err(remote) => {
                warn!(series = %self.series_id, error = %remote, "Eurostat unavailable, using local snapshot");
                let keyed = self
                    .snapshot
                    .load()
                    .map_err(|local| AcquisitionError { remote, local })?;
                let table = attach_codes(keyed);
                info!(countries = table.rows.len(), "Loaded data from local snapshot");
                Ok(Acquired { table, origin: Origin::LocalSnapshot })
            }
        }
    }

    fn acquire_remote(&self) -> Result<WideTable, RemoteError> {
        let raw = self
            .remote
            .fetch_series(&self.series_id)?
            .filter(|raw| !raw.rows.is_empty())
            .ok_or(RemoteError::Empty)?;
        let table = attach_names(select_geo(raw)?);
        // Same as an empty answer when only aggregates came back
        if table.rows.is_empty() {
            return Err(RemoteError::Empty);
        }
        Ok(table)
    }
}

/// Drops the unused dimensions and keeps the geo code as the `ISO2` key.
pub fn select_geo(raw: RawTable) -> Result<KeyedTable, SchemaError> {
    let geo = raw
        .dimensions
        .iter()
        .position(|d| d == GEO_DIMENSION || d == "geo")
        .ok_or_else(|| SchemaError::MissingColumn(GEO_DIMENSION.to_string()))?;
    let dropped: Vec<&String> = raw
        .dimensions
        .iter()
        .filter(|d| DROPPED_DIMENSIONS.contains(&d.as_str()))
        .collect();
    debug!(?dropped, geo = %raw.dimensions[geo], renamed = ISO2_COLUMN, "Selecting geo dimension");

    let rows = raw
        .rows
        .into_iter()
        .filter_map(|mut row| {
            if geo >= row.dimensions.len() {
                return None;
            }
            Some(KeyedRow { key: row.dimensions.swap_remove(geo), hours: row.values })
        })
        .collect();
    Ok(KeyedTable { years: raw.periods, rows })
}

/// Remote path: code → name; unknown codes (aggregates etc.) are dropped.
pub fn attach_names(keyed: KeyedTable) -> WideTable {
    let mut rows: Vec<WideRow> = Vec::with_capacity(keyed.rows.len());
    for row in keyed.rows {
        let Some(name) = countries::code_to_name(&row.key) else {
            debug!(code = %row.key, "Dropping row with unmapped country code");
            continue;
        };
        push_unique(&mut rows, WideRow {
            country: name.to_string(),
            iso2: Some(row.key),
            hours: row.hours,
        });
    }
    WideTable { years: keyed.years, rows }
}

/// Local path: name → code; unknown names stay in with no code.
pub fn attach_codes(keyed: KeyedTable) -> WideTable {
    let mut rows: Vec<WideRow> = Vec::with_capacity(keyed.rows.len());
    for row in keyed.rows {
        let iso2 = countries::name_to_code(&row.key).map(str::to_string);
        if iso2.is_none() {
            debug!(country = %row.key, "No ISO2 code for snapshot row");
        }
        push_unique(&mut rows, WideRow { country: row.key, iso2, hours: row.hours });
    }
    WideTable { years: keyed.years, rows }
}

fn push_unique(rows: &mut Vec<WideRow>, row: WideRow) {
    if rows.iter().any(|r| r.country == row.country) {
        warn!(country = %row.country, "Duplicate country row ignored");
        return;
    }
    rows.push(row);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    pub struct StubRemote {
        pub answer: fn() -> Result<Option<RawTable>, RemoteError>,
        pub calls: Rc<Cell<usize>>,
    }

    impl RemoteProvider for StubRemote {
        fn fetch_series(&self, _series_id: &str) -> Result<Option<RawTable>, RemoteError> {
            self.calls.set(self.calls.get() + 1);
            (self.answer)()
        }
    }

    pub struct StubSnapshot {
        pub answer: fn() -> Result<KeyedTable, SnapshotError>,
    }

    impl SnapshotSource for StubSnapshot {
        fn load(&self) -> Result<KeyedTable, SnapshotError> {
            (self.answer)()
        }
    }

    pub fn remote_table() -> Result<Option<RawTable>, RemoteError> {
        let dims = ["freq", "isco08", "wstatus", "worktime", "age", "unit", "sex", GEO_DIMENSION];
        let row = |geo: &str, values: [Option<f64>; 2]| RawRow {
            dimensions: ["A", "TOTAL", "EMP", "TOTAL", "Y15-64", "HR", "T", geo]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            values: values.to_vec(),
        };
        Ok(Some(RawTable {
            dimensions: dims.iter().map(|s| s.to_string()).collect(),
            periods: vec!["2023".into(), "2024".into()],
            rows: vec![
                row("EU27_2020", [Some(37.5), Some(37.4)]),
                row("FR", [Some(36.1), Some(35.8)]),
                row("PL", [Some(40.4), None]),
            ],
        }))
    }

    pub fn snapshot_table() -> Result<KeyedTable, SnapshotError> {
        Ok(KeyedTable {
            years: vec!["2023".into(), "2024".into()],
            rows: vec![
                KeyedRow { key: "European Union - 27 countries (from 2020)".into(), hours: vec![Some(37.5), Some(37.4)] },
                KeyedRow { key: "France".into(), hours: vec![Some(36.0), Some(35.9)] },
                KeyedRow { key: "Spain".into(), hours: vec![None, Some(37.8)] },
            ],
        })
    }

    pub fn source(
        remote: fn() -> Result<Option<RawTable>, RemoteError>,
        snapshot: fn() -> Result<KeyedTable, SnapshotError>,
        calls: Rc<Cell<usize>>,
    ) -> DataSource {
        DataSource::new(
            "tps00071",
            Box::new(StubRemote { answer: remote, calls }),
            Box::new(StubSnapshot { answer: snapshot }),
        )
    }

    #[test]
    fn remote_success_maps_codes_and_drops_aggregates() {
        let acquired = source(remote_table, snapshot_table, Rc::default()).acquire().unwrap();
        assert_eq!(acquired.origin, Origin::Remote);
        let names: Vec<_> = acquired.table.rows.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(names, vec!["France", "Poland"]);
        assert_eq!(acquired.table.rows[0].iso2.as_deref(), Some("FR"));
        assert_eq!(acquired.table.years, vec!["2023", "2024"]);
    }

    #[test]
    fn remote_error_falls_back_to_snapshot() {
        let acquired = source(|| Err(RemoteError::Status(503)), snapshot_table, Rc::default())
            .acquire()
            .unwrap();
        assert_eq!(acquired.origin, Origin::LocalSnapshot);
        assert_eq!(acquired.table.rows.len(), 3);
        assert_eq!(acquired.table.rows[0].iso2, None);
        assert_eq!(acquired.table.rows[1].iso2.as_deref(), Some("FR"));
        assert_eq!(acquired.table.rows[2].iso2.as_deref(), Some("ES"));
    }

    #[test]
    fn empty_remote_result_falls_back() {
        let absent = source(|| Ok(None), snapshot_table, Rc::default()).acquire().unwrap();
        assert_eq!(absent.origin, Origin::LocalSnapshot);

        let no_rows = source(|| Ok(Some(RawTable::default())), snapshot_table, Rc::default())
            .acquire()
            .unwrap();
        assert_eq!(no_rows.origin, Origin::LocalSnapshot);
    }

    #[test]
    fn aggregates_only_remote_falls_back() {
        let aggregates_only = || -> Result<Option<RawTable>, RemoteError> {
            let mut raw = remote_table()?.ok_or(RemoteError::Empty)?;
            raw.rows.truncate(1);
            Ok(Some(raw))
        };
        let acquired = source(aggregates_only, snapshot_table, Rc::default()).acquire().unwrap();
        assert_eq!(acquired.origin, Origin::LocalSnapshot);
        assert_eq!(acquired.table.rows[1].country, "France");

        let err = source(
            aggregates_only,
            || Err(SnapshotError::TooShort { rows: 0 }),
            Rc::default(),
        )
        .acquire()
        .unwrap_err();
        assert!(matches!(err.remote, RemoteError::Empty));
    }

    #[test]
    fn missing_geo_column_falls_back() {
        let missing_geo = || {
            Ok(Some(RawTable {
                dimensions: vec!["freq".into()],
                periods: vec!["2024".into()],
                rows: vec![RawRow { dimensions: vec!["A".into()], values: vec![Some(1.0)] }],
            }))
        };
        let acquired = source(missing_geo, snapshot_table, Rc::default()).acquire().unwrap();
        assert_eq!(acquired.origin, Origin::LocalSnapshot);
    }

    #[test]
    fn both_failing_is_fatal() {
        let err = source(
            || Err(RemoteError::Empty),
            || Err(SnapshotError::TooShort { rows: 2 }),
            Rc::default(),
        )
        .acquire()
        .unwrap_err();
        assert!(matches!(err.remote, RemoteError::Empty));
        assert!(matches!(err.local, SnapshotError::TooShort { rows: 2 }));
    }

    #[test]
    fn duplicate_codes_keep_first_row() {
        let keyed = KeyedTable {
            years: vec!["2024".into()],
            rows: vec![
                KeyedRow { key: "DE".into(), hours: vec![Some(34.2)] },
                KeyedRow { key: "DE".into(), hours: vec![Some(99.0)] },
            ],
        };
        let wide = attach_names(keyed);
        assert_eq!(wide.rows.len(), 1);
        assert_eq!(wide.rows[0].hours, vec![Some(34.2)]);
    }
}
