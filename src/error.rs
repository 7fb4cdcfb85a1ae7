use std::path::PathBuf;
use thiserror::Error;

/// Problems with the Eurostat call. Always recovered by the snapshot fallback.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request to Eurostat failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Eurostat answered with HTTP {0}")]
    Status(u16),
    #[error("Eurostat returned no data")]
    Empty,
    #[error("malformed Eurostat response: {0}")]
    Malformed(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("cannot open snapshot {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },
    #[error("snapshot sheet '{sheet}' unreadable: {source}")]
    Sheet {
        sheet: String,
        #[source]
        source: calamine::XlsxError,
    },
    #[error("snapshot has only {rows} rows, nothing left after skipping header and footer")]
    TooShort { rows: usize },
}

/// Both strategies failed, nothing to show.
#[derive(Debug, Error)]
#[error("no data available (Eurostat: {remote}; local snapshot: {local})")]
pub struct AcquisitionError {
    pub remote: RemoteError,
    pub local: SnapshotError,
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("year column '{0}' is not an integer")]
    InvalidYear(String),
    #[error("expected column '{0}' is missing")]
    MissingColumn(String),
    #[error("row '{country}' has {found} values for {expected} year columns")]
    RaggedRow {
        country: String,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("cannot read map file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot download map: {0}")]
    Download(#[from] reqwest::Error),
    #[error("invalid GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
}

/// Everything that aborts a refresh cycle.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
    #[error("data schema changed: {0}")]
    Schema(#[from] SchemaError),
}
