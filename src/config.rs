use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::ConfigError;

pub const CONFIG_FILE: &str = "hours-atlas.toml";

/// Ustawienia aplikacji; każde pole ma wartość domyślną
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub series_id: String,
    pub eurostat_url: String,
    pub request_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub default_country: String,
    pub snapshot: SnapshotConfig,
    pub map: MapConfig,
    pub log_dir: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub path: PathBuf,
    pub sheet: String,
    pub skip_header: usize,
    pub skip_footer: usize,
    pub first_year: i32,
    pub year_count: usize,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub geojson_path: PathBuf,
    pub geojson_url: String,
}

const fn default_request_timeout_secs() -> u64 {
    15
}

const fn default_cache_ttl_secs() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            series_id: "tps00071".to_string(),
            eurostat_url: "https://ec.europa.eu/eurostat/api/dissemination/sdmx/2.1".to_string(),
            request_timeout_secs: default_request_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            default_country: "France".to_string(),
            snapshot: SnapshotConfig::default(),
            map: MapConfig::default(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/hours_worked.xlsx"),
            sheet: "Sheet 1".to_string(),
            skip_header: 16,
            skip_footer: 3,
            first_year: 2015,
            year_count: 10,
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            geojson_path: PathBuf::from("data/europe.geojson"),
            geojson_url: "https://raw.githubusercontent.com/leakyMirror/map-of-europe/master/GeoJSON/europe.geojson"
                .to_string(),
        }
    }
}

impl Config {
    /// Czyta plik, jeśli istnieje; brak pliku = ustawienia domyślne
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let txt = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&txt).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Year labels of the snapshot columns, e.g. "2015".."2024".
    pub fn snapshot_years(&self) -> Vec<String> {
        (0..self.snapshot.year_count)
            .map(|i| (self.snapshot.first_year + i as i32).to_string())
            .collect()
    }
}
