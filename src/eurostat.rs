use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::{
    error::RemoteError,
    source::{GEO_DIMENSION, RawRow, RawTable, RemoteProvider},
};

/// Eurostat deviates from ISO 3166 for these two countries.
const GEO_ALIASES: [(&str, &str); 2] = [("EL", "GR"), ("UK", "GB")];

/// Klient API Eurostatu (SDMX 2.1, format TSV)
pub struct EurostatClient {
    client: Client,
    base_url: String,
}

impl EurostatClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hours-atlas/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base_url: base_url.into() })
    }

    fn series_url(&self, series_id: &str) -> String {
        format!("{}/data/{}", self.base_url.trim_end_matches('/'), series_id)
    }
}

impl RemoteProvider for EurostatClient {
    fn fetch_series(&self, series_id: &str) -> Result<Option<RawTable>, RemoteError> {
        let url = self.series_url(series_id);
        info!(%url, "Requesting Eurostat series");
        let resp = self
            .client
            .get(&url)
            .query(&[("format", "TSV"), ("compressed", "false")])
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }
        let body = resp.text()?;
        debug!(bytes = body.len(), "Eurostat response received");
        parse_tsv(&body)
    }
}

/// Parses the TSV export. The first column packs every dimension,
/// comma-separated, e.g. `freq,unit,geo\TIME_PERIOD` / `A,HR,FR`.
pub fn parse_tsv(body: &str) -> Result<Option<RawTable>, RemoteError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let header = reader
        .headers()
        .map_err(|e| RemoteError::Malformed(e.to_string()))?
        .clone();
    let mut header = header.iter();
    let dimensions: Vec<String> = header
        .next()
        .ok_or_else(|| RemoteError::Malformed("empty header".to_string()))?
        .split(',')
        .map(|d| d.trim().to_string())
        .collect();
    let periods: Vec<String> = header.map(str::to_string).collect();
    let geo = dimensions.iter().position(|d| d == GEO_DIMENSION);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| RemoteError::Malformed(e.to_string()))?;
        let mut cells = record.iter();
        let mut dims: Vec<String> = cells
            .next()
            .unwrap_or_default()
            .split(',')
            .map(|d| d.trim().to_string())
            .collect();
        if dims.len() != dimensions.len() {
            return Err(RemoteError::Malformed(format!(
                "row has {} dimensions, header has {}",
                dims.len(),
                dimensions.len()
            )));
        }
        if let Some(geo) = geo {
            dims[geo] = iso_code(&dims[geo]).to_string();
        }
        rows.push(RawRow { dimensions: dims, values: cells.map(parse_value).collect() });
    }

    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(RawTable { dimensions, periods, rows }))
}

/// `":"` marks a missing value; a trailing flag (`"37.5 b"`) is ignored.
pub fn parse_value(cell: &str) -> Option<f64> {
    let number = cell.split_whitespace().next()?;
    if number == ":" {
        return None;
    }
    number.parse().ok()
}

fn iso_code(code: &str) -> &str {
    GEO_ALIASES
        .iter()
        .find(|(eurostat, _)| *eurostat == code)
        .map(|(_, iso)| *iso)
        .unwrap_or(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "freq,isco08,wstatus,worktime,age,unit,sex,geo\\TIME_PERIOD\t2023 \t2024 \n\
A,TOTAL,EMP,TOTAL,Y15-64,HR,T,EL\t39.8 \t39.6 b\n\
A,TOTAL,EMP,TOTAL,Y15-64,HR,T,FR\t36.1 \t35.8 \n\
A,TOTAL,EMP,TOTAL,Y15-64,HR,T,LI\t: \t: c\n";

    #[test]
    fn splits_dimensions_and_periods() {
        let table = parse_tsv(SAMPLE).unwrap().unwrap();
        assert_eq!(table.dimensions.len(), 8);
        assert_eq!(table.dimensions[7], GEO_DIMENSION);
        assert_eq!(table.periods, vec!["2023", "2024"]);
        assert_eq!(table.rows.len(), 3);
    }

    #[test]
    fn values_flags_and_missing_markers() {
        let table = parse_tsv(SAMPLE).unwrap().unwrap();
        assert_eq!(table.rows[0].values, vec![Some(39.8), Some(39.6)]);
        assert_eq!(table.rows[1].values, vec![Some(36.1), Some(35.8)]);
        assert_eq!(table.rows[2].values, vec![None, None]);
    }

    #[test]
    fn eurostat_codes_become_iso() {
        let table = parse_tsv(SAMPLE).unwrap().unwrap();
        assert_eq!(table.rows[0].dimensions[7], "GR");
        assert_eq!(table.rows[1].dimensions[7], "FR");
    }

    #[test]
    fn empty_body_is_absent() {
        assert_eq!(parse_tsv("").unwrap(), None);
        assert_eq!(parse_tsv("freq,geo\\TIME_PERIOD\t2024\n").unwrap(), None);
    }

    #[test]
    fn dimension_count_mismatch_is_malformed() {
        let body = "freq,geo\\TIME_PERIOD\t2024\nA\t30.0\n";
        assert!(matches!(parse_tsv(body), Err(RemoteError::Malformed(_))));
    }

    #[test]
    fn parse_value_cases() {
        assert_eq!(parse_value("41.2"), Some(41.2));
        assert_eq!(parse_value("41.2 e"), Some(41.2));
        assert_eq!(parse_value(":"), None);
        assert_eq!(parse_value(": z"), None);
        assert_eq!(parse_value(""), None);
    }

    #[test]
    fn url_has_no_double_slash() {
        let client = EurostatClient::new("https://example.org/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.series_url("tps00071"), "https://example.org/api/data/tps00071");
    }
}
