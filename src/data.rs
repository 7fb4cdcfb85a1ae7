use std::collections::BTreeSet;

use tracing::warn;

use crate::error::SchemaError;

/// Realistic range of weekly hours; anything outside is treated as missing.
const MAX_WEEKLY_HOURS: f64 = 168.0;

/// Tabela "szeroka": jeden wiersz na kraj, jedna kolumna na rok
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WideTable {
    pub years: Vec<String>,
    pub rows: Vec<WideRow>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WideRow {
    pub country: String,
    pub iso2: Option<String>,
    pub hours: Vec<Option<f64>>,
}

/// Jedna obserwacja: kraj, rok, godziny
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub country: String,
    pub iso2: Option<String>,
    pub year: i32,
    pub hours: Option<f64>,
}

/// Tabela "długa": jeden wiersz na (kraj, rok)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LongTable {
    rows: Vec<Observation>,
}

impl LongTable {
    pub fn years(&self) -> Vec<i32> {
        self.rows
            .iter()
            .map(|o| o.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.rows.iter().map(|o| o.year).max()
    }

    pub fn for_year(&self, year: i32) -> impl Iterator<Item = &Observation> {
        self.rows.iter().filter(move |o| o.year == year)
    }

    pub fn for_country<'a>(&'a self, country: &'a str) -> impl Iterator<Item = &'a Observation> {
        self.rows.iter().filter(move |o| o.country == country)
    }

    pub fn get(&self, country: &str, year: i32) -> Option<&Observation> {
        self.rows.iter().find(|o| o.year == year && o.country == country)
    }
}

/// Melts every year column into (year, hours) rows, country by country.
pub fn to_long(wide: &WideTable) -> Result<LongTable, SchemaError> {
    let years = wide
        .years
        .iter()
        .map(|label| {
            label
                .trim()
                .parse::<i32>()
                .map_err(|_| SchemaError::InvalidYear(label.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows = Vec::with_capacity(wide.rows.len() * years.len());
    for row in &wide.rows {
        if row.hours.len() != years.len() {
            return Err(SchemaError::RaggedRow {
                country: row.country.clone(),
                expected: years.len(),
                found: row.hours.len(),
            });
        }
        for (year, hours) in years.iter().zip(&row.hours) {
            rows.push(Observation {
                country: row.country.clone(),
                iso2: row.iso2.clone(),
                year: *year,
                hours: realistic(&row.country, *year, *hours),
            });
        }
    }
    Ok(LongTable { rows })
}

fn realistic(country: &str, year: i32, hours: Option<f64>) -> Option<f64> {
    match hours {
        Some(h) if h.is_finite() && (0.0..=MAX_WEEKLY_HOURS).contains(&h) => Some(h),
        Some(h) => {
            warn!(country, year, hours = h, "Dropping unrealistic hours value");
            None
        }
        None => None,
    }
}

/// Przedziały godzin dla mapy
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HoursBin {
    NoData,
    From10To20,
    From21To30,
    From31To35,
    From36To40,
    From41To45,
    From46To60,
}

pub const BIN_EDGES: [f64; 7] = [10.0, 20.0, 30.0, 35.0, 40.0, 45.0, 60.0];

impl HoursBin {
    /// "No data" first, then ascending.
    pub const ALL: [HoursBin; 7] = [
        HoursBin::NoData,
        HoursBin::From10To20,
        HoursBin::From21To30,
        HoursBin::From31To35,
        HoursBin::From36To40,
        HoursBin::From41To45,
        HoursBin::From46To60,
    ];

    const LABELED: [HoursBin; 6] = [
        HoursBin::From10To20,
        HoursBin::From21To30,
        HoursBin::From31To35,
        HoursBin::From36To40,
        HoursBin::From41To45,
        HoursBin::From46To60,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HoursBin::NoData => "No data",
            HoursBin::From10To20 => "10-20",
            HoursBin::From21To30 => "21-30",
            HoursBin::From31To35 => "31-35",
            HoursBin::From36To40 => "36-40",
            HoursBin::From41To45 => "41-45",
            HoursBin::From46To60 => "46-60",
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            HoursBin::NoData => "#d9d9d9",
            HoursBin::From10To20 => "#fef0d9",
            HoursBin::From21To30 => "#fdd49e",
            HoursBin::From31To35 => "#fdbb84",
            HoursBin::From36To40 => "#fc8d59",
            HoursBin::From41To45 => "#e34a33",
            HoursBin::From46To60 => "#b30000",
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        let hex = &self.hex()[1..];
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }
}

/// Right-closed bins, the first one also includes its lower edge.
pub fn bin_hours(hours: Option<f64>) -> HoursBin {
    let Some(h) = hours else {
        return HoursBin::NoData;
    };
    if !(BIN_EDGES[0]..=BIN_EDGES[BIN_EDGES.len() - 1]).contains(&h) {
        return HoursBin::NoData;
    }
    BIN_EDGES
        .windows(2)
        .zip(HoursBin::LABELED)
        .find(|(edge, _)| h <= edge[1])
        .map(|(_, bin)| bin)
        .unwrap_or(HoursBin::NoData)
}
