use std::cmp::Ordering;

use crate::data::{HoursBin, LongTable, bin_hours};

#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    pub label: String,
    pub hours: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BarChartSpec {
    pub title: String,
    pub bars: Vec<Bar>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapEntry {
    pub country: String,
    pub iso2: Option<String>,
    pub hours: Option<f64>,
    pub bin: HoursBin,
}

/// Dane mapy dla jednego roku
#[derive(Clone, Debug, PartialEq)]
pub struct MapChart {
    pub title: String,
    pub year: i32,
    pub entries: Vec<MapEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClickResult {
    pub country: Option<String>,
}

impl MapChart {
    pub fn entry_for_code(&self, iso2: &str) -> Option<&MapEntry> {
        self.entries.iter().find(|e| e.iso2.as_deref() == Some(iso2))
    }

    /// Shapes are joined to the data by ISO2; a shape without data is not selectable.
    pub fn bin_for_code(&self, iso2: &str) -> HoursBin {
        self.entry_for_code(iso2).map(|e| e.bin).unwrap_or(HoursBin::NoData)
    }

    pub fn click(&self, iso2: Option<&str>) -> ClickResult {
        ClickResult {
            country: iso2.and_then(|code| self.entry_for_code(code)).map(|e| e.country.clone()),
        }
    }

    /// "No data" always comes first.
    pub fn legend() -> [(&'static str, HoursBin); 7] {
        HoursBin::ALL.map(|bin| (bin.label(), bin))
    }
}

pub fn map_chart(table: &LongTable, year: i32) -> MapChart {
    let entries = table
        .for_year(year)
        .map(|o| MapEntry {
            country: o.country.clone(),
            iso2: o.iso2.clone(),
            hours: o.hours,
            bin: bin_hours(o.hours),
        })
        .collect();
    MapChart {
        title: format!("Average weekly hours worked in Europe in {year}. Click on a country to see more data"),
        year,
        entries,
    }
}

/// Ascending by hours; countries without data go last.
pub fn ranked_bars(table: &LongTable, year: i32) -> BarChartSpec {
    let mut rows: Vec<_> = table.for_year(year).collect();
    rows.sort_by(|a, b| match (a.hours, b.hours) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.country.cmp(&b.country)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.country.cmp(&b.country),
    });
    BarChartSpec {
        title: format!("Average worked hours per week in {year}"),
        bars: rows
            .into_iter()
            .map(|o| Bar { label: o.country.clone(), hours: o.hours })
            .collect(),
    }
}

pub fn history_bars(table: &LongTable, country: &str) -> BarChartSpec {
    let mut rows: Vec<_> = table.for_country(country).collect();
    rows.sort_by_key(|o| o.year);
    BarChartSpec {
        title: format!("Annual average of worked weekly hours in {country}"),
        bars: rows
            .into_iter()
            .map(|o| Bar { label: o.year.to_string(), hours: o.hours })
            .collect(),
    }
}

/// Highest and lowest country of the year, as a sentence.
pub fn summary(table: &LongTable, year: i32) -> Option<String> {
    let ranked = ranked_bars(table, year);
    let with_data: Vec<_> = ranked.bars.iter().filter(|b| b.hours.is_some()).collect();
    let (lowest, highest) = (with_data.first()?, with_data.last()?);
    Some(format!(
        "In {year}, {} had the highest average weekly working hours at {:.1}, while {} ranked lowest with roughly {:.1} hours.",
        highest.label,
        highest.hours.unwrap_or_default(),
        lowest.label,
        lowest.hours.unwrap_or_default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{WideRow, WideTable, to_long};

    fn table() -> LongTable {
        let row = |country: &str, iso2: Option<&str>, hours: [Option<f64>; 2]| WideRow {
            country: country.to_string(),
            iso2: iso2.map(str::to_string),
            hours: hours.to_vec(),
        };
        to_long(&WideTable {
            years: vec!["2024".into(), "2023".into()],
            rows: vec![
                row("Türkiye", Some("TR"), [Some(44.2), Some(44.9)]),
                row("Netherlands", Some("NL"), [Some(31.6), Some(31.7)]),
                row("Liechtenstein", None, [None, Some(40.0)]),
                row("France", Some("FR"), [Some(35.8), Some(36.1)]),
            ],
        })
        .unwrap()
    }

    #[test]
    fn ranked_is_ascending_with_missing_last() {
        let chart = ranked_bars(&table(), 2024);
        let labels: Vec<_> = chart.bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Netherlands", "France", "Türkiye", "Liechtenstein"]);
        assert_eq!(chart.title, "Average worked hours per week in 2024");
    }

    #[test]
    fn history_is_sorted_by_year() {
        let chart = history_bars(&table(), "France");
        let bars: Vec<_> = chart.bars.iter().map(|b| (b.label.as_str(), b.hours)).collect();
        assert_eq!(bars, vec![("2023", Some(36.1)), ("2024", Some(35.8))]);
    }

    #[test]
    fn history_of_unknown_country_is_empty() {
        assert!(history_bars(&table(), "Atlantis").bars.is_empty());
    }

    #[test]
    fn map_bins_and_click() {
        let map = map_chart(&table(), 2024);
        assert_eq!(map.entries.len(), 4);
        assert_eq!(map.bin_for_code("FR"), HoursBin::From36To40);
        assert_eq!(map.bin_for_code("TR"), HoursBin::From41To45);
        assert_eq!(map.bin_for_code("DE"), HoursBin::NoData);
        assert_eq!(map.click(Some("NL")).country.as_deref(), Some("Netherlands"));
        assert_eq!(map.click(Some("DE")), ClickResult::default());
        assert_eq!(map.click(None), ClickResult::default());
    }

    #[test]
    fn legend_lists_no_data_first() {
        let legend = MapChart::legend();
        assert_eq!(legend[0].0, "No data");
        let labels: Vec<_> = legend[1..].iter().map(|(l, _)| *l).collect();
        assert_eq!(labels, vec!["10-20", "21-30", "31-35", "36-40", "41-45", "46-60"]);
    }

    #[test]
    fn summary_names_extremes() {
        let text = summary(&table(), 2024).unwrap();
        assert!(text.contains("Türkiye had the highest average weekly working hours at 44.2"));
        assert!(text.contains("Netherlands ranked lowest with roughly 31.6"));
        assert_eq!(summary(&table(), 1999), None);
    }
}
