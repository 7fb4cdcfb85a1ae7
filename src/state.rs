use crossterm::event::KeyCode;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::{
    cache::AcquisitionCache,
    charts::{self, BarChartSpec, ClickResult, MapChart},
    config::Config,
    data::{LongTable, to_long},
    error::RefreshError,
    eurostat::EurostatClient,
    map_draw::MapView,
    snapshot::XlsxSnapshot,
    source::{DataSource, Origin},
};

const NO_OBSERVATIONS: &str = "no observations in data";

/// Wybór użytkownika: rok i kraj
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub year: Option<i32>,
    pub country: String,
}

/// Wszystko, co rysuje jeden cykl odświeżenia
#[derive(Clone, Debug, PartialEq)]
pub struct Dashboard {
    pub years: Vec<i32>,
    pub year: i32,
    pub country: String,
    pub ranked: BarChartSpec,
    pub map: MapChart,
    pub history: BarChartSpec,
    pub summary: Option<String>,
    pub active_hours: Option<f64>,
}

/// Pure: the same table and selection always give the same charts.
pub fn render(table: &LongTable, selection: &Selection) -> Option<Dashboard> {
    let years = table.years();
    let year = selection
        .year
        .filter(|y| years.contains(y))
        .or_else(|| table.latest_year())?;
    Some(Dashboard {
        year,
        country: selection.country.clone(),
        ranked: charts::ranked_bars(table, year),
        map: charts::map_chart(table, year),
        history: charts::history_bars(table, &selection.country),
        summary: charts::summary(table, year),
        active_hours: table.get(&selection.country, year).and_then(|o| o.hours),
        years,
    })
}

pub struct AppState {
    source: DataSource,
    cache: AcquisitionCache,
    pending_click: ClickResult,
    pub selection: Selection,
    pub origin: Option<Origin>,
    pub dashboard: Option<Dashboard>,
    pub error: Option<String>,
    pub map: Option<MapView>,
    pub map_notice: Option<String>,
}

impl AppState {
    const HELP_TEXT: &'static str = "←/→: year   click map: country   r: reload data   q: quit";

    pub fn new(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let remote = EurostatClient::new(config.eurostat_url.clone(), config.request_timeout())?;
        let snapshot = XlsxSnapshot::from_config(config);
        let source = DataSource::new(config.series_id.clone(), Box::new(remote), Box::new(snapshot));

        let mut state = Self::with_source(config, source);
        match MapView::load(&config.map, config.request_timeout()) {
            Ok(view) => {
                debug!(features = view.feature_count(), "Map loaded");
                state.map = Some(view);
            }
            Err(e) => {
                warn!(error = %e, "Map of Europe unavailable");
                state.map_notice = Some(format!("Map unavailable: {e}"));
            }
        }
        state.refresh(Instant::now());
        Ok(state)
    }

    pub fn with_source(config: &Config, source: DataSource) -> Self {
        Self {
            source,
            cache: AcquisitionCache::new(config.cache_ttl()),
            pending_click: ClickResult::default(),
            selection: Selection { year: None, country: config.default_country.clone() },
            origin: None,
            dashboard: None,
            error: None,
            map: None,
            map_notice: None,
        }
    }

    pub fn help_text(&self) -> &'static str {
        Self::HELP_TEXT
    }

    /// Jeden cykl: pobranie (z cache) → normalizacja → wykresy
    pub fn refresh(&mut self, now: Instant) {
        let table = match self.load(now) {
            Ok(table) => table,
            Err(e) => {
                error!(error = %e, "Refresh aborted");
                self.error = Some(e.to_string());
                self.origin = None;
                self.dashboard = None;
                return;
            }
        };

        let click = std::mem::take(&mut self.pending_click);
        if let Some(country) = click.country {
            info!(%country, "Country selected on map");
            self.selection.country = country;
        }

        self.dashboard = render(&table, &self.selection);
        self.error = match &self.dashboard {
            Some(dashboard) => {
                self.selection.year = Some(dashboard.year);
                None
            }
            None => {
                error!("Acquired table has no observations");
                Some(NO_OBSERVATIONS.to_string())
            }
        };
    }

    fn load(&mut self, now: Instant) -> Result<LongTable, RefreshError> {
        let acquired = self
            .cache
            .get_or_try_insert_with(now, || self.source.acquire())?;
        self.origin = Some(acquired.origin);
        Ok(to_long(&acquired.table)?)
    }

    pub fn used_fallback(&self) -> bool {
        self.origin == Some(Origin::LocalSnapshot)
    }

    /// Zwraca true, jeśli trzeba wyjść
    pub fn handle_input(&mut self, key: KeyCode) -> bool {
        use KeyCode::*;
        match key {
            Char('q') | Esc => return true,
            Left | Up => self.step_year(-1),
            Right | Down => self.step_year(1),
            Char('r') => {
                info!("Reloading data on request");
                self.cache.invalidate();
            }
            _ => return false,
        }
        self.refresh(Instant::now());
        false
    }

    fn step_year(&mut self, delta: isize) {
        let Some(dashboard) = &self.dashboard else { return };
        let Some(pos) = dashboard.years.iter().position(|y| *y == dashboard.year) else { return };
        let next = pos.saturating_add_signed(delta).min(dashboard.years.len() - 1);
        self.selection.year = Some(dashboard.years[next]);
    }

    /// Left click at a terminal cell; a miss keeps the current country.
    pub fn handle_click(&mut self, column: u16, row: u16) {
        let (Some(map), Some(dashboard)) = (&self.map, &self.dashboard) else { return };
        let code = map.country_at_cell(column, row);
        let click = dashboard.map.click(code);
        if click.country.is_none() {
            if let Some(code) = code {
                debug!(code, name = map.name_of(code), "Clicked shape has no data");
            }
            return;
        }
        self.apply_click(click, Instant::now());
    }

    pub fn apply_click(&mut self, click: ClickResult, now: Instant) {
        self.pending_click = click;
        self.refresh(now);
    }
}
