use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Tabs, Wrap},
    Frame,
};
use crate::charts::{BarChartSpec, MapChart};
use crate::data::{HoursBin, bin_hours};
use crate::state::{AppState, Dashboard};

const TITLE: &str = "Average usual weekly hours worked in the main job in EU";
const SUBTITLE: &str = "Annual data (copyright: Eurostat)";
const DEFINITION: &str = "Corresponds to the number of hours the person normally works. \
Covers all hours including extra hours, both paid and unpaid. \
Excludes the travel time between the home and the place of work as well as the main meal breaks (definition from Eurostat).";
const METADATA_URL: &str = "https://ec.europa.eu/eurostat/cache/metadata/en/lfsa_esms.htm";
const FALLBACK_WARNING: &str = "Eurostat is offline: using local cached Excel data.";

fn bin_color(bin: HoursBin) -> Color {
    let (r, g, b) = bin.rgb();
    Color::Rgb(r, g, b)
}

pub fn draw(f: &mut Frame, state: &AppState) {
    let banner = if state.used_fallback() { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(banner),
            Constraint::Min(10),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, chunks[0]);

    if banner > 0 {
        let warning = Paragraph::new(FALLBACK_WARNING)
            .style(Style::default().fg(Color::Black).bg(Color::Yellow));
        f.render_widget(warning, chunks[1]);
    }

    let footer = match &state.map_notice {
        Some(notice) => format!("{}   |   {}", state.help_text(), notice),
        None => state.help_text().to_string(),
    };
    f.render_widget(
        Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
        chunks[4],
    );

    // Bez danych: tylko komunikat błędu, żadnych wykresów
    let Some(dashboard) = &state.dashboard else {
        let msg = state.error.as_deref().unwrap_or("Loading data...");
        let error = Paragraph::new(format!("Couldn't load data.\n\n{msg}"))
            .block(Block::default().borders(Borders::ALL).title("Error"))
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        f.render_widget(error, chunks[2]);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);

    // Lewa kolumna: wybór roku + ranking
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(columns[0]);
    draw_year_selector(f, left[0], dashboard);
    let ranked = bar_chart(&dashboard.ranked, Direction::Horizontal).bar_width(1).bar_gap(0);
    f.render_widget(ranked, left[1]);

    // Prawa kolumna: mapa, legenda, historia kraju
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(60),
            Constraint::Length(1),
            Constraint::Min(6),
        ])
        .split(columns[1]);
    if let Some(map) = &state.map {
        let active = dashboard
            .map
            .entries
            .iter()
            .find(|e| e.country == dashboard.country)
            .and_then(|e| e.iso2.as_deref());
        map.render(f, right[0], &dashboard.map.title, Some(&dashboard.map), active);
    } else {
        let txt = Paragraph::new("The map of Europe could not be loaded")
            .block(Block::default().borders(Borders::ALL).title(dashboard.map.title.clone()))
            .wrap(Wrap { trim: true });
        f.render_widget(txt, right[0]);
    }
    f.render_widget(Paragraph::new(legend()), right[1]);
    let history = bar_chart(&dashboard.history, Direction::Vertical).bar_width(5).bar_gap(1);
    f.render_widget(history, right[2]);

    if let Some(summary) = &dashboard.summary {
        f.render_widget(Paragraph::new(summary.as_str()), chunks[3]);
    }
}

fn draw_header(f: &mut Frame, area: Rect) {
    let text = Text::from(vec![
        Line::from(Span::styled(TITLE, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(SUBTITLE, Style::default().fg(Color::Gray))),
        Line::from(DEFINITION),
        Line::from(vec![
            Span::raw("Please check "),
            Span::styled(METADATA_URL, Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED)),
            Span::raw(" for more information."),
        ]),
    ]);
    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), area);
}

fn draw_year_selector(f: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let titles: Vec<String> = dashboard.years.iter().map(i32::to_string).collect();
    let selected = dashboard.years.iter().position(|y| *y == dashboard.year);
    let title = match dashboard.active_hours {
        Some(h) => format!("Year ({}: {h:.1} h/week)", dashboard.country),
        None => format!("Year ({}: no data)", dashboard.country),
    };
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(title))
        .select(selected.unwrap_or(0))
        .highlight_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, area);
}

/// Values are tenths of an hour so one decimal survives the integer bars.
fn bar_chart(spec: &BarChartSpec, direction: Direction) -> BarChart<'static> {
    let bars: Vec<Bar<'static>> = spec
        .bars
        .iter()
        .map(|b| {
            let text = b.hours.map_or_else(|| HoursBin::NoData.label().to_string(), |h| format!("{h:.1}"));
            Bar::default()
                .value(b.hours.map_or(0, |h| (h * 10.0).round() as u64))
                .label(Line::from(b.label.clone()))
                .text_value(text)
                .style(Style::default().fg(bin_color(bin_hours(b.hours))))
                .value_style(Style::default().fg(Color::Black).bg(bin_color(bin_hours(b.hours))))
        })
        .collect();
    BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(spec.title.clone()))
        .direction(direction)
        .data(BarGroup::default().bars(&bars))
}

fn legend() -> Line<'static> {
    let mut spans = vec![Span::raw("Hours/week: ")];
    for (label, bin) in MapChart::legend() {
        spans.push(Span::styled("■ ", Style::default().fg(bin_color(bin))));
        spans.push(Span::raw(format!("{label}  ")));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::Bar as BarSpec;

    #[test]
    fn legend_starts_with_no_data() {
        let line = legend();
        assert_eq!(line.spans[2].content, "No data  ");
        assert_eq!(line.spans[1].style.fg, Some(Color::Rgb(0xd9, 0xd9, 0xd9)));
    }

    #[test]
    fn chart_accepts_missing_values() {
        let spec = BarChartSpec {
            title: "t".into(),
            bars: vec![
                BarSpec { label: "Malta".into(), hours: None },
                BarSpec { label: "Spain".into(), hours: Some(37.8) },
            ],
        };
        let _ = bar_chart(&spec, Direction::Horizontal);
    }
}
