//! TUI layout and widget rendering.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Points};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use super::runtime::App;
use super::style;
use crate::error::FilterStage;
use crate::render::format::format_thousands;

/// Number of legend swatches under the map.
const LEGEND_STEPS: usize = 12;
/// Largest regions listed in the side panel.
const TOP_REGIONS: usize = 8;

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(12),   // body
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(20)])
        .split(chunks[1]);

    render_header(frame, app, chunks[0]);
    render_side_panel(frame, app, body[0]);
    render_map(frame, app, body[1]);
    render_footer(frame, chunks[2]);
}

/// Header bar: title, row count, current grand total.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let total = app
        .view
        .as_ref()
        .map_or_else(|| "-".to_string(), |v| v.report.formatted_total());
    let header = Line::from(vec![
        Span::styled(
            " ENERGY-MAP ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " │ {} rows │ {} regions │ total {total} kWh ",
            app.session().table.len(),
            app.session().geometry.len(),
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

/// Filter lists, total box, and top regions.
fn render_side_panel(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // power tier
            Constraint::Length(7), // tariff
            Constraint::Length(5), // residency
            Constraint::Length(3), // total
            Constraint::Min(3),    // regions / warning
        ])
        .split(area);

    for (stage, chunk) in FilterStage::ALL.into_iter().zip(chunks.iter()) {
        render_filter_list(frame, app, stage, *chunk);
    }
    render_total(frame, app, chunks[3]);
    render_regions(frame, app, chunks[4]);
}

/// One cascading selection as a list; the focused one gets a coloured border.
fn render_filter_list(frame: &mut Frame, app: &App, stage: FilterStage, area: Rect) {
    let items: Vec<ListItem> = app
        .options
        .for_stage(stage)
        .iter()
        .map(|o| ListItem::new(o.as_str()))
        .collect();

    let border = if app.focus == stage {
        Style::default().fg(style::FOCUS_BORDER)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(
            Block::default()
                .title(format!(" {} ", capitalize(stage.label())))
                .borders(Borders::ALL)
                .border_style(border),
        )
        .highlight_style(
            Style::default()
                .fg(style::HIGHLIGHT_FG)
                .bg(style::HIGHLIGHT_BG)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(app.selected_index(stage));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Grand total of the current selection.
fn render_total(frame: &mut Frame, app: &App, area: Rect) {
    let text = app.view.as_ref().map_or_else(
        || "  -".to_string(),
        |v| format!("  {} kWh", v.report.formatted_total()),
    );
    let paragraph = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().title(" Total ").borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

/// Largest regions of the current selection, or the active warning.
fn render_regions(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();
    if let Some(ref warning) = app.warning {
        lines.push(Line::from(Span::styled(
            format!("  {warning}"),
            Style::default().fg(style::WARNING_FG),
        )));
    }
    if let Some(ref view) = app.view {
        let mut ranked: Vec<(&String, &f64)> = view.result.by_region.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(a.1));
        for (region, value) in ranked.into_iter().take(TOP_REGIONS) {
            lines.push(Line::from(format!("  {region:<14} {:>14}", format_thousands(*value))));
        }
        if !view.report.unmatched_regions.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("  not on map: {}", view.report.unmatched_regions.join(", ")),
                Style::default().fg(style::WARNING_FG),
            )));
        }
    }

    let block = Block::default().title(" Regions ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Choropleth drawn as braille points plus a legend row.
fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(1)])
        .split(area);

    let max = app
        .view
        .as_ref()
        .and_then(|v| v.result.max_value())
        .unwrap_or(0.0);
    let geometry = &app.session().geometry;
    let (x_bounds, y_bounds) = geometry.bounds().map_or(([0.0, 1.0], [0.0, 1.0]), |b| {
        ([b.min().x, b.max().x], [b.min().y, b.max().y])
    });

    let canvas = Canvas::default()
        .block(Block::default().title(" Energy by region ").borders(Borders::ALL))
        .marker(symbols::Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(|ctx| {
            for raster in &app.rasters {
                let value = app.view.as_ref().and_then(|v| v.result.get(&raster.key));
                ctx.draw(&Points {
                    coords: &raster.points,
                    color: style::region_color(app.scale, value, max),
                });
            }
        });
    frame.render_widget(canvas, chunks[0]);

    let mut legend = vec![Span::raw(" 0 ")];
    for i in 0..LEGEND_STEPS {
        let t = i as f64 / (LEGEND_STEPS - 1) as f64;
        legend.push(Span::styled(
            "█",
            Style::default().fg(style::rgb(app.scale.color_at(t))),
        ));
    }
    legend.push(Span::raw(format!(" {} kWh  ", format_thousands(max))));
    legend.push(Span::styled("█", Style::default().fg(style::NO_DATA)));
    legend.push(Span::raw(" no data"));
    frame.render_widget(Paragraph::new(Line::from(legend)), chunks[1]);
}

/// Footer with keybinding hints.
fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        " q:Quit  Tab/Shift-Tab:Focus  ↑/↓:Select  r:Reload",
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
