//! Drawing. Everything here maps an already computed
//! [`Dashboard`](crate::aggregate::Dashboard) onto
//! widgets; no filtering or aggregation happens in this module.

use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::symbols;
use tui::text::{Span, Spans};
use tui::widgets::{
    Axis, Block, Borders, Cell, Chart, Dataset as Series, GraphType, List, ListItem, ListState,
    Paragraph, Row, Table, Tabs, Wrap,
};
use tui::Frame;

use crate::aggregate::{CompanyDistribution, CorrelationMatrix, GroupMean, YearMean};
use crate::app::{App, Panel};
use crate::dataset::Dimension;
use crate::stats::BoxStats;

const FOOTER_NOTE: &'static str = "Note: Use the sidebar filters to customize your view.";
const KEY_HELP: &'static str =
    "Tab focus | ↑↓ move | Space toggle | a all | c clear | r reset | ←→/1-5 chart | q quit";

const COOLWARM: [Color; 6] = [
    Color::Rgb(180, 4, 38),
    Color::Rgb(221, 96, 76),
    Color::Rgb(244, 154, 123),
    Color::Rgb(170, 199, 253),
    Color::Rgb(116, 151, 244),
    Color::Rgb(59, 76, 192),
];
const VIRIDIS: [Color; 5] = [
    Color::Rgb(68, 1, 84),
    Color::Rgb(59, 82, 139),
    Color::Rgb(33, 145, 140),
    Color::Rgb(94, 201, 98),
    Color::Rgb(253, 231, 37),
];
const MAGMA: [Color; 5] = [
    Color::Rgb(252, 253, 191),
    Color::Rgb(254, 159, 109),
    Color::Rgb(222, 73, 104),
    Color::Rgb(140, 41, 129),
    Color::Rgb(59, 15, 112),
];

pub fn draw<B: Backend>(f: &mut Frame<B>, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(28), Constraint::Percentage(72)].as_ref())
        .split(f.size());

    draw_sidebar(f, app, chunks[0]);

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(4),
            ]
            .as_ref(),
        )
        .split(chunks[1]);

    draw_header(f, app, main_chunks[0]);

    let tabs = Tabs::new(
        Panel::ALL
            .iter()
            .enumerate()
            .map(|(i, panel)| Spans::from(format!("{} {}", i + 1, panel.tab_label())))
            .collect(),
    )
    .select(app.panel.into())
    .block(Block::default().borders(Borders::ALL))
    .style(Style::default().fg(Color::Cyan))
    .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    .divider(Span::raw("|"));
    f.render_widget(tabs, main_chunks[1]);

    let dashboard = &app.dashboard;
    let area = main_chunks[2];
    let block = Block::default().title(app.panel_title()).borders(Borders::ALL);
    match app.panel {
        Panel::SalaryByJob => {
            let items: Vec<(&str, f64)> =
                dashboard.by_job.iter().map(|g| (g.key.as_str(), g.mean)).collect();
            draw_hbars(f, block, area, &items, &COOLWARM, format_usd, "Average Salary (USD)");
        }
        Panel::TopCompanies => draw_boxes(
            f,
            block,
            area,
            &dashboard.distributions,
            &dashboard.top_companies,
        ),
        Panel::JobsByLocation => {
            let items: Vec<(&str, f64)> = dashboard
                .by_location
                .iter()
                .map(|g| (g.key.as_str(), g.count as f64))
                .collect();
            draw_hbars(f, block, area, &items, &VIRIDIS, format_count, "Number of Jobs");
        }
        Panel::SalaryByYear => draw_trend(f, block, area, &dashboard.by_year),
        Panel::Correlation => draw_heatmap(f, block, area, &dashboard.correlation),
    }

    let footer = Paragraph::new(vec![
        Spans::from(Span::styled(
            FOOTER_NOTE,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Spans::from(Span::styled(KEY_HELP, Style::default().fg(Color::DarkGray))),
    ])
    .block(Block::default().borders(Borders::TOP))
    .wrap(Wrap { trim: true });
    f.render_widget(footer, main_chunks[3]);
}

fn draw_header<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let dataset = app.dataset();
    let source = dataset
        .source
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "in-memory data".to_string());
    let lines = vec![
        Spans::from(Span::styled(
            app.title.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Spans::from(showing_text(app.dashboard.record_count)),
        Spans::from(Span::styled(
            format!(
                "{} of {} records from {}, loaded {}",
                app.dashboard.record_count,
                app.dashboard.total_records,
                source,
                dataset.loaded_at.format("%Y-%m-%d %H:%M:%S")
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

pub fn showing_text(count: usize) -> String {
    format!("Showing {} records after filtering.", count)
}

fn draw_sidebar<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ]
            .as_ref(),
        )
        .split(area);

    for dimension in Dimension::ALL {
        let selection = app.filters.selection(dimension);
        let options = app.options(dimension);
        let items: Vec<ListItem> = options
            .iter()
            .map(|value| {
                let checked = selection.contains(value);
                let mark = if checked { "[x] " } else { "[ ] " };
                let style = if checked {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                ListItem::new(Spans::from(Span::styled(format!("{}{}", mark, value), style)))
            })
            .collect();

        let focused = app.focus == dimension;
        // An empty control filters out every row.
        let border = if selection.is_empty() {
            Style::default().fg(Color::Red)
        } else if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let title = format!("{} ({}/{})", dimension.label(), selection.len(), options.len());
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL).border_style(border))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        let mut state = ListState::default();
        if focused && !options.is_empty() {
            state.select(Some(app.cursor(dimension)));
        }
        f.render_stateful_widget(list, chunks[usize::from(dimension)], &mut state);
    }
}

fn draw_empty<B: Backend>(f: &mut Frame<B>, block: Block, area: Rect) {
    draw_note(f, block, area, "No data for the current selection.");
}

fn draw_note<B: Backend>(f: &mut Frame<B>, block: Block, area: Rect, note: &str) {
    let paragraph = Paragraph::new(note.to_string())
        .block(block)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

/// One horizontal bar: label, bar length in cells and formatted value.
#[derive(Debug, Clone, PartialEq)]
pub struct HBar {
    pub label: String,
    pub length: usize,
    pub value: String,
}

/// Lays out horizontal bars in `width` cells, scaled to the largest value.
pub fn hbars(items: &[(&str, f64)], width: usize, format: fn(f64) -> String) -> Vec<HBar> {
    let label_width = items
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0)
        .min(width / 3);
    let values: Vec<String> = items.iter().map(|(_, v)| format(*v)).collect();
    let value_width = values.iter().map(|v| v.chars().count()).max().unwrap_or(0);
    let bar_space = width.saturating_sub(label_width + value_width + 2);
    let max = items.iter().map(|(_, v)| *v).fold(0.0, f64::max);

    items
        .iter()
        .zip(values)
        .map(|((label, value), text)| {
            let length = if max > 0.0 {
                ((value.max(0.0) / max) * bar_space as f64).round() as usize
            } else {
                0
            };
            HBar {
                label: fit(label, label_width),
                length,
                value: text,
            }
        })
        .collect()
}

fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        format!("{:<width$}", text, width = width)
    } else if width > 1 {
        let mut cut: String = text.chars().take(width - 1).collect();
        cut.push('…');
        cut
    } else {
        text.chars().take(width).collect()
    }
}

fn draw_hbars<B: Backend>(
    f: &mut Frame<B>,
    block: Block,
    area: Rect,
    items: &[(&str, f64)],
    palette: &[Color],
    format: fn(f64) -> String,
    axis: &str,
) {
    if items.is_empty() {
        draw_empty(f, block, area);
        return;
    }
    let inner_width = area.width.saturating_sub(2) as usize;
    let mut lines: Vec<Spans> = hbars(items, inner_width, format)
        .into_iter()
        .enumerate()
        .map(|(i, bar)| {
            let color = palette[i * palette.len() / items.len().max(1) % palette.len()];
            Spans::from(vec![
                Span::raw(format!("{} ", bar.label)),
                Span::styled("█".repeat(bar.length), Style::default().fg(color)),
                Span::raw(format!(" {}", bar.value)),
            ])
        })
        .collect();
    lines.push(Spans::from(Span::styled(
        axis.to_string(),
        Style::default().fg(Color::DarkGray),
    )));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// Renders one box plot on a `width` cell axis running from `low` to `high`.
pub fn box_line(stats: &BoxStats, low: f64, high: f64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let position = |value: f64| -> usize {
        if high <= low {
            width / 2
        } else {
            (((value - low) / (high - low)) * (width - 1) as f64)
                .round()
                .clamp(0.0, (width - 1) as f64) as usize
        }
    };
    let mut cells = vec![' '; width];
    let (wl, q1, median, q3, wh) = (
        position(stats.whisker_low),
        position(stats.q1),
        position(stats.median),
        position(stats.q3),
        position(stats.whisker_high),
    );
    for cell in &mut cells[wl..=wh] {
        *cell = '─';
    }
    cells[wl] = '├';
    cells[wh] = '┤';
    for cell in &mut cells[q1..=q3] {
        *cell = '█';
    }
    cells[median] = '┃';
    for outlier in &stats.outliers {
        cells[position(*outlier)] = '∘';
    }
    cells.into_iter().collect()
}

fn draw_boxes<B: Backend>(
    f: &mut Frame<B>,
    block: Block,
    area: Rect,
    distributions: &[CompanyDistribution],
    ranked: &[GroupMean],
) {
    if distributions.is_empty() {
        draw_empty(f, block, area);
        return;
    }
    let (low, high) = distributions
        .iter()
        .map(|d| d.stats.extent())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |acc, (lo, hi)| {
            (acc.0.min(lo), acc.1.max(hi))
        });
    let inner_width = area.width.saturating_sub(2) as usize;
    let label_width = distributions
        .iter()
        .map(|d| d.company.chars().count())
        .max()
        .unwrap_or(0)
        .min(inner_width / 3);
    let means: Vec<String> = distributions
        .iter()
        .map(|d| {
            ranked
                .iter()
                .find(|g| g.key == d.company)
                .map(|g| format_usd(g.mean))
                .unwrap_or_default()
        })
        .collect();
    let mean_width = means.iter().map(|m| m.chars().count()).max().unwrap_or(0);
    let margin = label_width + mean_width + 2;
    let plot_width = inner_width.saturating_sub(margin);

    let mut lines: Vec<Spans> = distributions
        .iter()
        .enumerate()
        .zip(&means)
        .map(|((i, d), mean)| {
            let color = MAGMA[i % MAGMA.len()];
            Spans::from(vec![
                Span::raw(format!("{} ", fit(&d.company, label_width))),
                Span::styled(
                    format!("{:>width$} ", mean, width = mean_width),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    box_line(&d.stats, low, high, plot_width),
                    Style::default().fg(color),
                ),
            ])
        })
        .collect();

    let left = format_usd(low);
    let right = format_usd(high);
    let gap = plot_width.saturating_sub(left.chars().count() + right.chars().count());
    lines.push(Spans::from(Span::styled(
        format!("{}{}{}{}", " ".repeat(margin), left, " ".repeat(gap), right),
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Spans::from(Span::styled(
        "Salary (USD)",
        Style::default().fg(Color::DarkGray),
    )));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// Axis bounds padded so a single point or a flat line stays visible.
pub fn padded_bounds(low: f64, high: f64) -> [f64; 2] {
    if high > low {
        let pad = (high - low) * 0.05;
        [low - pad, high + pad]
    } else {
        [low - 1.0, high + 1.0]
    }
}

fn draw_trend<B: Backend>(f: &mut Frame<B>, block: Block, area: Rect, by_year: &[YearMean]) {
    if by_year.is_empty() {
        draw_empty(f, block, area);
        return;
    }
    if area.width < 16 || area.height < 6 {
        draw_note(f, block, area, "Terminal too small for this chart.");
        return;
    }
    let points: Vec<(f64, f64)> = by_year.iter().map(|y| (y.year as f64, y.mean)).collect();
    let x_bounds = padded_bounds(points[0].0, points[points.len() - 1].0);
    let (y_low, y_high) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |acc, p| (acc.0.min(p.1), acc.1.max(p.1)));
    let y_bounds = padded_bounds(y_low, y_high);

    let series = vec![
        Series::default()
            .name("Average salary")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&points),
        Series::default()
            .marker(symbols::Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&points),
    ];
    let x_labels = vec![
        Span::raw(by_year[0].year.to_string()),
        Span::raw(by_year[by_year.len() - 1].year.to_string()),
    ];
    let y_labels = vec![
        Span::raw(format_usd(y_bounds[0])),
        Span::raw(format_usd((y_bounds[0] + y_bounds[1]) / 2.0)),
        Span::raw(format_usd(y_bounds[1])),
    ];
    let chart = Chart::new(series)
        .block(block)
        .x_axis(
            Axis::default()
                .title("Year")
                .style(Style::default().fg(Color::Gray))
                .bounds(x_bounds)
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("Average Salary (USD)")
                .style(Style::default().fg(Color::Gray))
                .bounds(y_bounds)
                .labels(y_labels),
        );
    f.render_widget(chart, area);
}

/// Blue for -1, light grey for 0, red for +1.
pub fn heat_color(r: f64) -> Color {
    const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const HOT: (f64, f64, f64) = (180.0, 4.0, 38.0);
    let r = r.clamp(-1.0, 1.0);
    let (target, t) = if r < 0.0 { (COLD, -r) } else { (HOT, r) };
    let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    Color::Rgb(
        mix(NEUTRAL.0, target.0),
        mix(NEUTRAL.1, target.1),
        mix(NEUTRAL.2, target.2),
    )
}

/// Two-decimal annotation; blank where the coefficient is undefined.
pub fn heat_label(r: f64) -> String {
    if r.is_nan() {
        String::new()
    } else {
        format!("{:.2}", r)
    }
}

fn draw_heatmap<B: Backend>(f: &mut Frame<B>, block: Block, area: Rect, matrix: &CorrelationMatrix) {
    if matrix.is_empty() {
        draw_empty(f, block, area);
        return;
    }
    let n = matrix.len();
    let name_width = matrix
        .columns
        .iter()
        .map(|c| c.chars().count())
        .max()
        .unwrap_or(0)
        .min(18);
    let cell_width = matrix
        .columns
        .iter()
        .map(|c| c.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(5, 12);

    let header = Row::new(
        std::iter::once(Cell::from(""))
            .chain(matrix.columns.iter().map(|c| Cell::from(fit(c, cell_width))))
            .collect::<Vec<_>>(),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = (0..n)
        .map(|i| {
            let mut cells = vec![Cell::from(fit(&matrix.columns[i], name_width))
                .style(Style::default().add_modifier(Modifier::BOLD))];
            for j in 0..n {
                let r = matrix.get(i, j);
                let cell = Cell::from(format!("{:^width$}", heat_label(r), width = cell_width));
                cells.push(if r.is_nan() {
                    cell
                } else {
                    cell.style(Style::default().fg(Color::Black).bg(heat_color(r)))
                });
            }
            Row::new(cells)
        })
        .collect();

    let widths: Vec<Constraint> = std::iter::once(Constraint::Length(name_width as u16))
        .chain((0..n).map(|_| Constraint::Length(cell_width as u16)))
        .collect();
    let table = Table::new(rows)
        .header(header)
        .block(block)
        .widths(&widths)
        .column_spacing(1);
    f.render_widget(table, area);
}

pub fn format_usd(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

fn format_count(value: f64) -> String {
    format!("{}", value.round() as u64)
}
