mod theme;

use crate::app::{
    AppModel, DetailView, ListView, ReportRow, ReportSection, SyncState, View, build_report,
};
use crate::domain::{AssetSnapshot, display_or_na};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::time::{Duration, SystemTime};
use unicode_width::UnicodeWidthStr;

const SYNC_LABEL: &str = "Sync Data (Ctrl+R)";
const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const GAUGE_WIDTH: usize = 24;
const LABEL_WIDTH: usize = 22;

pub fn render(frame: &mut Frame, model: &AppModel) {
    let full_area = frame.area();
    if full_area.width == 0 || full_area.height == 0 {
        return;
    }

    let area = inner_area(full_area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(frame, chunks[0], model);
    render_search(frame, chunks[1], model);
    match &model.view {
        View::List(list_view) => render_list(frame, chunks[2], model, list_view),
        View::Detail(detail_view) => render_detail(frame, chunks[2], model, detail_view),
    }
    frame.render_widget(footer_line(model), chunks[3]);

    if model.help_open {
        render_help_overlay(frame, area);
    }
}

fn bordered(title: impl Into<Line<'static>>) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme::block_style())
        .padding(Padding::horizontal(1))
        .title(title)
}

fn render_header(frame: &mut Frame, area: Rect, model: &AppModel) {
    let header = model.header();
    let sync_text = match model.sync {
        SyncState::Idle => SYNC_LABEL.to_string(),
        SyncState::InFlight { started_at, .. } => {
            format!("{} Syncing…", spinner_frame(started_at.elapsed()))
        }
    };
    let sync_style = if model.sync.is_in_flight() {
        Style::default().fg(theme::MUTED)
    } else {
        Style::default()
            .fg(theme::ACCENT)
            .add_modifier(Modifier::BOLD)
    };

    let block = bordered(Line::from(vec![
        Span::styled(" Asset Inventory ", theme::title_style()),
        Span::styled(format!("· {} ", model.source_label), theme::label_style()),
    ]));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let sync_width = u16::try_from(UnicodeWidthStr::width(sync_text.as_str()) + 2)
        .unwrap_or(u16::MAX)
        .min(inner.width);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(sync_width)])
        .split(inner);

    let mut spans = Vec::new();
    if !header.initials.is_empty() {
        spans.push(Span::styled(
            format!(" {} ", header.initials),
            Style::default()
                .fg(theme::ACCENT)
                .bg(theme::ACCENT_BG)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));
    }
    if !header.owner_name.is_empty() {
        spans.push(Span::styled(
            truncate_end(&header.owner_name, usize::from(columns[0].width) / 2),
            Style::default().fg(theme::FG).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled("  ·  ", Style::default().fg(theme::DIM)));
    }
    spans.push(Span::styled(
        header.last_updated,
        Style::default().fg(theme::MUTED),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), columns[0]);
    frame.render_widget(
        Paragraph::new(Span::styled(sync_text, sync_style)).alignment(Alignment::Right),
        columns[1],
    );
}

fn spinner_frame(elapsed: Duration) -> &'static str {
    let index = (elapsed.as_millis() / 100) as usize % SPINNER.len();
    SPINNER[index]
}

fn render_search(frame: &mut Frame, area: Rect, model: &AppModel) {
    let text = if model.search.is_empty() {
        Text::from(Line::from(Span::styled(
            "Type to filter owners…",
            Style::default().fg(theme::DIM),
        )))
    } else {
        Text::from(model.search.text().to_string())
    };
    let block = bordered("Find Owners");
    let inner = block.inner(area);
    frame.render_widget(Paragraph::new(text).block(block), area);

    if matches!(model.view, View::List(_)) && !model.help_open && inner.width > 0 {
        let before: String = model.search.text().chars().take(model.search.cursor()).collect();
        let offset = u16::try_from(UnicodeWidthStr::width(before.as_str())).unwrap_or(u16::MAX);
        let x = inner.x.saturating_add(offset).min(inner.right().saturating_sub(1));
        frame.set_cursor_position(Position::new(x, inner.y));
    }
}

fn render_list(frame: &mut Frame, area: Rect, model: &AppModel, list_view: &ListView) {
    let snapshots = &model.data.snapshots;
    let filtered = &list_view.filtered_indices;
    let title = if filtered.len() == snapshots.len() {
        format!("Assets ({})", snapshots.len())
    } else {
        format!("Assets ({} of {})", filtered.len(), snapshots.len())
    };

    if filtered.is_empty() {
        let mut lines = vec![Line::from(Span::styled(
            "No asset data found.",
            Style::default().fg(theme::MUTED),
        ))];
        if !model.search.is_empty() {
            lines.push(Line::from(Span::styled(
                "Press Esc to clear the filter.",
                Style::default().fg(theme::DIM),
            )));
        }
        frame.render_widget(Paragraph::new(lines).block(bordered(title)), area);
        return;
    }

    let max_width = usize::from(area.width).saturating_sub(6);
    let items: Vec<ListItem> = filtered
        .iter()
        .filter_map(|index| snapshots.get(*index))
        .map(|snapshot| asset_list_item(snapshot, max_width))
        .collect();

    let list = List::new(items)
        .block(bordered(title))
        .highlight_style(
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");

    let mut state = ListState::default();
    state.select(Some(list_view.selected.min(filtered.len().saturating_sub(1))));
    frame.render_stateful_widget(list, area, &mut state);
}

fn asset_list_item(snapshot: &AssetSnapshot, max_width: usize) -> ListItem<'static> {
    let asset = &snapshot.asset;
    let hostname = display_or_na(asset.hostname.as_ref());
    let owner = snapshot.owner_name.clone();
    let owner_width = UnicodeWidthStr::width(owner.as_str()).min(max_width / 2);
    let owner = truncate_end(&owner, owner_width);

    let host_budget = max_width.saturating_sub(owner_width + 2);
    let hostname = truncate_end(&hostname, host_budget);
    let padding = max_width
        .saturating_sub(UnicodeWidthStr::width(hostname.as_str()))
        .saturating_sub(UnicodeWidthStr::width(owner.as_str()));

    let first = Line::from(vec![
        Span::styled(hostname, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" ".repeat(padding)),
        Span::styled(owner, Style::default().fg(theme::MUTED)),
    ]);

    let subtitle = format!(
        "{} {} • {}",
        display_or_na(asset.manufacturer.as_ref()),
        display_or_na(asset.model.as_ref()),
        display_or_na(asset.os.as_ref())
    );
    let second = Line::from(Span::styled(
        truncate_end(&subtitle, max_width),
        Style::default().fg(theme::DIM),
    ));

    ListItem::new(vec![first, second])
}

fn render_detail(frame: &mut Frame, area: Rect, model: &AppModel, detail_view: &DetailView) {
    let Some(snapshot) = model.detail_snapshot() else {
        let missing = Paragraph::new("Snapshot is no longer loaded. Press Esc to go back.")
            .block(bordered("Asset"));
        frame.render_widget(missing, area);
        return;
    };

    let title = format!(
        "{} · {}",
        display_or_na(snapshot.asset.hostname.as_ref()),
        snapshot.owner_name
    );
    let lines = report_lines(&build_report(snapshot));
    let paragraph = Paragraph::new(lines)
        .block(bordered(title))
        .scroll((detail_view.scroll, 0));
    frame.render_widget(paragraph, area);
}

fn report_lines(sections: &[ReportSection]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (index, section) in sections.iter().enumerate() {
        if index > 0 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            section.title.to_uppercase(),
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        )));
        lines.extend(section.rows.iter().map(report_row_line));
    }
    lines
}

fn report_row_line(row: &ReportRow) -> Line<'static> {
    match row {
        ReportRow::Item { title, aside, tone } => Line::from(vec![
            Span::styled(
                format!("  {title}"),
                Style::default().fg(theme::FG).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  ·  ", Style::default().fg(theme::DIM)),
            Span::styled(aside.clone(), Style::default().fg(theme::tone_color(*tone))),
        ]),
        ReportRow::Field { label, value } => Line::from(vec![
            Span::styled(
                pad_right(&format!("    {label}"), LABEL_WIDTH),
                theme::label_style(),
            ),
            Span::styled(value.clone(), Style::default().fg(theme::FG)),
        ]),
        ReportRow::Gauge {
            label,
            ratio,
            caption,
            tone,
        } => {
            let (filled, empty) = gauge_cells(*ratio, GAUGE_WIDTH);
            Line::from(vec![
                Span::styled(
                    pad_right(&format!("    {label}"), LABEL_WIDTH),
                    theme::label_style(),
                ),
                Span::styled(filled, Style::default().fg(theme::tone_color(*tone))),
                Span::styled(empty, Style::default().fg(theme::BORDER)),
                Span::raw(" "),
                Span::styled(caption.clone(), Style::default().fg(theme::FG)),
            ])
        }
        ReportRow::Empty(message) => Line::from(Span::styled(
            format!("  {message}"),
            Style::default().fg(theme::DIM),
        )),
    }
}

fn gauge_cells(ratio: f64, width: usize) -> (String, String) {
    let ratio = if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = ((ratio * width as f64).round() as usize).min(width);
    ("█".repeat(filled), "░".repeat(width - filled))
}

fn footer_line(model: &AppModel) -> Paragraph<'static> {
    let keys = match model.view {
        View::List(_) => {
            "Keys: arrows=move  Enter=open  type=filter  Esc=clear  Ctrl+R/F5=sync  Ctrl+Q=quit  F1=help"
        }
        View::Detail(_) => {
            "Keys: arrows/PgUp/PgDn=scroll  Esc=back  type=filter  Ctrl+R/F5=sync  Ctrl+Q=quit  F1=help"
        }
    };

    let mut spans = vec![Span::raw(keys.to_string())];
    if let Some(report) = &model.data.last_report {
        spans.push(Span::raw("  ·  "));
        spans.push(Span::raw(format!(
            "{report} ({})",
            relative_time_ago(model.data.synced_at)
        )));
    }
    if let Some(notice) = model.notice.as_deref().filter(|text| !text.trim().is_empty()) {
        spans.push(Span::raw("  ·  "));
        spans.push(Span::styled(
            notice.to_string(),
            Style::default().fg(theme::WARNING),
        ));
    }
    Paragraph::new(Line::from(spans)).style(Style::default().fg(theme::DIM))
}

fn relative_time_ago(time: Option<SystemTime>) -> String {
    let Some(moment) = time else {
        return "never".to_string();
    };
    let diff = SystemTime::now()
        .duration_since(moment)
        .unwrap_or(Duration::ZERO);
    if diff < Duration::from_secs(60) {
        return "just now".to_string();
    }
    humanize_duration(diff)
}

fn humanize_duration(duration: Duration) -> String {
    let minutes = duration.as_secs() / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

fn pad_right(text: &str, width: usize) -> String {
    let current = UnicodeWidthStr::width(text);
    if current >= width {
        return format!("{text} ");
    }
    format!("{}{}", text, " ".repeat(width - current))
}

fn truncate_end(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    let ellipsis = "…";
    let available = max_width.saturating_sub(UnicodeWidthStr::width(ellipsis));
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > available {
            break;
        }
        used += ch_width;
        out.push(ch);
    }
    out.push_str(ellipsis);
    out
}

fn inner_area(area: Rect) -> Rect {
    if area.width < 40 || area.height < 12 {
        return area;
    }
    area.inner(Margin {
        vertical: 1,
        horizontal: 2,
    })
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(70, 70, area);
    frame.render_widget(Clear, popup);

    let text = vec![
        Line::from("Asset list"),
        Line::from("  - Arrows, PgUp/PgDn, Home/End: move selection"),
        Line::from("  - Enter: open the asset report"),
        Line::from("  - Type: filter by owner name (Left/Right move the cursor)"),
        Line::from("  - Esc or Ctrl+U: clear the filter"),
        Line::from(""),
        Line::from("Asset report"),
        Line::from("  - Arrows, PgUp/PgDn, Home/End: scroll"),
        Line::from("  - Esc, Backspace or Left: back to the list"),
        Line::from("  - Type: start a new owner search"),
        Line::from(""),
        Line::from("Global"),
        Line::from("  - Ctrl+R or F5: sync from the records source"),
        Line::from("  - Ctrl+Q or Ctrl+C: quit"),
        Line::from("  - F1: toggle this help"),
    ];

    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(bordered("Help (F1 or Esc to close)"));
    frame.render_widget(paragraph, popup);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
