//! Search box, suggestion dropdown and status line

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;

/// Maximum number of suggestions shown in the dropdown
const MAX_VISIBLE_SUGGESTIONS: usize = 8;

/// Renders the query input box
pub fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let content = if app.query.is_empty() {
        Line::from(Span::styled(
            "Enter city name...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(vec![
            Span::styled(app.query.clone(), Style::default().fg(Color::White)),
            Span::styled("▏", Style::default().fg(Color::Cyan)),
        ])
    };

    let block = Block::default()
        .title(" City ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    frame.render_widget(Paragraph::new(content).block(block), area);
}

/// Renders the suggestion dropdown directly below the input box
///
/// Drawn over whatever is underneath, like a popup.
pub fn render_suggestions(frame: &mut Frame, app: &App, input_area: Rect) {
    if app.suggestions.is_empty() {
        return;
    }

    let screen = frame.area();
    let visible = app.suggestions.len().min(MAX_VISIBLE_SUGGESTIONS);
    let top = input_area.y + input_area.height;
    let available = screen.height.saturating_sub(top);
    let height = (visible as u16 + 2).min(available);
    if height < 3 {
        return;
    }

    let area = Rect::new(input_area.x, top, input_area.width, height);

    let lines: Vec<Line> = app
        .suggestions
        .iter()
        .take(visible)
        .enumerate()
        .map(|(index, suggestion)| {
            let is_highlighted = app.highlighted == Some(index);
            let cursor = if is_highlighted { "\u{25B8} " } else { "  " }; // ▸ or space
            let style = if is_highlighted {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(vec![
                Span::styled(cursor, Style::default().fg(Color::Cyan)),
                Span::styled(suggestion.to_string(), style),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Renders the loading indicator or the current error message
pub fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.is_loading() {
        Line::from(Span::styled(
            "⟳ Loading...",
            Style::default().fg(Color::Cyan),
        ))
    } else if let Some(error) = &app.error {
        Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))
    } else {
        Line::default()
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// Renders the key hints at the bottom of the screen
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let search_style = if app.can_search() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let locate_style = if app.geolocation_supported() && !app.is_loading() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let help_text = Line::from(vec![
        Span::styled("Enter", search_style),
        Span::raw(" Search  "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Suggestions  "),
        Span::styled("Ctrl+L", locate_style),
        Span::raw(" My location  "),
        Span::styled("F1", Style::default().fg(Color::Yellow)),
        Span::raw(" Help  "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" Quit"),
    ]);

    let paragraph = Paragraph::new(help_text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}
