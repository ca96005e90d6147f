//! UI rendering module for Skycast
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod help_overlay;
pub mod search;
pub mod weather_card;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;

pub use help_overlay::render as render_help_overlay;

/// Height of the current conditions card
const CURRENT_CARD_HEIGHT: u16 = 7;

/// Renders the whole screen for the current state
///
/// Layout, top to bottom: title, search box, status line, current
/// conditions, forecast, key hints. The suggestion dropdown and the help
/// overlay are drawn last so they sit on top.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(3), // Search box
            Constraint::Length(1), // Status
            Constraint::Min(0),    // Results
            Constraint::Length(1), // Help text
        ])
        .split(area);

    let title = Paragraph::new(Line::from(Span::styled(
        "Weather Forecast",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    search::render_input(frame, app, chunks[1]);
    search::render_status(frame, app, chunks[2]);

    let current_height = if app.weather.is_some() {
        CURRENT_CARD_HEIGHT
    } else {
        0
    };
    let results = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(current_height), Constraint::Min(0)])
        .split(chunks[3]);

    if let Some(weather) = &app.weather {
        weather_card::render_current(frame, results[0], weather);
    }
    weather_card::render_forecast(frame, results[1], &app.forecast);

    search::render_help(frame, app, chunks[4]);
    search::render_suggestions(frame, app, chunks[1]);

    if app.show_help {
        render_help_overlay(frame);
    }
}
