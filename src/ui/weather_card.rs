//! Current conditions card and forecast cards

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::data::{format_date, format_wind, WeatherSnapshot};

/// Width of a single forecast card
const FORECAST_CARD_WIDTH: u16 = 22;
/// Four lines of content plus borders
const FORECAST_CARD_HEIGHT: u16 = 6;

/// Color for temperature (warmer = more red, cooler = more blue)
pub fn temperature_color(temp: f64) -> Color {
    if temp >= 30.0 {
        Color::Red
    } else if temp >= 25.0 {
        Color::LightRed
    } else if temp >= 20.0 {
        Color::Yellow
    } else if temp >= 15.0 {
        Color::Green
    } else if temp >= 10.0 {
        Color::Cyan
    } else {
        Color::Blue
    }
}

/// Renders the current conditions card
pub fn render_current(frame: &mut Frame, area: Rect, weather: &WeatherSnapshot) {
    let place = if weather.country.is_empty() {
        weather.city.clone()
    } else {
        format!("{}, {}", weather.city, weather.country)
    };

    let lines = vec![
        Line::from(Span::styled(
            format!("\u{1F4CD} {}", place), // 📍
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::raw(weather.description.clone())),
        Line::from(Span::styled(
            format!("{}°C", weather.temperature),
            Style::default()
                .fg(temperature_color(weather.temperature))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("Humidity: {}%", weather.humidity)),
        Line::from(format!("Wind: {}", format_wind(weather.wind_speed))),
    ];

    let block = Block::default()
        .title(" Current Weather ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

/// Renders the forecast as a grid of day cards
///
/// Cards wrap onto as many rows as the width requires. When the grid does not
/// fit the height, each day collapses to a single line instead, so no day is
/// ever left out.
pub fn render_forecast(frame: &mut Frame, area: Rect, forecast: &[WeatherSnapshot]) {
    if forecast.is_empty() || area.height < 2 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let title = Paragraph::new(Line::from(Span::styled(
        format!("{}-Day Weather Forecast", forecast.len()),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    let grid = chunks[1];
    let per_row = usize::from((grid.width / FORECAST_CARD_WIDTH).max(1));
    let rows = forecast.len().div_ceil(per_row);
    if rows * usize::from(FORECAST_CARD_HEIGHT) > usize::from(grid.height) {
        render_forecast_lines(frame, grid, forecast);
        return;
    }

    let mut row_constraints = vec![Constraint::Length(FORECAST_CARD_HEIGHT); rows];
    row_constraints.push(Constraint::Min(0));
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(grid);

    for (days, row_area) in forecast.chunks(per_row).zip(row_areas.iter()) {
        let mut constraints = vec![Constraint::Length(FORECAST_CARD_WIDTH); days.len()];
        constraints.push(Constraint::Min(0));
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(*row_area);

        for (day, card_area) in days.iter().zip(cards.iter()) {
            render_day_card(frame, *card_area, day);
        }
    }
}

/// One line per day, for terminals too short for the card grid
fn render_forecast_lines(frame: &mut Frame, area: Rect, forecast: &[WeatherSnapshot]) {
    let lines: Vec<Line> = forecast
        .iter()
        .map(|day| {
            Line::from(vec![
                Span::styled(
                    format!("{:<18}", format_date(&day.date)),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("{:>7} ", format!("{}°C", day.temperature)),
                    Style::default().fg(temperature_color(day.temperature)),
                ),
                Span::raw(format!(
                    " {}  Humidity: {}%  Wind: {}",
                    day.description,
                    day.humidity,
                    format_wind(day.wind_speed)
                )),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_day_card(frame: &mut Frame, area: Rect, day: &WeatherSnapshot) {
    let lines = vec![
        Line::from(Span::raw(day.description.clone())),
        Line::from(Span::styled(
            format!("{}°C", day.temperature),
            Style::default()
                .fg(temperature_color(day.temperature))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("Humidity: {}%", day.humidity)),
        Line::from(format!("Wind: {}", format_wind(day.wind_speed))),
    ];

    let block = Block::default()
        .title(format!(" {} ", format_date(&day.date)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}
