use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::config::ColorConfig;
use crate::domain::Story;
use crate::preloader::{ImageCache, LoadOutcome};
use crate::tui::app::TuiApp;

const CARD_WIDTH: u16 = 22;
const STRIP_HEIGHT: u16 = 6;

pub fn render(frame: &mut Frame, app: &mut TuiApp, images: &ImageCache, colors: &ColorConfig) {
    app.screen_width = frame.area().width;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Main area
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    if app.is_loading() {
        render_centered(frame, chunks[0], "Loading stories...", colors.loading);
    } else if app.controller.is_open() {
        render_viewer(frame, app, chunks[0], colors);
    } else if app.stories().is_empty() {
        render_centered(frame, chunks[0], "No stories right now", colors.inactive_border);
    } else {
        let main = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(STRIP_HEIGHT), Constraint::Min(3)])
            .split(chunks[0]);
        render_strip(frame, app, images, main[0], colors);
        render_details(frame, app, images, main[1], colors);
    }

    render_status_bar(frame, app, chunks[1], colors);
}

fn render_centered(frame: &mut Frame, area: Rect, message: &str, color: ratatui::style::Color) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    let paragraph = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(Style::default().fg(color));
    frame.render_widget(paragraph, rows[1]);
}

/// First card index so the selected one stays visible.
fn strip_offset(selected: usize, visible: usize) -> usize {
    if visible == 0 {
        return selected;
    }
    (selected + 1).saturating_sub(visible)
}

fn render_strip(frame: &mut Frame, app: &TuiApp, images: &ImageCache, area: Rect, colors: &ColorConfig) {
    let visible = usize::from((area.width / CARD_WIDTH).max(1));
    let offset = strip_offset(app.selected, visible);
    let shown: Vec<(usize, &Story)> = app
        .stories()
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .collect();

    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Length(CARD_WIDTH); shown.len()])
        .split(area);

    for ((index, story), cell) in shown.into_iter().zip(cells.iter()) {
        let is_selected = index == app.selected;
        let border_style = if is_selected {
            Style::default().fg(colors.active_border)
        } else {
            Style::default().fg(colors.inactive_border)
        };
        let marker = if images.contains(story.lead()) { "●" } else { "○" };

        let lines = vec![
            Line::from(Span::styled(
                story.author.clone(),
                Style::default()
                    .fg(colors.author)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("▲ {}", story.ups),
                Style::default().fg(colors.ups),
            )),
            Line::from(format!("{} {} slide(s)", marker, story.slide_count())),
        ];

        let mut paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style),
        );
        if is_selected {
            paragraph = paragraph.style(
                Style::default()
                    .bg(colors.selection_bg)
                    .fg(colors.selection_fg),
            );
        }
        frame.render_widget(paragraph, *cell);
    }
}

fn render_details(frame: &mut Frame, app: &TuiApp, images: &ImageCache, area: Rect, colors: &ColorConfig) {
    let Some(story) = app.selected_story() else {
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            story.display_title().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("By: {}", story.author),
            Style::default().fg(colors.author),
        )),
        Line::from(Span::styled(
            format!("Ups: {}", story.ups),
            Style::default().fg(colors.ups),
        )),
    ];
    if let Some(link) = &story.link {
        lines.push(Line::from(format!("Link: {}", link)));
    }
    lines.push(Line::from(""));
    for slide in &story.preview {
        let size = images
            .get(slide)
            .map(|info| format!("{}x{}", info.width, info.height))
            .unwrap_or_else(|| "...".to_string());
        lines.push(Line::from(format!("{}  {}", size, slide)));
    }

    let block = Block::default()
        .title(format!(" Story {}/{} ", app.selected + 1, app.stories().len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.inactive_border));

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_viewer(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let (Some(position), Some(story)) = (app.controller.position(), app.controller.current_story())
    else {
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Progress segments
            Constraint::Min(3),    // Slide
        ])
        .split(area);

    let segments = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Ratio(1, story.slide_count().max(1) as u32);
            story.slide_count()
        ])
        .split(rows[0]);
    for (i, segment) in segments.iter().enumerate() {
        let color = if i < position.image {
            colors.progress_done
        } else if i == position.image {
            colors.progress_current
        } else {
            colors.progress_pending
        };
        let bar = "━".repeat(usize::from(segment.width.saturating_sub(1)));
        frame.render_widget(
            Paragraph::new(bar).style(Style::default().fg(color)),
            *segment,
        );
    }

    let body_style = if app.controller.is_transitioning() {
        Style::default().fg(colors.faded)
    } else {
        Style::default()
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                story.author.clone(),
                Style::default()
                    .fg(colors.author)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(format!("▲ {}", story.ups), Style::default().fg(colors.ups)),
        ]),
        Line::from(""),
    ];
    if !story.display_title().is_empty() {
        lines.push(Line::from(story.display_title().to_string()));
        lines.push(Line::from(""));
    }

    let slide = app.controller.current_slide().unwrap_or_default();
    lines.push(Line::from(slide.to_string()));
    lines.push(match app.current_outcome() {
        _ if app.controller.is_image_loading() => Line::from(Span::styled(
            "Loading...",
            Style::default().fg(colors.loading),
        )),
        Some(LoadOutcome::Loaded(info)) => Line::from(format!(
            "{}x{} ({} bytes)",
            info.width, info.height, info.bytes
        )),
        Some(LoadOutcome::Failed(reason)) => Line::from(format!("Unavailable: {}", reason)),
        None => Line::from(""),
    });

    let block = Block::default()
        .title(format!(
            " {}/{} · {}/{} ",
            position.story + 1,
            app.stories().len(),
            position.image + 1,
            story.slide_count()
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.active_border));

    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .style(body_style)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, rows[1]);
}

fn render_status_bar(frame: &mut Frame, app: &TuiApp, area: Rect, colors: &ColorConfig) {
    let status = if app.is_refreshing {
        "Refreshing stories...".to_string()
    } else if let Some(ref msg) = app.status_message {
        msg.clone()
    } else if app.is_loading() {
        "q:Quit".to_string()
    } else if app.controller.is_open() {
        "Click/Space:Next  Backspace:Prev  h/l:Story  o:Open  Esc:Close  q:Quit".to_string()
    } else {
        "h/l:Nav  Enter:Play  o:Open  R:Refresh  q:Quit".to_string()
    };

    let paragraph =
        Paragraph::new(status).style(Style::default().fg(colors.status_fg).bg(colors.status_bg));

    frame.render_widget(paragraph, area);
}
