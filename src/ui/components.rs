// Drawing code for every screen and overlay. Pure functions of `View`.

use super::app::{Overlay, Screen, Setting, MIN_GRID_ROWS, SETTINGS};
use super::events::SHORTCUTS;
use super::picker::FolderPicker;
use crate::audio::{ControllerSnapshot, PlaybackState};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

const COLUMN_WIDTH: u16 = 24;

pub struct View<'a> {
    pub screen: Screen,
    pub overlay: &'a Overlay,
    pub snapshot: &'a ControllerSnapshot,
    pub cursor: usize,
    pub background: Color,
    pub status: Option<&'a str>,
    pub auto_play: bool,
    pub flashing: bool,
}

/// Draw a frame. Returns how many songs fit in one grid column.
pub fn render(f: &mut Frame, view: &View) -> usize {
    let area = f.area();
    f.render_widget(Block::default().style(Style::default().bg(view.background)), area);

    let rows = match view.screen {
        Screen::Menu => {
            render_menu(f, area);
            MIN_GRID_ROWS
        }
        Screen::Main => render_main(f, area, view),
    };

    match view.overlay {
        Overlay::None => {}
        Overlay::Settings { cursor } => render_settings(f, area, view, *cursor),
        Overlay::Picker(picker) => render_picker(f, area, picker),
        Overlay::ConfirmQuit => render_confirm_quit(f, area),
    }

    rows
}

fn title_block(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(Color::Red)
                .bg(Color::Rgb(255, 165, 0))
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL))
}

fn render_menu(f: &mut Frame, area: Rect) {
    let popup = centered_rect(50, 50, area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(popup);

    f.render_widget(title_block("Music player!"), chunks[0]);

    let art = Paragraph::new(vec![
        Line::from(""),
        Line::from("♪ ♫ ♪"),
        Line::from(""),
    ])
    .alignment(Alignment::Center)
    .style(Style::default().fg(Color::Yellow));
    f.render_widget(art, chunks[1]);

    let start = Paragraph::new("Start! (Enter)")
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(Color::Red)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(start, chunks[2]);
}

fn render_main(f: &mut Frame, area: Rect, view: &View) -> usize {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Now playing
            Constraint::Min(5),    // Songs
            Constraint::Length(3), // Controls
            Constraint::Length(3), // Status
        ])
        .split(area);

    f.render_widget(title_block("Music player!"), chunks[0]);
    render_now_playing(f, chunks[1], view.snapshot);
    let rows = render_song_grid(f, chunks[2], view);
    render_controls(f, chunks[3], view);
    render_status_bar(f, chunks[4], view.status);
    rows
}

fn render_now_playing(f: &mut Frame, area: Rect, snapshot: &ControllerSnapshot) {
    let name = snapshot
        .current_song
        .as_ref()
        .map(|song| song.name().to_string())
        .unwrap_or_else(|| "-".to_string());

    let line = Line::from(vec![
        Span::styled(
            " Now playing: ",
            Style::default().fg(Color::Red).bg(Color::Yellow),
        ),
        Span::raw(" "),
        Span::styled(
            name,
            Style::default()
                .fg(Color::Red)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let widget = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::Blue)),
    );
    f.render_widget(widget, area);
}

fn render_song_grid(f: &mut Frame, area: Rect, view: &View) -> usize {
    let snapshot = view.snapshot;
    let title = if snapshot.base_path.as_os_str().is_empty() {
        "Songs".to_string()
    } else {
        format!("Songs - {}", snapshot.base_path.display())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = (inner.height as usize).max(MIN_GRID_ROWS);

    if snapshot.songs.is_empty() {
        let hint = Paragraph::new("No songs. Press 'o' to choose a folder.")
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        f.render_widget(hint, inner);
        return rows;
    }

    let total_columns = snapshot.songs.len().div_ceil(rows);
    let visible_columns = ((inner.width / COLUMN_WIDTH) as usize).max(1);
    let cursor_column = view.cursor / rows;
    let first_column = cursor_column.saturating_sub(visible_columns - 1);
    let shown = visible_columns.min(total_columns.saturating_sub(first_column));

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Length(COLUMN_WIDTH); shown])
        .split(inner);

    for (slot, column) in (first_column..first_column + shown).enumerate() {
        let start = column * rows;
        let end = (start + rows).min(snapshot.songs.len());

        let items: Vec<ListItem> = (start..end)
            .map(|index| {
                let song = &snapshot.songs[index];
                let mut style = Style::default().fg(Color::Red).bg(if index % 2 == 0 {
                    Color::Yellow
                } else {
                    Color::LightBlue
                });
                if snapshot.current == Some(index) {
                    style = style.fg(Color::Green).add_modifier(Modifier::BOLD);
                }
                if view.cursor == index {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                ListItem::new(format!(" {} ", song.name())).style(style)
            })
            .collect();

        f.render_widget(List::new(items), columns[slot]);
    }

    rows
}

fn render_controls(f: &mut Frame, area: Rect, view: &View) {
    let state_text = match view.snapshot.state {
        PlaybackState::Playing => "▶ Playing",
        PlaybackState::Paused => "⏸ Paused",
        PlaybackState::Selected => "● Selected",
        PlaybackState::Idle => "⏹ Stopped",
    };

    let mut spans = vec![
        Span::styled(
            format!(" {} ", state_text),
            Style::default().fg(Color::Red).bg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  Enter Play  p Pause  u Unpause  s Stop  o Folder  , Settings"),
    ];
    if view.auto_play {
        let label = if view.snapshot.auto_play_running {
            "  [auto-play running]"
        } else {
            "  [auto-play]"
        };
        spans.push(Span::styled(label, Style::default().fg(Color::Green)));
    }

    let widget = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(widget, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, status: Option<&str>) {
    let status = Paragraph::new(status.unwrap_or("Ready"))
        .style(Style::default().fg(Color::Green))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}

fn render_settings(f: &mut Frame, area: Rect, view: &View, cursor: usize) {
    let popup = centered_rect(50, 70, area);
    f.render_widget(Clear, popup);

    let mut lines = vec![
        Line::from(vec![Span::styled(
            "Settings",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
    ];

    for (index, setting) in SETTINGS.iter().enumerate() {
        let (label, enabled) = match setting {
            Setting::AutoPlay => ("Auto play", view.auto_play),
            Setting::FlashingBackground => ("Flashing background", view.flashing),
        };
        let mark = if enabled { "[x]" } else { "[ ]" };
        let mut style = Style::default().fg(Color::Red).bg(if index % 2 == 0 {
            Color::Yellow
        } else {
            Color::LightGreen
        });
        if index == cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::from(Span::styled(format!(" {} {} ", mark, label), style)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![Span::styled(
        "Shortcuts",
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )]));
    for (action, keys) in SHORTCUTS {
        lines.push(Line::from(format!("  {:<16} {}", format!("{}:", action), keys)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Space toggle · Enter/Esc done"));

    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Settings")
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .style(Style::default().fg(Color::White).bg(Color::Black));
    f.render_widget(widget, popup);
}

fn render_picker(f: &mut Frame, area: Rect, picker: &FolderPicker) {
    let popup = centered_rect(70, 70, area);
    f.render_widget(Clear, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(popup);

    let items: Vec<ListItem> = picker
        .entries()
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            ListItem::new(format!("{}/", name))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Open folder: {}", picker.current().display()))
                .border_style(Style::default().fg(Color::Green)),
        )
        .style(Style::default().fg(Color::White).bg(Color::Black))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("► ");

    let mut state = ListState::default();
    state.select(picker.selected());
    f.render_stateful_widget(list, chunks[0], &mut state);

    let help = Paragraph::new("Enter open · Backspace up · o choose this folder · Esc cancel")
        .style(Style::default().fg(Color::White).bg(Color::Black))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[1]);
}

fn render_confirm_quit(f: &mut Frame, area: Rect) {
    let popup = centered_rect(40, 20, area);
    f.render_widget(Clear, popup);

    let widget = Paragraph::new(vec![
        Line::from(""),
        Line::from("Do you wish to quit?"),
        Line::from(""),
        Line::from("y / n"),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Exit")
            .border_style(Style::default().fg(Color::Red)),
    )
    .style(Style::default().fg(Color::White).bg(Color::Black));
    f.render_widget(widget, popup);
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
