use card_gate::{
    GameState,
    Side,
    notification::Notification,
};
use color_eyre::eyre::Result;
use crossterm::{
    event::{
        Event,
        EventStream,
        KeyCode,
        KeyEvent,
        KeyEventKind,
        KeyModifiers,
        MouseButton,
        MouseEvent,
        MouseEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use futures::StreamExt;
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;

const TITLE: &str = "Try Your Luck";
const ATTEMPTED_BANNER: &str =
    "You've already chosen. Refresh a few times to try for one last chance.";
const MODAL_HINT: &str =
    "Hint: our link just might be on the page - check the bottom of the page.";
const HELP: &str = "←/→ select | Enter choose | 1/2 pick | r reload | q/Esc quit";
const ACCENT_MARKERS: [&str; 2] = ["Success", "One Last"];
const ALARM_WORDS: [&str; 5] = ["Oops", "Wrong", "Game", "Over", "Lost"];

pub enum UserEvent {
    Quit,
    Choose(Side),
    Reload,
    Resize(u16, u16),
    Redraw,
}

/// What the screen should show right now.
pub enum View<'a> {
    Loading,
    Ready {
        state: GameState,
        notification: Option<&'a Notification>,
        destination_host: &'a str,
    },
}

#[derive(Debug)]
pub struct UiState {
    focus: Side,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
    card_areas: [Rect; 2],
}

impl Default for UiState {
    fn default() -> Self {
        UiState {
            focus: Side::Left,
            terminal: None,
            card_areas: [Rect::default(); 2],
        }
    }
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    Ok(())
}

pub fn viewport() -> Option<(u16, u16)> {
    crossterm::terminal::size().ok()
}

pub fn input_event_stream() -> EventStream {
    EventStream::new()
}

pub fn draw(state: &mut UiState, view: &View<'_>) -> Result<()> {
    let focus = state.focus;
    let mut card_areas = state.card_areas;
    if let Some(mut term) = state.terminal.take() {
        let drawn = term
            .draw(|f| card_areas = ui(f, focus, view))
            .map(|_| ());
        state.terminal = Some(term);
        drawn?;
    }
    state.card_areas = card_areas;
    Ok(())
}

pub async fn next_event(state: &mut UiState, events: &mut EventStream) -> Result<UserEvent> {
    loop {
        let Some(event) = events.next().await else {
            return Ok(UserEvent::Quit);
        };
        match event? {
            Event::Key(key) => {
                if let Some(ev) = on_key(state, key) {
                    return Ok(ev);
                }
            }
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                ..
            }) => {
                let hit = Position::new(column, row);
                if let Some(side) = Side::ALL
                    .into_iter()
                    .zip(state.card_areas)
                    .find_map(|(side, area)| area.contains(hit).then_some(side))
                {
                    state.focus = side;
                    return Ok(UserEvent::Choose(side));
                }
            }
            Event::Resize(width, height) => return Ok(UserEvent::Resize(width, height)),
            _ => {}
        }
    }
}

fn on_key(state: &mut UiState, key: KeyEvent) -> Option<UserEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(UserEvent::Quit)
        }
        KeyCode::Char('q') | KeyCode::Esc => Some(UserEvent::Quit),
        KeyCode::Left | KeyCode::Char('h') => {
            state.focus = Side::Left;
            Some(UserEvent::Redraw)
        }
        KeyCode::Right | KeyCode::Char('l') => {
            state.focus = Side::Right;
            Some(UserEvent::Redraw)
        }
        KeyCode::Tab => {
            state.focus = state.focus.opposite();
            Some(UserEvent::Redraw)
        }
        KeyCode::Enter | KeyCode::Char(' ') => Some(UserEvent::Choose(state.focus)),
        KeyCode::Char('1') => {
            state.focus = Side::Left;
            Some(UserEvent::Choose(Side::Left))
        }
        KeyCode::Char('2') => {
            state.focus = Side::Right;
            Some(UserEvent::Choose(Side::Right))
        }
        KeyCode::Char('r') => Some(UserEvent::Reload),
        _ => None,
    }
}

fn ui(f: &mut Frame, focus: Side, view: &View<'_>) -> [Rect; 2] {
    // Clear the whole frame to avoid leftover fragments
    f.render_widget(Clear, f.area());
    match view {
        View::Loading => {
            let area = centered_rect(30, 20, f.area());
            let loading = Paragraph::new("Loading...")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            f.render_widget(loading, area);
            [Rect::default(); 2]
        }
        View::Ready {
            state,
            notification,
            destination_host,
        } => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3), // title
                    Constraint::Min(7),    // cards
                    Constraint::Length(3), // banner
                    Constraint::Length(1), // footer
                ])
                .split(f.area());

            draw_title(f, chunks[0]);
            let areas = draw_cards(f, chunks[1], focus, state.is_interactive());
            if *state == GameState::Attempted {
                draw_banner(f, chunks[2]);
            }
            draw_footer(f, chunks[3], destination_host);
            if let Some(notification) = notification {
                draw_modal(f, notification);
            }
            areas
        }
    }
}

fn draw_title(f: &mut Frame, area: Rect) {
    let title = Paragraph::new(Line::styled(
        TITLE,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(title, area);
}

fn card_labels(side: Side) -> (&'static str, &'static str) {
    match side {
        Side::Left => ("Path One", "Choice 1"),
        Side::Right => ("Path Two", "Choice 2"),
    }
}

fn draw_cards(f: &mut Frame, area: Rect, focus: Side, interactive: bool) -> [Rect; 2] {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .spacing(2)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let mut areas = [Rect::default(); 2];
    for (i, side) in Side::ALL.into_iter().enumerate() {
        let rect = columns[i];
        areas[i] = rect;
        let (name, subtitle) = card_labels(side);
        let focused = side == focus;
        let base = if interactive {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
        };
        let border = if focused && interactive {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            base
        };
        let mut lines = vec![
            Line::default(),
            Line::styled(name, base.add_modifier(Modifier::BOLD)),
            Line::styled(subtitle, base),
        ];
        if focused {
            lines.push(Line::default());
            lines.push(Line::styled("Choose ->", border));
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border);
        let label = Paragraph::new(lines).alignment(Alignment::Center);
        f.render_widget(&block, rect);
        f.render_widget(label, block.inner(rect));
    }
    areas
}

fn draw_banner(f: &mut Frame, area: Rect) {
    let banner = Paragraph::new(ATTEMPTED_BANNER)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(banner, area);
}

fn draw_footer(f: &mut Frame, area: Rect, destination_host: &str) {
    let host_width = destination_host.chars().count() as u16;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(host_width)])
        .split(area);
    let help = Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[0]);
    let link = Paragraph::new(destination_host)
        .alignment(Alignment::Right)
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM));
    f.render_widget(link, chunks[1]);
}

fn draw_modal(f: &mut Frame, notification: &Notification) {
    let area = centered_rect(60, 40, f.area());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let mut lines: Vec<Line> = title_lines(notification.title)
        .into_iter()
        .map(|words| {
            Line::from(
                words
                    .into_iter()
                    .map(|(text, tone)| Span::styled(text, tone.style()))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    lines.push(Line::default());
    let (first, rest) = body_lines(notification.description);
    lines.push(Line::from(first));
    if let Some(rest) = rest {
        lines.push(Line::styled(rest, Style::default().fg(Color::DarkGray)));
    }
    lines.push(Line::default());
    lines.push(Line::styled(
        MODAL_HINT,
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    ));
    let p = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(&block, area);
    f.render_widget(p, block.inner(area));
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Tone {
    Plain,
    Accent,
    Alarm,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Tone::Plain => Style::default().add_modifier(Modifier::BOLD),
            Tone::Accent => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            Tone::Alarm => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        }
    }
}

/// One line per title sentence, each a run of toned words.
fn title_lines(title: &str) -> Vec<Vec<(String, Tone)>> {
    title
        .split('.')
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .map(|sentence| {
            let accented = ACCENT_MARKERS.iter().any(|marker| sentence.contains(marker));
            let words: Vec<&str> = sentence.split_whitespace().collect();
            let last = words.len().saturating_sub(1);
            words
                .iter()
                .enumerate()
                .map(|(i, word)| {
                    let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
                    let tone = if ALARM_WORDS.contains(&bare) {
                        Tone::Alarm
                    } else if accented {
                        Tone::Accent
                    } else {
                        Tone::Plain
                    };
                    let text = if i < last {
                        format!("{word} ")
                    } else {
                        (*word).to_string()
                    };
                    (text, tone)
                })
                .collect()
        })
        .collect()
}

/// Splits the body after its first sentence.
fn body_lines(description: &str) -> (&str, Option<&str>) {
    match description.split_once(". ") {
        Some((first, rest)) => {
            let first = &description[..first.len() + 1];
            let rest = rest.trim();
            (first, (!rest.is_empty()).then_some(rest))
        }
        None => (description, None),
    }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1]);

    horizontal[1]
}
