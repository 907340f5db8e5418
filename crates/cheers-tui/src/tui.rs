//! Ratatui frontend for the party game client.
//!
//! Pure UI module: terminal lifecycle, rendering, and input → intent
//! mapping. All game state lives in [`cheers_client::state`] and all
//! networking in [`cheers_client::api`]; this module has no networking
//! dependencies.

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use std::collections::HashMap;
use std::io::{self, Stdout};

use cheers_client::state::{ActivePrompt, ClientState, LogCategory, Phase, WheelStage};
use cheers_core::protocol::{GameResult, MAX_NAME_CHARS};
use cheers_core::rules::{FAMILY_ROUNDS, GameMode, WineColor, drunk_cups_left};
use cheers_core::wheel::pointer_slice;

// ---------------------------------------------------------------------------
// UserIntent — result of processing user input
// ---------------------------------------------------------------------------

/// The result of processing a user input event.
#[derive(Debug)]
pub enum UserIntent {
    /// No action needed (e.g. the event only moved a cursor).
    None,
    /// The user wants to quit / close the application.
    Quit,
    /// Submit the join form with this name.
    Join(String),
    /// Host asks the server to start the game.
    Start,
    /// Host asks the server to spin the wheel.
    Spin,
    /// Start the local dice shuffle.
    Roll,
    /// Answer the active quiz with an option letter.
    QuizAnswer(String),
    /// Resolve the pick-a-color prompt.
    PickColor(WineColor),
    /// Adjudicate the active duel; `true` means we won.
    DuelResult(bool),
    /// Draw the third dragon-gate card.
    DragonDraw,
    /// Dismiss the active truth-or-dare prompt.
    PromptDone,
    /// Full reset back to the landing screen.
    Reset,
}

// ---------------------------------------------------------------------------
// TUI-only state
// ---------------------------------------------------------------------------

/// UI-layer state that lives alongside (but separate from) the game state.
struct TuiState {
    /// Name input buffer for the join form
    name_input: String,
    /// Name input cursor position
    name_cursor: usize,
    /// Selected color index in the pick-a-color prompt
    selected_color: usize,
}

impl Default for TuiState {
    fn default() -> Self {
        Self {
            name_input: String::new(),
            name_cursor: 0,
            selected_color: 0,
        }
    }
}

impl TuiState {
    fn move_cursor_left(&mut self) {
        let moved = self.name_cursor.saturating_sub(1);
        self.name_cursor = self.clamp_cursor(moved);
    }

    fn move_cursor_right(&mut self) {
        let moved = self.name_cursor.saturating_add(1);
        self.name_cursor = self.clamp_cursor(moved);
    }

    fn enter_char(&mut self, new_char: char) {
        if self.name_input.chars().count() >= MAX_NAME_CHARS {
            return;
        }
        let index = self.byte_index();
        self.name_input.insert(index, new_char);
        self.move_cursor_right();
    }

    fn byte_index(&self) -> usize {
        self.name_input
            .char_indices()
            .map(|(i, _)| i)
            .nth(self.name_cursor)
            .unwrap_or(self.name_input.len())
    }

    fn delete_char(&mut self) {
        if self.name_cursor == 0 {
            return;
        }
        let current_index = self.name_cursor;
        let before = self.name_input.chars().take(current_index - 1);
        let after = self.name_input.chars().skip(current_index);
        self.name_input = before.chain(after).collect();
        self.move_cursor_left();
    }

    fn clamp_cursor(&self, new_pos: usize) -> usize {
        new_pos.clamp(0, self.name_input.chars().count())
    }
}

// ---------------------------------------------------------------------------
// Public API — Tui struct
// ---------------------------------------------------------------------------

/// Owns the ratatui terminal and all UI-layer state.
///
/// The client orchestrator ([`crate::client`]) drives this struct: call
/// [`Tui::render`] each frame and [`Tui::poll_and_handle_input`] to
/// process keyboard events.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: TuiState,
}

impl Tui {
    /// Set up the terminal (raw mode, alternate screen) and return a ready `Tui`.
    pub fn setup() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal,
            state: TuiState::default(),
        })
    }

    /// Restore the terminal to its original state.
    pub fn teardown(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Draw the current frame.
    pub fn render(&mut self, cs: &ClientState) -> io::Result<()> {
        self.terminal.draw(|f| {
            if let Some((x, y)) = ui(f, cs, &self.state) {
                f.set_cursor_position((x, y));
            }
        })?;
        Ok(())
    }

    /// Poll for a keyboard event and, if one is available, translate it
    /// into a [`UserIntent`]. This never blocks — returns
    /// [`UserIntent::None`] immediately when no event is pending.
    pub fn poll_and_handle_input(&mut self, cs: &ClientState) -> io::Result<UserIntent> {
        if !event::poll(std::time::Duration::from_millis(0))? {
            return Ok(UserIntent::None);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(UserIntent::None);
        };
        if key.kind != KeyEventKind::Press {
            return Ok(UserIntent::None);
        }
        Ok(self.handle_key_event(key, cs))
    }

    // -- private -----------------------------------------------------------

    fn handle_key_event(&mut self, key: KeyEvent, cs: &ClientState) -> UserIntent {
        if key.code == KeyCode::Esc {
            return UserIntent::Quit;
        }

        // A prompt modal swallows all input while it is open.
        if cs.phase == Phase::Playing
            && let Some(prompt) = &cs.prompt
        {
            return self.handle_prompt_key(key, prompt);
        }

        match cs.phase {
            Phase::Joining => self.handle_join_key(key),
            Phase::Disconnected => match key.code {
                KeyCode::Enter => UserIntent::Quit,
                _ => UserIntent::None,
            },
            Phase::Queued => UserIntent::None,
            Phase::Lobby => match key.code {
                KeyCode::Enter | KeyCode::Char('s') => UserIntent::Start,
                _ => UserIntent::None,
            },
            Phase::Wheel(WheelStage::Idle) => match key.code {
                KeyCode::Enter | KeyCode::Char('s') => UserIntent::Spin,
                _ => UserIntent::None,
            },
            Phase::Wheel(_) => UserIntent::None,
            Phase::Playing => match key.code {
                KeyCode::Enter | KeyCode::Char('r') => UserIntent::Roll,
                _ => UserIntent::None,
            },
            Phase::Ended => match key.code {
                KeyCode::Enter | KeyCode::Char('n') => UserIntent::Reset,
                _ => UserIntent::None,
            },
        }
    }

    fn handle_join_key(&mut self, key: KeyEvent) -> UserIntent {
        let tui = &mut self.state;
        match key.code {
            KeyCode::Enter => {
                let name = tui.name_input.trim().to_string();
                if name.is_empty() {
                    UserIntent::None
                } else {
                    UserIntent::Join(name)
                }
            }
            KeyCode::Char(c) => {
                tui.enter_char(c);
                UserIntent::None
            }
            KeyCode::Backspace => {
                tui.delete_char();
                UserIntent::None
            }
            KeyCode::Left => {
                tui.move_cursor_left();
                UserIntent::None
            }
            KeyCode::Right => {
                tui.move_cursor_right();
                UserIntent::None
            }
            _ => UserIntent::None,
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent, prompt: &ActivePrompt) -> UserIntent {
        let tui = &mut self.state;
        match prompt {
            ActivePrompt::Quiz { options, .. } => match key.code {
                KeyCode::Char(c) if c.is_ascii_alphabetic() => {
                    let index = (c.to_ascii_uppercase() as u8 - b'A') as usize;
                    if index < options.len() {
                        UserIntent::QuizAnswer(c.to_ascii_uppercase().to_string())
                    } else {
                        UserIntent::None
                    }
                }
                _ => UserIntent::None,
            },
            ActivePrompt::PickColor => match key.code {
                KeyCode::Left => {
                    let n = WineColor::ALL.len();
                    tui.selected_color = (tui.selected_color + n - 1) % n;
                    UserIntent::None
                }
                KeyCode::Right => {
                    tui.selected_color = (tui.selected_color + 1) % WineColor::ALL.len();
                    UserIntent::None
                }
                KeyCode::Enter => UserIntent::PickColor(WineColor::ALL[tui.selected_color]),
                KeyCode::Char(c) if ('1'..='4').contains(&c) => {
                    let index = (c as u8 - b'1') as usize;
                    UserIntent::PickColor(WineColor::ALL[index])
                }
                _ => UserIntent::None,
            },
            ActivePrompt::Duel { .. } => match key.code {
                KeyCode::Char('w') => UserIntent::DuelResult(true),
                KeyCode::Char('l') => UserIntent::DuelResult(false),
                _ => UserIntent::None,
            },
            ActivePrompt::TruthOrDare { .. } => match key.code {
                KeyCode::Enter => UserIntent::PromptDone,
                _ => UserIntent::None,
            },
            ActivePrompt::DragonGate { .. } => match key.code {
                KeyCode::Enter | KeyCode::Char('d') => UserIntent::DragonDraw,
                _ => UserIntent::None,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn ui(frame: &mut Frame, cs: &ClientState, tui: &TuiState) -> Option<(u16, u16)> {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),   // Screen content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let cursor = match cs.phase {
        Phase::Joining => render_join_screen(frame, cs, tui, main_layout[0]),
        Phase::Disconnected => {
            render_landing_screen(frame, cs, main_layout[0]);
            None
        }
        Phase::Queued => {
            render_queue_screen(frame, cs, main_layout[0]);
            None
        }
        Phase::Lobby => {
            render_lobby(frame, cs, main_layout[0]);
            None
        }
        Phase::Wheel(stage) => {
            render_wheel(frame, cs, stage, main_layout[0]);
            None
        }
        Phase::Playing => {
            render_game(frame, cs, tui, main_layout[0]);
            None
        }
        Phase::Ended => {
            render_end_screen(frame, cs, main_layout[0]);
            None
        }
    };

    render_status_bar(frame, cs, main_layout[1]);
    cursor
}

fn render_status_bar(frame: &mut Frame, cs: &ClientState, area: Rect) {
    let mut spans = vec![
        Span::styled("ESC", Style::default().fg(Color::Cyan).bold()),
        Span::raw(": Quit | Mode: "),
        Span::styled(cs.mode.label(), Style::default().fg(Color::Magenta)),
    ];
    if let Some(name) = &cs.our_name {
        spans.push(Span::raw(" | You: "));
        spans.push(Span::styled(
            name.as_str(),
            Style::default().fg(Color::Cyan),
        ));
        if cs.is_host {
            spans.push(Span::styled(" (host)", Style::default().fg(Color::Yellow)));
        }
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_join_screen(
    frame: &mut Frame,
    cs: &ClientState,
    tui: &TuiState,
    area: Rect,
) -> Option<(u16, u16)> {
    let popup = centered_rect(50, 40, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Cheers! ")
        .title_style(Style::default().fg(Color::Magenta).bold());
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Enter your name (max {MAX_NAME_CHARS} characters)"),
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("> "),
            Span::styled(
                tui.name_input.as_str(),
                Style::default().fg(Color::Cyan).bold(),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to join",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    for notice in cs.events.iter().rev().take(2) {
        lines.push(Line::from(Span::styled(
            notice.text.clone(),
            notice_style(notice.category),
        )));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

    let cursor_x = inner.x.saturating_add(2 + tui.name_cursor as u16);
    let cursor_y = inner.y.saturating_add(2);
    if cursor_x < inner.x + inner.width {
        Some((cursor_x, cursor_y))
    } else {
        None
    }
}

fn render_landing_screen(frame: &mut Frame, cs: &ClientState, area: Rect) {
    let popup = centered_rect(50, 30, area);
    let mut lines = vec![Line::from(Span::styled(
        "Session ended",
        Style::default().fg(Color::Yellow).bold(),
    ))];
    if let Some(notice) = cs.events.back() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            notice.text.clone(),
            notice_style(notice.category),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press Enter to exit",
        Style::default().fg(Color::DarkGray),
    )));
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, popup);
}

fn render_queue_screen(frame: &mut Frame, cs: &ClientState, area: Rect) {
    let popup = centered_rect(50, 30, area);
    let position = cs
        .queue_position
        .map(|p| p.to_string())
        .unwrap_or_else(|| "?".to_string());
    let lines = vec![
        Line::from(Span::styled(
            "The room is full",
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("You are number "),
            Span::styled(position, Style::default().fg(Color::Cyan).bold()),
            Span::raw(" in the queue"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Waiting for a seat to open...",
            Style::default().fg(Color::Gray),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, popup);
}

fn render_lobby(frame: &mut Frame, cs: &ClientState, area: Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),    // Roster
            Constraint::Length(3), // Start hint
            Constraint::Length(8), // Log
        ])
        .split(area);

    let my_id = cs.our_id.as_deref();
    let items: Vec<ListItem> = cs
        .roster
        .iter()
        .map(|p| {
            let is_me = Some(p.player_id.as_str()) == my_id;
            let mut spans = vec![];
            if p.is_host || Some(&p.player_id) == cs.host_id.as_ref() {
                spans.push(Span::styled("(H) ", Style::default().fg(Color::Yellow)));
            } else {
                spans.push(Span::raw("    "));
            }
            let name_style = if is_me {
                Style::default().fg(Color::Cyan).bold()
            } else {
                Style::default().fg(Color::White)
            };
            spans.push(Span::styled(p.player_name.clone(), name_style));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let roster = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue))
            .title(format!(" Players ({}) ", cs.roster.len()))
            .title_style(Style::default().fg(Color::Blue).bold()),
    );
    frame.render_widget(roster, layout[0]);

    let hint = if cs.is_host && cs.can_start {
        Line::from(Span::styled(
            "Press Enter to start the game",
            Style::default().fg(Color::Green).bold(),
        ))
    } else if cs.is_host {
        Line::from(Span::styled(
            "Waiting for more players...",
            Style::default().fg(Color::Gray),
        ))
    } else {
        Line::from(Span::styled(
            "Waiting for the host to start...",
            Style::default().fg(Color::Gray),
        ))
    };
    let hint = Paragraph::new(hint)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(hint, layout[1]);

    render_log(frame, cs, layout[2]);
}

fn render_wheel(frame: &mut Frame, cs: &ClientState, stage: WheelStage, area: Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(3)])
        .split(area);

    let n = cs.candidates.len();
    let pointed = if stage == WheelStage::Spinning && n > 0 {
        Some(pointer_slice(cs.wheel_angle, n))
    } else {
        cs.winner_index.filter(|_| stage == WheelStage::Finished)
    };

    let items: Vec<ListItem> = if stage == WheelStage::Finished && !cs.player_order.is_empty() {
        let mut order = cs.player_order.clone();
        order.sort_by_key(|p| p.order);
        order
            .iter()
            .map(|p| {
                let style = if p.order == 1 {
                    Style::default().fg(Color::Green).bold()
                } else {
                    Style::default().fg(Color::White)
                };
                ListItem::new(Span::styled(
                    format!("  {}. {}", p.order, p.player_name),
                    style,
                ))
            })
            .collect()
    } else {
        cs.candidates
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let (marker, style) = if pointed == Some(i) {
                    ("▶ ", Style::default().fg(Color::Yellow).bold())
                } else {
                    ("  ", Style::default().fg(Color::White))
                };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(Color::Yellow)),
                    Span::styled(c.player_name.clone(), style),
                ]))
            })
            .collect()
    };

    let title = match stage {
        WheelStage::Idle => " Turn order draw ",
        WheelStage::Spinning => " Spinning... ",
        WheelStage::Finished => " Turn order ",
    };
    let wheel = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title(title)
            .title_style(Style::default().fg(Color::Magenta).bold()),
    );
    frame.render_widget(wheel, layout[0]);

    let hint = match stage {
        WheelStage::Idle if cs.is_host => Line::from(Span::styled(
            "Press Enter to spin the wheel",
            Style::default().fg(Color::Green).bold(),
        )),
        WheelStage::Idle => Line::from(Span::styled(
            "Waiting for the host to spin...",
            Style::default().fg(Color::Gray),
        )),
        WheelStage::Spinning => Line::from(Span::styled(
            format!("{:>5.1}°", cs.wheel_angle % 360.0),
            Style::default().fg(Color::Yellow),
        )),
        WheelStage::Finished => Line::from(Span::styled(
            "Order drawn! Starting soon...",
            Style::default().fg(Color::Green),
        )),
    };
    let hint = Paragraph::new(hint)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(hint, layout[1]);
}

fn render_game(frame: &mut Frame, cs: &ClientState, tui: &TuiState, area: Rect) {
    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(24), // Players
            Constraint::Min(40),    // Board + log
        ])
        .split(area);

    render_players_panel(frame, cs, content[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // Board
            Constraint::Min(5),    // Log
        ])
        .split(content[1]);

    render_board(frame, cs, right[0]);
    render_log(frame, cs, right[1]);

    if let Some(prompt) = &cs.prompt {
        render_prompt_popup(frame, tui, prompt);
    }
}

fn render_players_panel(frame: &mut Frame, cs: &ClientState, area: Rect) {
    let my_id = cs.our_id.as_deref();
    let items: Vec<ListItem> = cs
        .seated
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let is_me = Some(p.player_id.as_str()) == my_id;
            let acting = i == cs.turn_index;
            let mut spans = vec![];
            if acting {
                spans.push(Span::styled("▶ ", Style::default().fg(Color::Yellow)));
            } else {
                spans.push(Span::raw("  "));
            }
            let name_style = if is_me {
                Style::default().fg(Color::Cyan).bold()
            } else {
                Style::default().fg(Color::White)
            };
            spans.push(Span::styled(p.player_name.clone(), name_style));
            spans.push(Span::styled(
                format!(" {:+}", p.score),
                Style::default().fg(Color::Green),
            ));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let panel = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue))
            .title(" Players ")
            .title_style(Style::default().fg(Color::Blue).bold()),
    );
    frame.render_widget(panel, area);
}

fn render_board(frame: &mut Frame, cs: &ClientState, area: Rect) {
    let mut lines = vec![];

    let banner = match cs.mode {
        GameMode::Family => format!(" Round {}/{} ", cs.round, FAMILY_ROUNDS),
        GameMode::Drunk => {
            let scores: HashMap<String, i32> = cs
                .seated
                .iter()
                .map(|p| (p.player_id.clone(), p.score))
                .collect();
            format!(" {} cups to go ", drunk_cups_left(&scores))
        }
    };
    lines.push(Line::from(Span::styled(
        banner,
        Style::default().fg(Color::Black).bg(Color::Yellow).bold(),
    )));
    lines.push(Line::from(""));

    let dice_str = match cs.dice {
        Some((a, b)) => format!("[ {a} ]  [ {b} ]"),
        None => "[ ? ]  [ ? ]".to_string(),
    };
    let dice_style = if cs.rolling {
        Style::default().fg(Color::Yellow).bold()
    } else {
        Style::default().fg(Color::White).bold()
    };
    lines.push(Line::from(Span::styled(dice_str, dice_style)));
    lines.push(Line::from(""));

    let mut glass = vec![Span::styled("Glass: ", Style::default().fg(Color::Gray))];
    if let Some(base) = cs.base_color {
        glass.push(Span::styled("■ ", Style::default().fg(wine_fg(base))));
    }
    for color in &cs.wine_stack {
        glass.push(Span::styled("■ ", Style::default().fg(wine_fg(*color))));
    }
    if glass.len() == 1 {
        glass.push(Span::styled("empty", Style::default().fg(Color::DarkGray)));
    }
    lines.push(Line::from(glass));
    lines.push(Line::from(""));

    let turn_line = if cs.rolling {
        Line::from(Span::styled(
            "Rolling...",
            Style::default().fg(Color::Yellow),
        ))
    } else if cs.is_my_turn() {
        Line::from(Span::styled(
            "Your turn! Press Enter to roll",
            Style::default().fg(Color::Green).bold(),
        ))
    } else {
        let name = cs
            .current_player()
            .map(|p| p.player_name.clone())
            .unwrap_or_else(|| "...".to_string());
        Line::from(Span::styled(
            format!("Waiting for {name}"),
            Style::default().fg(Color::Gray),
        ))
    };
    lines.push(turn_line);

    let board = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title(" Table ")
            .title_style(Style::default().fg(Color::Magenta).bold()),
    );
    frame.render_widget(board, area);
}

fn render_prompt_popup(frame: &mut Frame, tui: &TuiState, prompt: &ActivePrompt) {
    let area = centered_rect(60, 50, frame.area());
    frame.render_widget(Clear, area);

    let (title, lines) = match prompt {
        ActivePrompt::Quiz {
            question, options, ..
        } => {
            let mut lines = vec![
                Line::from(Span::styled(
                    question.clone(),
                    Style::default().fg(Color::White).bold(),
                )),
                Line::from(""),
            ];
            // Options arrive letter-prefixed ("A. ...").
            for option in options {
                lines.push(Line::from(Span::styled(
                    format!("  {option}"),
                    Style::default().fg(Color::Cyan),
                )));
            }
            lines.push(Line::from(""));
            lines.push(hint_line("Press the option letter to answer"));
            (" Quiz ", lines)
        }
        ActivePrompt::PickColor => {
            let mut spans = vec![];
            for (i, color) in WineColor::ALL.iter().enumerate() {
                let style = if i == tui.selected_color {
                    Style::default().fg(wine_fg(*color)).bold().reversed()
                } else {
                    Style::default().fg(wine_fg(*color))
                };
                spans.push(Span::styled(format!(" {} ", color.label()), style));
                spans.push(Span::raw(" "));
            }
            let lines = vec![
                Line::from(Span::styled(
                    "Pick a color for the glass",
                    Style::default().fg(Color::White).bold(),
                )),
                Line::from(""),
                Line::from(spans),
                Line::from(""),
                hint_line("←/→ and Enter, or 1-4"),
            ];
            (" Your pour ", lines)
        }
        ActivePrompt::Duel {
            kind,
            opponent_name,
            ..
        } => {
            let lines = vec![
                Line::from(Span::styled(
                    format!("{} duel!", kind.label()),
                    Style::default().fg(Color::White).bold(),
                )),
                Line::from(""),
                Line::from(vec![
                    Span::raw("You face "),
                    Span::styled(
                        opponent_name.clone(),
                        Style::default().fg(Color::Cyan).bold(),
                    ),
                ]),
                Line::from(""),
                hint_line("W = you won, L = you lost"),
            ];
            (" Duel ", lines)
        }
        ActivePrompt::TruthOrDare { is_truth, question } => {
            let kind = if *is_truth { "TRUTH" } else { "DARE" };
            let lines = vec![
                Line::from(Span::styled(
                    kind,
                    Style::default().fg(Color::Yellow).bold(),
                )),
                Line::from(""),
                Line::from(Span::raw(question.clone())),
                Line::from(""),
                hint_line("Enter when done"),
            ];
            (" Truth or dare ", lines)
        }
        ActivePrompt::DragonGate { gate } => {
            let lines = vec![
                Line::from(Span::styled(
                    "Dragon gate",
                    Style::default().fg(Color::White).bold(),
                )),
                Line::from(""),
                Line::from(vec![
                    Span::styled(
                        format!("[ {} ]", gate.low),
                        Style::default().fg(Color::Cyan).bold(),
                    ),
                    Span::raw("  ?  "),
                    Span::styled(
                        format!("[ {} ]", gate.high),
                        Style::default().fg(Color::Cyan).bold(),
                    ),
                ]),
                Line::from(""),
                Line::from(Span::styled(
                    "Strictly between the posts is safe",
                    Style::default().fg(Color::Gray),
                )),
                Line::from(""),
                hint_line("Enter to draw the third card"),
            ];
            (" Dragon gate ", lines)
        }
    };

    let popup = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title)
            .title_style(Style::default().fg(Color::Cyan).bold())
            .style(Style::default().bg(Color::Black)),
    );
    frame.render_widget(popup, area);
}

fn render_end_screen(frame: &mut Frame, cs: &ClientState, area: Rect) {
    let popup = centered_rect(60, 50, area);
    let mut lines = vec![
        Line::from(Span::styled(
            "GAME OVER",
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::from(""),
    ];
    if let Some(result) = &cs.game_result {
        for text in end_lines(result) {
            lines.push(Line::from(Span::styled(
                text,
                Style::default().fg(Color::White),
            )));
        }
    }
    lines.push(Line::from(""));
    lines.push(hint_line("Enter for a new game"));

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
    frame.render_widget(paragraph, popup);
}

fn render_log(frame: &mut Frame, cs: &ClientState, area: Rect) {
    let items: Vec<ListItem> = cs
        .events
        .iter()
        .rev()
        .take(area.height.saturating_sub(2) as usize)
        .rev()
        .map(|notice| {
            ListItem::new(Span::styled(
                notice.text.clone(),
                notice_style(notice.category),
            ))
        })
        .collect();

    let log = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Log ")
            .title_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(log, area);
}

fn notice_style(category: LogCategory) -> Style {
    match category {
        LogCategory::System => Style::default().fg(Color::Yellow),
        LogCategory::Action => Style::default().fg(Color::White),
        LogCategory::Winner => Style::default().fg(Color::Green).bold(),
        LogCategory::Error => Style::default().fg(Color::Red),
        LogCategory::Info => Style::default().fg(Color::Gray),
    }
}

fn wine_fg(color: WineColor) -> Color {
    match color {
        WineColor::Red => Color::Red,
        WineColor::Blue => Color::Blue,
        WineColor::Yellow => Color::Yellow,
        WineColor::Green => Color::Green,
    }
}

fn hint_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::DarkGray),
    ))
}

/// Text lines for the end screen, one entry per player mention.
fn end_lines(result: &GameResult) -> Vec<String> {
    let mut lines = Vec::new();
    match result.mode {
        GameMode::Family => {
            let winner_names: Vec<&str> = result
                .winners
                .iter()
                .map(|e| e.player_name.as_str())
                .collect();
            let loser_names: Vec<&str> = result
                .losers
                .iter()
                .map(|e| e.player_name.as_str())
                .collect();
            let draw = !winner_names.is_empty() && winner_names == loser_names;
            if draw {
                lines.push("Everyone tied, it's a draw!".to_string());
                for entry in &result.winners {
                    lines.push(format!("{}: {} points", entry.player_name, entry.score));
                }
            } else {
                for entry in &result.winners {
                    lines.push(format!(
                        "Winner: {} ({} points)",
                        entry.player_name, entry.score
                    ));
                }
                for entry in &result.losers {
                    lines.push(format!(
                        "Loser: {} ({} points), bottoms up!",
                        entry.player_name, entry.score
                    ));
                }
            }
        }
        GameMode::Drunk => {
            if let Some(loser) = result.drunk_loser() {
                lines.push(format!(
                    "{} hit {} drinks and loses!",
                    loser.player_name, loser.score
                ));
            }
        }
    }
    if let Some(message) = &result.message {
        lines.push(message.clone());
    }
    lines
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

#[cfg(test)]
mod tests {
    use super::*;
    use cheers_core::protocol::ScoreEntry;

    fn entry(name: &str, score: i32) -> ScoreEntry {
        ScoreEntry {
            player_id: Some(name.to_lowercase()),
            player_name: name.to_string(),
            score,
        }
    }

    #[test]
    fn family_end_lists_every_winner_and_loser_once() {
        let result = GameResult {
            mode: GameMode::Family,
            winners: vec![entry("Ana", 4), entry("Bo", 4)],
            losers: vec![entry("Cy", -2)],
            loser: None,
            max_score: Some(4),
            min_score: Some(-2),
            message: None,
        };
        let lines = end_lines(&result);
        for name in ["Ana", "Bo", "Cy"] {
            assert_eq!(
                lines.iter().filter(|l| l.contains(name)).count(),
                1,
                "{name} should appear exactly once"
            );
        }
        assert!(lines.iter().any(|l| l.contains("Winner: Ana")));
        assert!(lines.iter().any(|l| l.contains("Loser: Cy")));
    }

    #[test]
    fn family_all_equal_renders_as_a_draw() {
        let result = GameResult {
            mode: GameMode::Family,
            winners: vec![entry("Ana", 0), entry("Bo", 0)],
            losers: vec![entry("Ana", 0), entry("Bo", 0)],
            loser: None,
            max_score: Some(0),
            min_score: Some(0),
            message: None,
        };
        let lines = end_lines(&result);
        assert!(lines[0].contains("draw"));
        assert_eq!(lines.iter().filter(|l| l.contains("Ana")).count(), 1);
        assert!(!lines.iter().any(|l| l.contains("Winner")));
    }

    #[test]
    fn drunk_end_names_exactly_one_loser() {
        let result = GameResult {
            mode: GameMode::Drunk,
            winners: Vec::new(),
            losers: Vec::new(),
            loser: Some(entry("Bo", 3)),
            max_score: None,
            min_score: None,
            message: None,
        };
        let lines = end_lines(&result);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Bo"));
        assert!(lines[0].contains('3'));
    }

    #[test]
    fn name_input_caps_at_the_limit_and_edits_at_the_cursor() {
        let mut tui = TuiState::default();
        for c in "abcdefghijkl".chars() {
            tui.enter_char(c);
        }
        assert_eq!(tui.name_input, "abcdefghij");

        tui.move_cursor_left();
        tui.delete_char();
        assert_eq!(tui.name_input, "abcdefghj");
        assert_eq!(tui.name_cursor, 8);
    }
}
