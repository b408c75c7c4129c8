use std::{
    fs::File,
    io::stdout,
    path::{Path, PathBuf},
    sync::Mutex,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use tracing_subscriber::EnvFilter;

use blockfall::{
    CellState, Controller, Game, Input, Screen, Snapshot, TetrominoType, GRID_HEIGHT, GRID_WIDTH,
};

// ============================================================================
// Command Line
// ============================================================================

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Seed for the piece sequence, given as a 64-bit integer.
    /// The same seed always deals the same pieces.
    #[arg(short, long)]
    seed: Option<u64>,
    /// Write engine logs to this file. The filter is read from
    /// `BLOCKFALL_LOG` and defaults to `debug`.
    #[arg(short, long)]
    log_file: Option<PathBuf>,
}

fn init_logging(path: Option<&Path>) -> Result<()> {
    // Nothing may be written to the terminal while the UI owns it.
    let Some(path) = path else {
        return Ok(());
    };

    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let filter =
        EnvFilter::try_from_env("BLOCKFALL_LOG").unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = "  ";

fn tetromino_color(t: TetrominoType) -> Color {
    match t {
        TetrominoType::I => Color::Cyan,
        TetrominoType::J => Color::Blue,
        TetrominoType::L => Color::Rgb(255, 165, 0),
        TetrominoType::O => Color::Yellow,
        TetrominoType::S => Color::Green,
        TetrominoType::T => Color::Magenta,
        TetrominoType::Z => Color::Red,
    }
}

fn cell_span(cell: CellState) -> Span<'static> {
    match cell {
        CellState::Empty => Span::raw(EMPTY_CHAR),
        CellState::Filled(t) => Span::styled(BLOCK_CHAR, Style::default().fg(tetromino_color(t))),
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, screen: Screen, snapshot: &Snapshot) {
    let area = frame.size();
    render_game(frame, snapshot, area);

    match screen {
        Screen::Playing => {}
        Screen::Start => render_popup(
            frame,
            area,
            " Blockfall ",
            vec![
                Line::from(""),
                Line::from(Span::styled("BLOCKFALL", Style::default().fg(Color::Cyan))),
                Line::from(""),
                hint("Press ENTER to start"),
            ],
        ),
        Screen::Paused => render_popup(
            frame,
            area,
            " Paused ",
            vec![
                Line::from(""),
                Line::from(Span::styled("PAUSED", Style::default().fg(Color::Yellow))),
                Line::from(""),
                hint("Press ENTER to resume"),
                hint("Press ESC to quit"),
            ],
        ),
        Screen::GameOver => render_popup(
            frame,
            area,
            " Game Over ",
            vec![
                Line::from(""),
                Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
                Line::from(""),
                Line::from(format!("Score: {}", snapshot.score)),
                Line::from(format!("Lines: {}", snapshot.lines)),
                Line::from(format!("Level: {}", snapshot.level)),
                Line::from(""),
                hint("Press ENTER to restart"),
            ],
        ),
    }
}

fn hint(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

fn render_game(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let grid_display_width = (GRID_WIDTH as u16 * CELL_WIDTH) + 2;
    let grid_display_height = GRID_HEIGHT as u16 + 2;
    let preview_width = 12;
    let info_width = 14;
    let total_width = grid_display_width + preview_width + info_width + 4;
    let total_height = grid_display_height + 3;

    let main_area = centered_rect(total_width, total_height, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);

    let game_row = vertical[0];

    // Layout: [Grid][Next][Info]
    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(preview_width),
        Constraint::Length(info_width),
    ])
    .split(game_row);

    render_grid(frame, snapshot, horizontal[0]);
    render_preview(frame, snapshot, horizontal[1]);
    render_info(frame, snapshot, horizontal[2]);

    let controls_area = Rect {
        x: area.x,
        y: game_row.y + game_row.height,
        width: area.width,
        height: 2,
    };

    if controls_area.y + 1 < area.height {
        let controls = Paragraph::new(vec![Line::from(
            "←→/AD: Move | ↑/W: Rotate | ↓/S: Drop | ENTER: Pause | Q/ESC: Quit",
        )])
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

fn render_grid(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Blockfall ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = snapshot
        .playfield
        .iter()
        .map(|row| Line::from(row.iter().map(|&cell| cell_span(cell)).collect::<Vec<_>>()))
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_preview(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Next ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Canonical shapes carry empty padding rows; only draw the occupied ones.
    let lines: Vec<Line> = snapshot
        .next_piece
        .shape
        .rows()
        .filter(|row| row.iter().any(CellState::is_filled))
        .map(|row| {
            let mut spans = vec![Span::raw(" ")];
            spans.extend(row.iter().map(|&cell| cell_span(cell)));
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, snapshot: &Snapshot, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", snapshot.score)),
        Line::from(""),
        Line::from(Span::styled("Lines", Style::default().fg(Color::Cyan))),
        Line::from(format!("{}", snapshot.lines)),
        Line::from(""),
        Line::from(Span::styled("Level", Style::default().fg(Color::Green))),
        Line::from(format!("{}", snapshot.level)),
    ];

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn render_popup(frame: &mut Frame, area: Rect, title: &'static str, text: Vec<Line<'static>>) {
    let height = text.len() as u16 + 3;
    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    let popup_area = centered_rect(26, height, area);
    frame.render_widget(paragraph, popup_area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Input
// ============================================================================

fn map_key(code: KeyCode) -> Option<Input> {
    match code {
        KeyCode::Enter => Some(Input::Enter),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Input::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Input::Right),
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Input::Rotate),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Input::SoftDrop),
        _ => None,
    }
}

// ============================================================================
// Main Loop
// ============================================================================

fn run(controller: &mut Controller) -> Result<()> {
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    let mut last_tick = Instant::now();

    loop {
        let snapshot = controller.snapshot();
        let screen = controller.screen();
        terminal.draw(|frame| render(frame, screen, &snapshot))?;

        let tick_duration = controller.gravity_interval();
        let timeout = tick_duration
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => break,
                        code => {
                            if let Some(input) = map_key(code) {
                                controller.handle(input);
                                // A manual drop restarts the gravity timer.
                                if input == Input::SoftDrop {
                                    last_tick = Instant::now();
                                }
                            }
                        }
                    }
                }
            }
        }

        if !controller.is_playing() {
            last_tick = Instant::now();
        } else if last_tick.elapsed() >= tick_duration {
            controller.tick();
            last_tick = Instant::now();
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let game = match args.seed {
        Some(seed) => Game::with_seed(seed),
        None => Game::new(),
    };
    let mut controller = Controller::new(game);

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = run(&mut controller);

    // Restore the terminal before reporting any error from the loop.
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}
