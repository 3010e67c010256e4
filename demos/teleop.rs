// Keyboard teleop: W/S drive, A/D spin, R/F speed, C color, V flash, space stop, Q quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::Duration;
use tracing::info;

use drivebit_runtime::board::{Board, Direction, Steer, StopMode, colors};
use drivebit_runtime::config;
use drivebit_runtime::link::SerialLink;

const SPEEDS: [i32; 3] = [40, 70, 100]; // percent
const SPEED_NAMES: [&str; 3] = ["LOW", "MED", "HIGH"];
const PALETTE: [u32; 4] = [colors::RED, colors::GREEN, colors::BLUE, colors::YELLOW];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_PORT.to_string());
    info!("Opening board on {}", port);
    let board = Board::new(SerialLink::open(&port)?);

    info!("Controls: W/S=drive, A/D=spin, R/F=speed, C=color, V=flash, space=stop, Q=quit");
    info!("Speed: LOW");

    enable_raw_mode()?;
    let result = run_teleop(board).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    mut board: Board<SerialLink>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut speed_idx: usize = 0;
    let mut color_idx: usize = 0;
    let mut flashing = false;

    loop {
        // Poll for key with 20ms timeout (50Hz effective rate)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;

                match code {
                    // Motion
                    KeyCode::Char('w') if pressed => {
                        board.motors().go(Direction::Forward, SPEEDS[speed_idx])?;
                    }
                    KeyCode::Char('s') if pressed => {
                        board.motors().go(Direction::Reverse, SPEEDS[speed_idx])?;
                    }
                    KeyCode::Char('a') if pressed => {
                        board.motors().rotate(Steer::Left, SPEEDS[speed_idx])?;
                    }
                    KeyCode::Char('d') if pressed => {
                        board.motors().rotate(Steer::Right, SPEEDS[speed_idx])?;
                    }
                    KeyCode::Char(' ') if pressed => {
                        board.motors().stop(StopMode::Coast)?;
                    }
                    KeyCode::Char('b') if pressed => {
                        board.motors().stop(StopMode::Brake)?;
                    }

                    // Speed control
                    KeyCode::Char('r') if pressed => {
                        speed_idx = (speed_idx + 1).min(2);
                        info!("Speed: {}", SPEED_NAMES[speed_idx]);
                    }
                    KeyCode::Char('f') if pressed => {
                        speed_idx = speed_idx.saturating_sub(1);
                        info!("Speed: {}", SPEED_NAMES[speed_idx]);
                    }

                    // Indicator
                    KeyCode::Char('c') if pressed => {
                        color_idx = (color_idx + 1) % PALETTE.len();
                        flashing = false;
                        board.indicator().set_color(PALETTE[color_idx])?;
                    }
                    KeyCode::Char('v') if pressed => {
                        if flashing {
                            board.indicator().stop_flash();
                        } else {
                            board
                                .indicator()
                                .start_flash(PALETTE[color_idx], Duration::from_millis(200));
                        }
                        flashing = !flashing;
                    }

                    KeyCode::Char('q') | KeyCode::Esc => break,
                    _ => {}
                }
            }
        }
    }

    info!("Quitting, stopping robot");
    board.motors().stop(StopMode::Coast)?;
    board.indicator().stop_flash();
    board.indicator().clear()?;
    Ok(())
}
