use clap::Parser;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use drivebit_runtime::board::{Board, Motor, Steer, StopMode, colors};
use drivebit_runtime::config;
use drivebit_runtime::link::{BoardIo, MockLink, Result, SerialLink};

/// Exercise a DriveBit board end to end
#[derive(Parser)]
struct Args {
    /// Serial port of the board bridge
    #[arg(short, long, default_value = config::DEFAULT_PORT)]
    port: String,

    /// Run against an in-memory board instead of hardware
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    let result = if args.simulate {
        info!("Running against an in-memory board");
        exercise(Board::new(MockLink::new())).await
    } else {
        match SerialLink::open(&args.port) {
            Ok(link) => exercise(Board::new(link)).await,
            Err(e) => {
                eprintln!("Failed to open {}: {}", args.port, e);
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Board error: {}", e);
        std::process::exit(1);
    }
}

/// The standard board checkout sequence: every motion and indicator
/// operation once, with pauses to watch the robot do it.
async fn exercise<L: BoardIo + Send + 'static>(mut board: Board<L>) -> Result<()> {
    let pause = Duration::from_secs(1);

    info!("Drive full speed forward");
    board.motors().drive(1023)?;
    tokio::time::sleep(pause).await;

    info!("Drive full speed reverse for 300 ms");
    board.drive_for(-1023, Duration::from_millis(300)).await?;
    tokio::time::sleep(pause).await;

    info!("Differential: left forward, right reverse");
    board.motors().set_speed(Motor::Left, 1023)?;
    board.motors().set_speed(Motor::Right, -1023)?;
    tokio::time::sleep(pause).await;

    info!("Drive at 600, then stop hard with the brake");
    board.motors().drive(600)?;
    tokio::time::sleep(pause).await;
    board.motors().stop(StopMode::Brake)?;
    tokio::time::sleep(pause).await;

    info!("Spin right for 400 ms");
    board
        .spin_for(Steer::Right, 600, Duration::from_millis(400))
        .await?;
    tokio::time::sleep(pause).await;

    info!("Status LED red");
    board.indicator().set_color(colors::RED)?;
    tokio::time::sleep(pause).await;

    info!("Clear LED");
    board.indicator().clear()?;
    tokio::time::sleep(pause).await;

    info!("Flash blue every 300 ms");
    board
        .indicator()
        .start_flash(colors::BLUE, Duration::from_millis(300));
    tokio::time::sleep(pause).await;

    info!("Stop flashing");
    board.indicator().stop_flash();
    tokio::time::sleep(pause).await;

    info!("LED brightness 100");
    board.indicator().set_brightness(100)?;

    board.motors().stop(StopMode::Coast)
}
