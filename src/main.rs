use clap::{Parser, Subcommand};
use ringbuf::traits::Consumer;
use spacejam_loop::audio::{CpalContext, ExportSettings, WavExporter};
use spacejam_loop::config::PlaybackConfig;
use spacejam_loop::create_notification_channel;
use spacejam_loop::messaging::channels::NOTIFICATION_RINGBUFFER_CAPACITY;
use spacejam_loop::sequencer::{ControlState, PlaybackController, SystemClock};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Host loop period: how often due timer ticks are fired
const PUMP_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Parser)]
#[command(name = "spacejam")]
#[command(about = "Space Jam music loop sequencer")]
#[command(version)]
struct Cli {
    /// Playback configuration file (RON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the loop on the default output device (Enter toggles, q quits)
    Play,

    /// Render the loop offline to a WAV file
    Render {
        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Length of the recording in seconds
        #[arg(short, long, default_value_t = 30.0)]
        seconds: f64,

        /// Sample rate of the file
        #[arg(long, default_value_t = 44100)]
        sample_rate: u32,

        /// Press stop at this time (seconds)
        #[arg(long)]
        stop_at: Option<f64>,
    },
}

enum Key {
    Toggle,
    Quit,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let config = PlaybackConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Play => play(config),
        Commands::Render {
            output,
            seconds,
            sample_rate,
            stop_at,
        } => render(config, output, seconds, sample_rate, stop_at),
    }
}

fn play(config: PlaybackConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Space Jam ===");
    println!("Enter: play/stop, q: quit\n");

    let (notification_tx, mut notification_rx) =
        create_notification_channel(NOTIFICATION_RINGBUFFER_CAPACITY);
    let notification_tx = Arc::new(Mutex::new(notification_tx));

    let opener_tx = Arc::clone(&notification_tx);
    let mut controller = PlaybackController::<CpalContext, _>::new(
        config,
        SystemClock::new(),
        Box::new(move || CpalContext::open(Arc::clone(&opener_tx))),
    )?
    .with_notifications(notification_tx);
    let mut control = ControlState::default();

    // stdin lines become key presses
    let (key_tx, key_rx) = mpsc::channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let key = if line.trim().eq_ignore_ascii_case("q") {
                Key::Quit
            } else {
                Key::Toggle
            };
            let quit = matches!(key, Key::Quit);
            if key_tx.send(key).is_err() || quit {
                return;
            }
        }
        let _ = key_tx.send(Key::Quit);
    });

    controller.toggle(&mut control);
    println!("[{}]", control.label);

    loop {
        match key_rx.recv_timeout(PUMP_INTERVAL) {
            Ok(Key::Toggle) => {
                controller.toggle(&mut control);
                println!("[{}]", control.label);
            }
            Ok(Key::Quit) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        controller.pump();

        while let Some(notification) = notification_rx.try_pop() {
            notification.log();
        }
    }

    if controller.is_playing() {
        controller.toggle(&mut control);
        // Let the fade-out reach the speakers before the stream is dropped
        thread::sleep(Duration::from_secs_f64(controller.config().fade_out));
    }

    println!("Goodbye");
    Ok(())
}

fn render(
    config: PlaybackConfig,
    output: PathBuf,
    seconds: f64,
    sample_rate: u32,
    stop_at: Option<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = ExportSettings {
        output_path: output,
        sample_rate,
        ..ExportSettings::default()
    };
    let exporter = WavExporter::new(settings, config);

    let report = exporter.export(
        seconds,
        stop_at,
        Some(Box::new(|progress: f32| {
            tracing::info!("Rendering... {:.0}%", progress * 100.0);
        })),
    )?;

    println!(
        "Wrote {} ({} frames, {} loops, peak {:.3})",
        exporter.settings().output_path.display(),
        report.frames,
        report.loops,
        report.peak
    );
    Ok(())
}
