//! Primefield CLI - explore, snapshot, render and play the prime harmonic field

use clap::{Parser, Subcommand};
use primefield::field::{visibility_threshold, HarmonicField};
use primefield::ratios::{self, SUPPORTED_PRIMES};
use primefield::render::{self, GestureConfig};
use primefield::{Coordinator, ExplorerConfig, VoiceManager};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "primefield")]
#[command(about = "Prime harmonics explorer", long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Fundamental in Hz (overrides the config file)
    #[arg(short, long, global = true)]
    fundamental: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported primes with their ratios and octave ladders
    Primes {
        /// Highest ladder frequency in Hz (default: 4000)
        #[arg(short, long, default_value = "4000.0")]
        max_frequency: f64,
    },

    /// Print visible harmonics as JSON
    Snapshot {
        /// Exploration depth 0.0-1.0 (default: 0.0)
        #[arg(short, long, default_value = "0.0")]
        depth: f64,
    },

    /// Render an orbit through the field to a WAV file
    Render {
        /// Output WAV file path
        output: PathBuf,

        /// Orbit duration in seconds (default: 8.0)
        #[arg(short, long, default_value = "8.0")]
        duration: f64,

        /// Full turns around the field (default: 1.0)
        #[arg(short, long, default_value = "1.0")]
        revolutions: f64,

        /// Depth reached at the end of the orbit (default: 0.5)
        #[arg(long, default_value = "0.5")]
        end_depth: f64,

        /// Sample rate in Hz (overrides the config file)
        #[arg(short, long)]
        sample_rate: Option<u32>,
    },

    /// Play the orbit live on the default output device
    Play {
        /// Duration in seconds (default: 10.0)
        #[arg(short, long, default_value = "10.0")]
        duration: f64,

        /// Full turns around the field (default: 1.0)
        #[arg(short, long, default_value = "1.0")]
        revolutions: f64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &cli.config {
        Some(path) => ExplorerConfig::load(path)?,
        None => ExplorerConfig::default(),
    };
    if let Some(f) = cli.fundamental {
        config.fundamental = f;
    }

    match cli.command {
        Commands::Primes { max_frequency } => {
            print_primes(&config.sanitized(), max_frequency);
        }

        Commands::Snapshot { depth } => {
            let config = config.sanitized();
            let mut field = HarmonicField::new(config.width, config.height);
            field.set_depth(depth);
            println!("{}", serde_json::to_string_pretty(&field.visible_harmonics())?);
        }

        Commands::Render {
            output,
            duration,
            revolutions,
            end_depth,
            sample_rate,
        } => {
            if let Some(sr) = sample_rate {
                config.sample_rate = sr;
            }
            let config = config.sanitized();
            let gesture = GestureConfig {
                duration,
                revolutions,
                end_depth,
                ..GestureConfig::default()
            };

            println!("Rendering orbit to {}", output.display());
            println!("  Duration:    {} seconds", gesture.duration);
            println!("  Sample rate: {} Hz", config.sample_rate);
            println!("  Fundamental: {} Hz", config.fundamental);
            println!();

            let stats = render::render_gesture_to_file(&config, &gesture, &output)?;
            stats.print_summary();
            println!("\nRender complete: {}", output.display());
        }

        Commands::Play {
            duration,
            revolutions,
        } => {
            play(config.sanitized(), duration, revolutions)?;
        }
    }

    Ok(())
}

fn print_primes(config: &ExplorerConfig, max_frequency: f64) {
    println!(
        "{:>5}  {:>8}  {:>9}  {:>9}  {:>6}  {:<32}  ladder (Hz over {} Hz)",
        "prime", "ratio", "cents", "deviation", "depth", "interval", config.fundamental
    );
    for (rank, &prime) in SUPPORTED_PRIMES.iter().enumerate() {
        let ratio = ratios::octave_reduce(u64::from(prime));
        let ladder: Vec<String> = ratios::enumerate_harmonics(prime, config.fundamental, max_frequency)
            .map(|h| format!("{:.1}", h.frequency))
            .collect();
        println!(
            "{:>5}  {:>8.5}  {:>9.2}  {:>+9.2}  {:>6.3}  {:<32}  {}",
            prime,
            ratio,
            ratios::cents(ratio),
            ratios::tempered_deviation(ratio),
            visibility_threshold(rank),
            ratios::interval_name(prime).unwrap_or("-"),
            ladder.join(" ")
        );
    }
}

fn play(config: ExplorerConfig, duration: f64, revolutions: f64) -> Result<(), Box<dyn std::error::Error>> {
    let voices = VoiceManager::init(&config)?;
    let mut explorer = Coordinator::new(config, voices);
    let gesture = GestureConfig {
        duration,
        revolutions,
        ..GestureConfig::default()
    };
    let (width, height) = explorer.field().dimensions();

    println!("Playing for {} seconds (Ctrl+C to stop)", duration);

    let frame = Duration::from_millis(16);
    let start = Instant::now();
    let mut last = start;
    loop {
        let elapsed = start.elapsed().as_secs_f64();
        if elapsed >= duration {
            break;
        }
        let progress = elapsed / duration.max(f64::EPSILON);
        let pointer = gesture.orbit_point(width, height, progress);
        explorer.set_depth(gesture.depth_at(progress));
        explorer.pointer_moved(pointer.x, pointer.y);

        let now = Instant::now();
        explorer.tick(now.duration_since(last).as_secs_f64());
        last = now;
        std::thread::sleep(frame);
    }

    explorer.shutdown();
    let deadline = Instant::now() + Duration::from_secs(1);
    while !explorer.voices().is_closed() && Instant::now() < deadline {
        std::thread::sleep(frame);
    }
    println!("Done");
    Ok(())
}
