// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use hauler_vision::config::Config;
use hauler_vision::constants::rtsp;
use hauler_vision::controller::SwitchStrategy;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Parser)]
#[command(name = "hauler-vision")]
#[command(about = "Keypad-driven viewer for Axis RTSP cameras")]
#[command(version, long_version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// JSON configuration file (default: ~/.config/hauler-vision/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Camera address; repeat for several cameras (replaces the configured list)
    #[arg(short = 'a', long = "camera", global = true)]
    cameras: Vec<String>,

    /// Pipeline variant: simple, lighten-only, full, record-and-display
    #[arg(short, long, global = true)]
    variant: Option<String>,

    /// Native window handle for the video sink (e.g. an X11 window id)
    #[arg(long, global = true)]
    window_handle: Option<usize>,

    /// Video sink element
    #[arg(long, global = true)]
    sink: Option<String>,

    /// Directory for recordings made by the record-and-display variant
    #[arg(long, global = true)]
    recording_dir: Option<PathBuf>,

    /// Start in a window instead of fullscreen
    #[arg(long, global = true)]
    windowed: bool,

    /// Reset the view to the full frame when switching cameras
    #[arg(long, global = true)]
    no_restore_view: bool,

    /// Switch cameras by rewriting the source address instead of rebuilding (experimental)
    #[arg(long, global = true)]
    rebind_on_switch: bool,

    /// Log file used while the viewer owns the terminal
    #[arg(long, global = true, default_value = "hauler-vision.log")]
    log_file: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured cameras and their stream addresses
    List,

    /// Print the effective configuration as JSON
    ShowConfig,
}

impl Cli {
    /// Subcommands keep the terminal, the viewer takes it over
    fn logs_to_stderr(&self) -> bool {
        self.command.is_some()
    }

    /// Layer command-line overrides onto the loaded configuration
    fn apply(&self, config: &mut Config) {
        if !self.cameras.is_empty() {
            config.cameras = self.cameras.clone();
        }
        if let Some(variant) = &self.variant {
            config.variant = variant.clone();
        }
        if let Some(handle) = self.window_handle {
            config.window_handle = Some(handle);
        }
        if let Some(sink) = &self.sink {
            config.sink = sink.clone();
        }
        if let Some(dir) = &self.recording_dir {
            config.recording_dir = dir.clone();
        }
        if self.windowed {
            config.fullscreen = false;
        }
        if self.no_restore_view {
            config.restore_view_on_switch = false;
        }
        if self.rebind_on_switch {
            config.switch_strategy = SwitchStrategy::Rebind;
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set RUST_LOG to control log level, e.g. RUST_LOG=hauler_vision=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    // Logging comes first so config loading is traced too
    if cli.logs_to_stderr() {
        init_stderr_logging(filter);
    } else {
        // The terminal is in raw mode while the viewer runs, so logs go to a file
        let log_file = File::create(&cli.log_file)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(log_file))
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .init();
    }

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    cli.apply(&mut config);

    match cli.command {
        Some(Commands::List) => list_cameras(&config),
        Some(Commands::ShowConfig) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        None => {
            config.validate()?;
            hauler_vision::terminal::run(&config)
        }
    }
}

fn init_stderr_logging(filter: tracing_subscriber::EnvFilter) {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

fn list_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if config.cameras.is_empty() {
        println!("No cameras configured.");
        return Ok(());
    }

    println!("Configured cameras ({} pipeline):", config.pipeline_variant());
    println!();
    for (index, address) in config.cameras.iter().enumerate() {
        println!("  [{}] {}", index, address);
        println!("      {}", rtsp::uri(address));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_destination_follows_command() {
        let cli = Cli::try_parse_from(["hauler-vision", "list"]).unwrap();
        assert!(cli.logs_to_stderr());
        let cli = Cli::try_parse_from(["hauler-vision", "-a", "10.0.0.1"]).unwrap();
        assert!(!cli.logs_to_stderr());
        assert_eq!(cli.log_file, PathBuf::from("hauler-vision.log"));
    }

    #[test]
    fn test_overrides_layer_onto_config() {
        let cli = Cli::try_parse_from([
            "hauler-vision",
            "-a",
            "10.0.0.1",
            "--camera",
            "10.0.0.2",
            "--windowed",
            "--no-restore-view",
            "--rebind-on-switch",
            "--variant",
            "lighten-only",
        ])
        .unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.cameras, vec!["10.0.0.1", "10.0.0.2"]);
        assert!(!config.fullscreen);
        assert!(!config.restore_view_on_switch);
        assert_eq!(config.switch_strategy, SwitchStrategy::Rebind);
        assert_eq!(config.variant, "lighten-only");
    }
}
