//! musicbox - Sensor board to MIDI

use anyhow::Result;
use clap::Parser;
use musicbox::config::{self, MusicBoxConfig};
use musicbox::engine::{
    list_midi_ports, request_stop, Engine, JsonSink, MidiPlayer, OutputSink, Runner,
};
use musicbox::sources::{LineSource, ReaderSource};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Play {
            config: config_path,
            input,
            port,
            dry_run,
        } => {
            info!("Loading configuration from {:?}", config_path);
            let mut cfg = config::load_config(&config_path)?;
            if let Some(input) = input {
                cfg.input.path = input;
            }
            if let Some(port) = port {
                cfg.midi.port = Some(port);
            }

            let source = ReaderSource::open(&cfg.input.path)?;

            if dry_run {
                let sink = JsonSink::new(std::io::stdout().lock());
                play(&cfg, source, sink)?;
            } else {
                let player = MidiPlayer::new(cfg.midi.port.as_deref())?;
                player.set_programs(&cfg.midi.programs)?;
                play(&cfg, source, player)?;
            }
        }

        Commands::Ports => {
            let ports = list_midi_ports()?;
            if ports.is_empty() {
                println!("No MIDI output ports found.");
            } else {
                println!("MIDI output ports:");
                for (i, name) in ports.iter().enumerate() {
                    println!("  {}: {}", i, name);
                }
            }
        }

        Commands::Check { config: config_path } => {
            println!("Checking configuration at {:?}...", config_path);

            match config::load_config(&config_path) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Input: {:?}", cfg.input.path);
                    println!("  Frame length: {}", cfg.frame.length);
                    println!(
                        "  Keys: {} from field {} (cap {})",
                        cfg.keys.count, cfg.keys.offset, cfg.keys.velocity_cap
                    );
                    if cfg.distance.enabled {
                        println!(
                            "  Distance: {} sensors -> {:?} on channel {}",
                            cfg.distance.sensors.len(),
                            cfg.distance.control(),
                            cfg.distance.channel
                        );
                    } else {
                        println!("  Distance: disabled");
                    }
                    if cfg.aftertouch.enabled {
                        println!(
                            "  Aftertouch: {} segments -> {:?} on channel {}",
                            cfg.aftertouch.segments.len(),
                            cfg.aftertouch.control(),
                            cfg.aftertouch.channel
                        );
                    } else {
                        println!("  Aftertouch: disabled");
                    }
                    println!("  MIDI port: {}", cfg.midi.port.as_deref().unwrap_or("(first available)"));
                }
                Err(e) => {
                    println!("Configuration is invalid: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let path = "musicbox.yaml";
            if std::path::Path::new(path).exists() {
                println!("musicbox.yaml already exists. Not overwriting.");
            } else {
                std::fs::write(path, config::EXAMPLE_CONFIG)?;
                println!("Created musicbox.yaml with example configuration.");
            }
        }
    }

    Ok(())
}

/// Run the pipeline until the input ends or Ctrl-C is pressed
fn play<S: LineSource, O: OutputSink>(cfg: &MusicBoxConfig, source: S, sink: O) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        if request_stop(&handler_stop) {
            std::process::exit(130);
        }
        warn!("stopping after the next line, press Ctrl-C again to quit now");
    })?;

    let engine = Engine::new(cfg)?;
    let mut runner = Runner::new(engine, source, sink, cfg.errors.clone());
    let summary = runner.run(&stop)?;
    info!(
        "Processed {} frames, skipped {} lines",
        summary.frames, summary.errors
    );
    Ok(())
}
