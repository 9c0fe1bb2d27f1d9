//! Memory Tree - a tree of letters that ripen over time.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use orchard::{App, AppConfig, AudioOutputs, Command, LetterSet};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "memory_tree", about = "A tree of letters that ripen over time")]
#[command(version)]
struct Cli {
    /// Config file (defaults to config.ron in the current directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Letter dataset, overriding the config
    #[arg(long)]
    letters: Option<PathBuf>,

    /// Write the generated bark textures as PNGs into this directory
    #[arg(long, value_name = "DIR")]
    export_textures: Option<PathBuf>,

    /// Procedural seed, overriding the config
    #[arg(long)]
    seed: Option<u64>,

    /// Start muted
    #[arg(long)]
    mute: bool,

    /// Do not open an audio device
    #[arg(long)]
    no_audio: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let stored = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let mut config = stored.clone();
    if let Some(letters) = cli.letters {
        config.letters_path = letters;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    config.muted |= cli.mute;
    config.disable_audio |= cli.no_audio;

    let letters = LetterSet::load(&config.letters_path)
        .with_context(|| format!("loading letters from {}", config.letters_path.display()))?;
    let outputs = if config.disable_audio {
        AudioOutputs::silent()
    } else {
        AudioOutputs::open()
    };

    let started_muted = config.muted;

    log::info!("Starting Memory Tree with {} letters", letters.len());
    let mut app = App::new(config, letters, outputs, Local::now().naive_local());

    if let Some(dir) = &cli.export_textures {
        for path in app.scene().export_textures(dir)? {
            println!("wrote {}", path.display());
        }
    }

    println!("Memory Tree. Type `help` for commands.");
    let mut out = Vec::new();
    app.wait(Duration::from_millis(3200), &mut out);
    print_lines(&out);

    let stdin = std::io::stdin();
    prompt()?;
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            prompt()?;
            continue;
        }
        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => {
                print_lines(&app.refresh_ripeness(Local::now().naive_local()));
                print_lines(&app.execute(command));
            }
            Err(e) => println!("{}", e),
        }
        prompt()?;
    }

    // Remember a mute toggled during the session; other overrides stay one-off.
    let muted = app.store().is_muted();
    if muted != started_muted {
        let stored = AppConfig { muted, ..stored };
        match &cli.config {
            Some(path) => stored.save_to(path),
            None => stored.save(),
        }
    }

    log::info!("Goodbye");
    Ok(())
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}
