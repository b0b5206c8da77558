//! termdeck - raw-mode terminal pager and line editor
//!
//! # Quick Start
//!
//! ```text
//! termdeck more notes.txt todo.txt   # page through files
//! dmesg | termdeck more --wrap       # page stdin, keys from /dev/tty
//! termdeck edit notes.txt            # edit, file created on first save
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use termdeck::config::{self, Config};
use termdeck::core::{InputDecoder, TerminalSession, WakeableReader};
use termdeck::editor::{self, Clipboard};
use termdeck::pager;

const FILE_BANNER: &str = "::::::::::::::";

#[derive(Parser, Debug)]
#[command(name = "termdeck", version, about = "Raw-mode terminal pager and line editor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Page through files, or standard input when none are given
    More {
        /// Start with word-wrap on
        #[arg(short, long)]
        wrap: bool,

        files: Vec<PathBuf>,
    },
    /// Edit a file
    Edit { file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = Config::try_load();
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(&config);
    if let Err(e) = &loaded {
        warn!("{}; using defaults", e);
    }

    info!("termdeck {} starting", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Command::More { wrap, files } => run_more(&config, wrap, &files),
        Command::Edit { file } => run_edit(&config, file),
    };
    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    result
}

/// Log to `~/.termdeck/termdeck.log`. The terminal belongs to the UI.
fn init_logging(config: &Config) {
    let log_path = config::data_dir()
        .map(|dir| dir.join("termdeck.log"))
        .unwrap_or_else(|| PathBuf::from("termdeck.log"));

    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) else {
        return;
    };

    let filter = EnvFilter::try_from_env("TERMDECK_LOG")
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run_more(config: &Config, wrap: bool, files: &[PathBuf]) -> anyhow::Result<()> {
    let from_stdin = files.is_empty();
    let items = if from_stdin {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read standard input")?;
        split_lines(&bytes)
    } else {
        read_files(files)?
    };

    if !io::stdout().is_terminal() {
        let mut out = io::stdout().lock();
        for line in &items {
            writeln!(out, "{}", line)?;
        }
        return Ok(());
    }

    let mut options = config.pager_options();
    options.wrap |= wrap;

    // Stdin carries the content, so keys come from the controlling terminal
    let keys: Box<dyn Read + Send> = if from_stdin {
        Box::new(File::open("/dev/tty").context("Failed to open /dev/tty")?)
    } else {
        Box::new(io::stdin())
    };

    let session = TerminalSession::stdio();
    let mut input = InputDecoder::new(WakeableReader::for_terminal(keys));
    let reason = pager::run(&session, &mut input, items, &options)?;
    info!("more: {:?}", reason);
    Ok(())
}

/// Concatenate readable files. Several files each get a name banner.
fn read_files(files: &[PathBuf]) -> anyhow::Result<Vec<String>> {
    let mut items = Vec::new();
    let mut readable = 0;

    for path in files {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("termdeck: {}: {}", path.display(), e);
                warn!("more: skipping {}: {}", path.display(), e);
                continue;
            }
        };
        readable += 1;
        if files.len() > 1 {
            items.push(FILE_BANNER.to_string());
            items.push(path.display().to_string());
            items.push(FILE_BANNER.to_string());
        }
        items.extend(split_lines(&bytes));
    }

    if readable == 0 {
        bail!("No readable files");
    }
    Ok(items)
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes).lines().map(String::from).collect()
}

fn run_edit(config: &Config, file: PathBuf) -> anyhow::Result<()> {
    let session = TerminalSession::stdio();
    let mut input = InputDecoder::new(WakeableReader::for_terminal(io::stdin()));
    let reason = editor::run(
        &session,
        &mut input,
        Some(file.as_path()),
        config.editor_options(),
        Clipboard::system(),
    )?;
    info!("edit: {:?}", reason);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["termdeck", "more", "--wrap", "a", "b"]).unwrap();
        match cli.command {
            Command::More { wrap, files } => {
                assert!(wrap);
                assert_eq!(files, [PathBuf::from("a"), PathBuf::from("b")]);
            }
            other => panic!("unexpected {:?}", other),
        }

        let cli = Cli::try_parse_from(["termdeck", "edit", "x.txt"]).unwrap();
        assert!(matches!(cli.command, Command::Edit { file } if file == PathBuf::from("x.txt")));

        assert!(Cli::try_parse_from(["termdeck", "edit"]).is_err());
    }

    #[test]
    fn test_read_files_banners_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        fs::write(&a, "one\r\ntwo\n").unwrap();
        let missing = dir.path().join("missing.txt");

        let items = read_files(&[a.clone()]).unwrap();
        assert_eq!(items, ["one", "two"]);

        let name = a.display().to_string();
        let items = read_files(&[missing.clone(), a.clone()]).unwrap();
        assert_eq!(items, [FILE_BANNER, name.as_str(), FILE_BANNER, "one", "two"]);

        assert!(read_files(&[missing]).is_err());
    }
}
