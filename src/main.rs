//! splitmux - run several commands side by side in one terminal
//!
//! The screen is divided by a tree of splits. Every leaf runs a shell command
//! in its own pseudo-terminal; groups run a chain of commands one after the
//! other in the same pane.
//!
//! # Quick Start
//!
//! ```text
//! splitmux -- htop "tail -f app.log"     # two panes side by side
//! splitmux -v -- "cargo watch" "npm run dev"
//! splitmux -f layout.toml                # tree from a layout file
//! ```
//!
//! # Keybindings (Ctrl+A prefix)
//!
//! | Key | Action |
//! |-----|--------|
//! | Space / Backspace | Next / previous pane |
//! | Arrow keys | Navigate panes |
//! | 1-9 | Jump to pane |
//! | z | Toggle zoom |
//! | v | Scroll mode |
//! | r | Restart pane |
//! | m | Pane menu |
//! | k | Quit |

mod config;
mod core;
mod ui;
mod wm;

use std::env;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{Config, CursorStyle, Options, WaitPolicy};
use crate::core::pty::{PaneEvent, PtySpawner};
use crate::ui::renderer::Renderer;
use crate::wm::manager::Multiplexer;
use crate::wm::pane::PaneFlags;
use crate::wm::tree::{Node, Orientation};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Longest wait for terminal input before checking panes and timers again
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Command-line settings
#[derive(Debug, Default, PartialEq)]
struct Cli {
    activator: Option<char>,
    mouse: bool,
    number: bool,
    cursor: Option<CursorStyle>,
    wait: Option<String>,
    file: Option<PathBuf>,
    vertical: bool,
    commands: Vec<String>,
}

#[derive(Debug, PartialEq)]
enum CliAction {
    Run(Cli),
    Help,
    Version,
}

impl Cli {
    /// Override the configured options
    fn apply(&self, options: &mut Options) {
        if let Some(activator) = self.activator {
            options.activator = activator;
        }
        options.mouse |= self.mouse;
        options.number |= self.number;
        if let Some(cursor) = self.cursor {
            options.cursor = cursor;
        }
        if let Some(wait) = &self.wait {
            options.wait = WaitPolicy::parse(wait);
        }
    }

    fn tree(&self) -> anyhow::Result<Node> {
        match &self.file {
            Some(_) if !self.commands.is_empty() => {
                anyhow::bail!("give either a layout file or commands, not both")
            }
            Some(path) => Ok(Node::load(path)?),
            None => {
                let orientation = if self.vertical {
                    Orientation::Vertical
                } else {
                    Orientation::Horizontal
                };
                Ok(Node::from_commands(&self.commands, orientation)?)
            }
        }
    }
}

fn print_version() {
    eprintln!("splitmux {}", VERSION);
}

fn print_help() {
    eprintln!("splitmux {} - run several commands side by side in one terminal", VERSION);
    eprintln!();
    eprintln!("Usage: splitmux [OPTIONS] [--] <CMD>...");
    eprintln!("       splitmux [OPTIONS] -f <LAYOUT.toml>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -a, --activator <C>   Prefix key letter (default: a, used as Ctrl+A)");
    eprintln!("  -m, --mouse           Enable mouse in every pane");
    eprintln!("  -n, --number          Show pane numbers");
    eprintln!("  -c, --cursor <STYLE>  Cursor shape: block, underline, bar");
    eprintln!("  -w, --wait <POLICY>   After all panes end: \"\" exits, \"error\" exits");
    eprintln!("                        unless one failed, anything else stays open");
    eprintln!("  -f, --file <PATH>     Read the pane tree from a TOML layout file");
    eprintln!("  -v, --vertical        Stack command panes vertically");
    eprintln!("  -V, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Settings are also read from ~/.splitmux/config.toml.");
    eprintln!("The log is written to ~/.splitmux/splitmux.log (level: $SPLITMUX_LOG).");
}

fn parse_args(args: &[String]) -> Result<CliAction, String> {
    let mut cli = Cli::default();
    let mut i = 0;

    let value = |i: usize, flag: &str| -> Result<String, String> {
        args.get(i)
            .cloned()
            .ok_or_else(|| format!("missing value for {}", flag))
    };

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(CliAction::Help),
            "-V" | "--version" => return Ok(CliAction::Version),
            "-a" | "--activator" => {
                i += 1;
                let text = value(i, "--activator")?;
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphabetic() => {
                        cli.activator = Some(c.to_ascii_lowercase())
                    }
                    _ => return Err(format!("invalid activator '{}': expected a letter", text)),
                }
            }
            "-m" | "--mouse" => cli.mouse = true,
            "-n" | "--number" => cli.number = true,
            "-c" | "--cursor" => {
                i += 1;
                cli.cursor = Some(value(i, "--cursor")?.parse()?);
            }
            "-w" | "--wait" => {
                i += 1;
                cli.wait = Some(value(i, "--wait")?);
            }
            "-f" | "--file" => {
                i += 1;
                cli.file = Some(PathBuf::from(value(i, "--file")?));
            }
            "-v" | "--vertical" => cli.vertical = true,
            "--" => {
                cli.commands.extend(args[i + 1..].iter().cloned());
                break;
            }
            arg if arg.starts_with('-') && arg.len() > 1 => {
                return Err(format!("unknown argument: {}", arg));
            }
            arg => cli.commands.push(arg.to_string()),
        }
        i += 1;
    }

    Ok(CliAction::Run(cli))
}

/// Log to `~/.splitmux/splitmux.log`; stdout belongs to the screen
fn init_logging() {
    let log_path = config::data_dir()
        .map(|dir| dir.join("splitmux.log"))
        .unwrap_or_else(|| PathBuf::from("splitmux.log"));

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_env("SPLITMUX_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(CliAction::Run(cli)) => cli,
        Ok(CliAction::Help) => {
            print_help();
            return;
        }
        Ok(CliAction::Version) => {
            print_version();
            return;
        }
        Err(e) => {
            eprintln!("splitmux: ERROR: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("splitmux {} starting", VERSION);

    if let Err(e) = run(cli) {
        error!("fatal: {:#}", e);
        eprintln!("splitmux: ERROR: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load();
    let mut options = config.options();
    cli.apply(&mut options);
    let tree = cli.tree()?;
    let cursor = options.cursor;

    let (cols, rows) = Renderer::size().context("cannot query terminal size")?;

    // Let children detect that they run inside splitmux
    env::set_var("SPLITMUX", "1");
    env::set_var("SPLITMUX_VERSION", VERSION);

    let (tx, rx) = mpsc::channel();
    let spawner = PtySpawner::new(tx);
    let mut mux = Multiplexer::new(tree, options, Box::new(spawner), cols, rows, Instant::now());
    if let Err(e) = mux.start() {
        mux.terminate();
        return Err(e.into());
    }

    let mouse = mux.panes.iter().any(|p| p.flags.contains(PaneFlags::MOUSE));
    let mut renderer = Renderer::new(config.color_scheme(), cursor);
    let result = renderer
        .init(mouse)
        .context("cannot set up the terminal")
        .and_then(|()| run_main_loop(&mut mux, &mut renderer, &rx));

    let _ = renderer.cleanup();
    if result.is_err() {
        mux.terminate();
    }
    result
}

/// Drive the multiplexer until it asks to exit
fn run_main_loop(mux: &mut Multiplexer, renderer: &mut Renderer, events: &Receiver<PaneEvent>) -> anyhow::Result<()> {
    loop {
        // Output and exits from the pane reader threads
        loop {
            match events.try_recv() {
                Ok(ev) => mux.handle_pane_event(ev, Instant::now()),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        mux.tick(Instant::now());
        if mux.should_exit() {
            info!("exiting");
            return Ok(());
        }

        if let Some(full) = mux.take_repaint() {
            renderer.render(mux, full)?;
        }
        if mux.take_bell() {
            renderer.bell()?;
        }

        let now = Instant::now();
        let timeout = mux
            .next_deadline()
            .map(|due| due.saturating_duration_since(now))
            .unwrap_or(POLL_INTERVAL)
            .min(POLL_INTERVAL);

        if event::poll(timeout)? {
            mux.handle_event(event::read()?, Instant::now())?;
            while event::poll(Duration::ZERO)? {
                mux.handle_event(event::read()?, Instant::now())?;
            }
        }
    }
}
