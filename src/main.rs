mod accelerator;
mod classifier;
mod completion;
mod config;
mod error;
mod executor;
mod index;
mod matcher;
mod model;
mod scheduler;
mod settings;
mod sources;
mod state;
mod ui;

use std::io;
use std::path::PathBuf;
use std::thread;
use anyhow::{Context, Result};
use calloop::EventLoop;
use calloop::channel::Event;
use clap::{Parser, Subcommand};
use crate::classifier::Classification;
use crate::config::{load_config, Config};
use crate::executor::SystemLauncher;
use crate::index::ApplicationIndex;
use crate::scheduler::Scheduler;
use crate::settings::{default_settings_path, SettingsFile, StoredSettings};
use crate::sources::bin;
use crate::sources::menu::XdgMenuSource;
use crate::state::{DialogSession, Launched};
use crate::ui::dialog::RunDialog;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run or open TEXT once
    Exec {
        text: String,
        /// Run inside the configured terminal
        #[arg(short, long)]
        terminal: bool,
    },
    /// Show the application list as filtered for TEXT
    Matches { text: String },
    /// Show completions for TEXT
    Complete { text: String },
    /// Show the command history
    History {
        #[arg(long)]
        clear: bool,
    },
    /// Save a desktop launcher for TEXT
    CreateLauncher {
        text: String,
        /// Target directory, the temporary directory by default
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(short, long)]
        terminal: bool,
    },
    /// Show how TEXT would be run
    Classify { text: String },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    let home = directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .context("Could not determine the home directory")?;
    let search_path = bin::search_path();
    let settings = match default_settings_path() {
        Some(path) => SettingsFile::open(path),
        None => SettingsFile::in_memory(StoredSettings::default()),
    };
    log::debug!("Settings at {:?}", settings.path());

    let session = DialogSession::new(config.clone(), settings, home, search_path);

    match args.command {
        None => run_dialog(config, session),
        Some(cmd) => run_once(cmd, &config, session),
    }
}

fn menu_source(config: &Config) -> XdgMenuSource {
    XdgMenuSource::new(config.sources.data_dirs(), config.sources.locale())
}

fn run_dialog(config: Config, session: DialogSession) -> Result<()> {
    let mut event_loop: EventLoop<RunDialog> = EventLoop::try_new()?;
    let scheduler = Scheduler::new(event_loop.handle());
    let mut dialog = RunDialog::new(
        session,
        scheduler,
        Box::new(menu_source(&config)),
        Box::new(SystemLauncher::new(&config)),
        ui::dialog::stdout(),
    );

    // Input lines arrive from a reader thread; EOF closes the channel.
    let (tx_lines, rx_lines) = calloop::channel::channel::<String>();
    thread::spawn(move || {
        for line in io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx_lines.send(line).is_err() {
                break;
            }
        }
    });

    event_loop
        .handle()
        .insert_source(rx_lines, |event, _, dialog: &mut RunDialog| match event {
            Event::Msg(line) => dialog.handle_line(&line),
            Event::Closed => dialog.close(),
        })
        .map_err(|e| anyhow::anyhow!("Failed to watch stdin: {}", e.error))?;

    dialog.open();
    loop {
        if dialog.should_exit {
            break;
        }
        event_loop.dispatch(None, &mut dialog)?;
    }

    Ok(())
}

fn run_once(cmd: Cmd, config: &Config, mut session: DialogSession) -> Result<()> {
    match cmd {
        Cmd::Exec { text, terminal } => {
            session.type_text(&text);
            if terminal {
                session.toggle_terminal();
            }
            let launcher = SystemLauncher::new(config);
            match session.execute(&launcher)? {
                Some(Launched::Command(argv)) => println!("Started {}", argv.join(" ")),
                Some(Launched::Location(uri)) => println!("Opened {uri}"),
                None => println!("Nothing to run"),
            }
        }
        Cmd::Matches { text } => {
            session.install_index(ApplicationIndex::load(&menu_source(config)));
            session.type_text(&text);
            session.refresh_matches();

            for (i, entry) in session.visible_entries().iter().enumerate() {
                let accel = session.accelerator_for(i).map(|a| a.to_string()).unwrap_or_default();
                let best = if session.item_name() == Some(entry.display_name.as_str()) { '*' } else { ' ' };
                println!("{best} {accel:>6}  {}", entry.display_name);
            }
            println!("{}", session.label());
        }
        Cmd::Complete { text } => {
            session.type_text(&text);
            for candidate in session.completion_candidates() {
                println!("{candidate}");
            }
            if let Some(completed) = session.inline_completion() {
                println!("Tab: {completed}");
            }
        }
        Cmd::History { clear } => {
            if clear {
                session.clear_history();
            } else {
                for item in session.history() {
                    println!("{item}");
                }
            }
        }
        Cmd::CreateLauncher { text, dir, terminal } => {
            session.type_text(&text);
            if terminal {
                session.toggle_terminal();
            }
            let dir = dir.unwrap_or_else(std::env::temp_dir);
            match session.create_launcher(&dir)? {
                Some(path) => println!("{}", path.display()),
                None => println!("Nothing to save"),
            }
        }
        Cmd::Classify { text } => {
            let (home, search_path) = session.environment();
            match classifier::classify(text.trim_start(), home, search_path)? {
                Classification::Executable { argv, program } => {
                    println!("program {} {:?}", program.display(), argv)
                }
                Classification::UriOrPath(uri) => println!("location {uri}"),
            }
        }
    }
    Ok(())
}
