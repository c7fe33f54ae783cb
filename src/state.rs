use std::fs;
use std::path::{Path, PathBuf};
use log::{debug, info, warn};
use crate::accelerator::{Accelerator, AcceleratorMap};
use crate::classifier::{self, Classification};
use crate::completion::CompletionProvider;
use crate::config::Config;
use crate::error::{Result, RunError};
use crate::executor::Launcher;
use crate::index::ApplicationIndex;
use crate::matcher::FuzzyMatcher;
use crate::model::{ApplicationEntry, MatchOutcome, MatchResult};
use crate::settings::SettingsFile;
use crate::sources::desktop::DesktopEntry;
use crate::sources::history::HistoryStore;
use crate::sources::menu;

pub const DEFAULT_LABEL: &str = "Select an application to view its description.";
const LAUNCHER_ICON: &str = "system-run";

/// What the front end has to do after the entry text changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextChange {
    /// Text is blank; any pending match refresh is moot.
    Cleared,
    /// Matches must be recomputed for the new text.
    FindCommand,
    /// Nothing further to do.
    Unchanged,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launched {
    Command(Vec<String>),
    Location(String),
}

/// State of one open run dialog.
pub struct DialogSession {
    config: Config,
    home: PathBuf,
    search_path: Vec<PathBuf>,
    locale: Option<String>,
    settings: SettingsFile,
    history: HistoryStore,
    index: ApplicationIndex,
    /// Set once a load finished, even one that found nothing.
    index_loaded: bool,
    outcome: MatchOutcome,
    matcher: FuzzyMatcher,
    accelerators: AcceleratorMap,
    completion: CompletionProvider,
    text: String,
    label: String,
    icon: Option<String>,
    /// Name of the entry the text stands for; used when saving a launcher.
    item_name: Option<String>,
    desktop_path: Option<PathBuf>,
    /// The text was filled in from a list selection rather than typed.
    use_program_list: bool,
    terminal: bool,
    cursor: Option<usize>,
    closed: bool,
}

impl DialogSession {
    pub fn new(config: Config, settings: SettingsFile, home: PathBuf, search_path: Vec<PathBuf>) -> Self {
        let history = HistoryStore::new(config.general.history_size, config.general.history_reverse);
        let locale = config.sources.locale();
        let completion = CompletionProvider::new(home.clone(), search_path.clone());
        let label = if config.dialog.enable_program_list { DEFAULT_LABEL.to_string() } else { String::new() };

        Self {
            config,
            home,
            search_path,
            locale,
            settings,
            history,
            index: ApplicationIndex::default(),
            index_loaded: false,
            outcome: MatchOutcome::default(),
            matcher: FuzzyMatcher::new(),
            accelerators: AcceleratorMap::default(),
            completion,
            text: String::new(),
            label,
            icon: None,
            item_name: None,
            desktop_path: None,
            use_program_list: false,
            terminal: false,
            cursor: None,
            closed: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Home directory and program search path commands resolve against.
    pub fn environment(&self) -> (&Path, &[PathBuf]) {
        (&self.home, &self.search_path)
    }

    /// Replaces the program list. Returns whether matches need refreshing
    /// because text was typed while the list was loading.
    pub fn install_index(&mut self, index: ApplicationIndex) -> bool {
        self.outcome = MatchOutcome {
            rows: (0..index.len()).map(MatchResult::shown).collect(),
            best: None,
        };
        self.index = index;
        self.index_loaded = true;
        self.cursor = None;
        self.accelerators.rebuild(&self.outcome.rows);
        !self.text.trim_start().is_empty() && !self.use_program_list
    }

    /// A key was typed and the entry now reads `text`.
    pub fn type_text(&mut self, text: &str) -> TextChange {
        self.use_program_list = false;
        self.cursor = None;

        if self.config.dialog.enable_autocompletion {
            let trimmed = text.trim_start();
            if !trimmed.is_empty() {
                self.completion.update(trimmed);
            }
        }
        self.set_text(text)
    }

    /// Updates everything derived from the entry text.
    pub fn set_text(&mut self, text: &str) -> TextChange {
        self.text = text.to_string();
        let start = text.trim_start();

        if !self.use_program_list {
            self.desktop_path = None;
            self.item_name = None;
        }

        if start.is_empty() {
            self.icon = None;
            if self.config.dialog.enable_program_list {
                self.label = DEFAULT_LABEL.to_string();
                self.outcome = MatchOutcome {
                    rows: (0..self.index.len()).map(MatchResult::shown).collect(),
                    best: None,
                };
                self.accelerators.rebuild(&self.outcome.rows);
            }
            return TextChange::Cleared;
        }

        if self.config.dialog.enable_program_list && !self.use_program_list {
            self.label = format!("Will run command: '{start}'");
            return TextChange::FindCommand;
        }
        TextChange::Unchanged
    }

    /// Recomputes visibility, the matching entry and the accelerators.
    pub fn refresh_matches(&mut self) {
        if self.index.is_empty() {
            self.icon = None;
            return;
        }

        let outcome = self.matcher.match_entries(&self.text, self.index.entries());
        let best = outcome.best.and_then(|idx| self.index.get(idx));
        self.icon = best.and_then(|e| e.icon.clone());
        self.item_name = best.map(|e| e.display_name.clone());
        self.outcome = outcome;
        self.cursor = None;
        self.accelerators.rebuild(&self.outcome.rows);
        debug!(
            "Matches for {:?}: {} visible, {} bound",
            self.text,
            self.outcome.visible_entries().count(),
            self.accelerators.len()
        );
    }

    /// Rows currently shown with their match state, in display order.
    pub fn visible_rows(&self) -> Vec<(MatchResult, &ApplicationEntry)> {
        self.outcome
            .rows
            .iter()
            .filter(|row| row.visible)
            .filter_map(|row| Some((*row, self.index.get(row.entry)?)))
            .collect()
    }

    pub fn visible_entries(&self) -> Vec<&ApplicationEntry> {
        self.visible_rows().into_iter().map(|(_, entry)| entry).collect()
    }

    /// Moves the cursor to visible row `position` and loads its entry.
    /// Unreadable desktop files leave the entry text untouched.
    pub fn select_row(&mut self, position: usize) -> bool {
        let Some(path) = self.visible_entries().get(position).map(|e| e.source_path.clone()) else {
            return false;
        };
        self.cursor = Some(position);

        let Some(desktop) = menu::read_selection(&path, self.locale.as_deref()) else {
            debug!("Ignoring selection of unreadable {:?}", path);
            return false;
        };

        self.use_program_list = true;
        self.desktop_path = Some(path);
        self.item_name = None;

        let text = desktop.command_text().unwrap_or_default();
        self.set_text(&text);
        self.icon = desktop.icon;
        self.label = desktop.comment.unwrap_or_default();
        self.terminal = desktop.terminal;
        true
    }

    pub fn move_cursor(&mut self, delta: i32) -> bool {
        let len = self.outcome.visible_entries().count();
        if len == 0 {
            self.cursor = None;
            return false;
        }

        let current = match self.cursor {
            Some(position) => position as i64,
            None if delta > 0 => -1,
            None => 0,
        };
        let next = (current + i64::from(delta)).rem_euclid(len as i64) as usize;
        self.select_row(next)
    }

    /// Selects the row bound to `accel`; unbound keys do nothing.
    pub fn press_accelerator(&mut self, accel: &Accelerator) -> Option<usize> {
        let position = self.accelerators.lookup(accel)?;
        self.select_row(position);
        Some(position)
    }

    pub fn accelerator_for(&self, position: usize) -> Option<Accelerator> {
        self.accelerators.for_row(position)
    }

    /// Selects `position` and runs it.
    pub fn activate(&mut self, position: usize, launcher: &dyn Launcher) -> Result<Option<Launched>> {
        self.select_row(position);
        self.execute(launcher)
    }

    /// Runs the entry text. Success records history and closes the dialog;
    /// failures leave both untouched.
    pub fn execute(&mut self, launcher: &dyn Launcher) -> Result<Option<Launched>> {
        let command = self.text.trim_start().to_string();
        if command.is_empty() {
            return Ok(None);
        }

        let launched = match classifier::classify(&command, &self.home, &self.search_path)? {
            Classification::Executable { argv, program } => {
                debug!("{:?} resolves to {:?}", command, program);
                let argv = if self.terminal {
                    let mut full = self.config.general.terminal_argv();
                    full.extend(argv);
                    full
                } else {
                    argv
                };
                launcher.spawn(&argv).map_err(|source| RunError::Spawn {
                    command: command.clone(),
                    source,
                })?;
                Launched::Command(argv)
            }
            Classification::UriOrPath(uri) => {
                launcher
                    .show_uri(&uri)
                    .map_err(|source| RunError::Display { uri: uri.clone(), source })?;
                Launched::Location(uri)
            }
        };

        self.record_history(&command);
        self.close();
        Ok(Some(launched))
    }

    fn record_history(&mut self, command: &str) {
        self.settings.data.history = self.history.record(&self.settings.data.history, command);
        if let Err(e) = self.settings.save() {
            warn!("Could not save history: {}", e);
        }
    }

    /// History in dropdown order.
    pub fn history(&self) -> Vec<String> {
        self.history.load(&self.settings.data.history)
    }

    pub fn clear_history(&mut self) {
        self.settings.data.history.clear();
        if let Err(e) = self.settings.save() {
            warn!("Could not save history: {}", e);
        }
    }

    pub fn show_program_list(&self) -> bool {
        self.config.dialog.enable_program_list
            && self
                .settings
                .data
                .show_program_list
                .unwrap_or(self.config.dialog.show_program_list)
    }

    /// Flips and persists list visibility; a no-op when the list is disabled.
    pub fn toggle_program_list(&mut self) -> bool {
        if !self.config.dialog.enable_program_list {
            return false;
        }
        let show = !self.show_program_list();
        self.settings.data.show_program_list = Some(show);
        if let Err(e) = self.settings.save() {
            warn!("Could not save list visibility: {}", e);
        }
        show
    }

    pub fn toggle_terminal(&mut self) -> bool {
        self.terminal = !self.terminal;
        self.terminal
    }

    pub fn completion_candidates(&self) -> Vec<&str> {
        self.completion.candidates(self.text.trim_start())
    }

    pub fn inline_completion(&self) -> Option<String> {
        if !self.config.dialog.enable_autocompletion {
            return None;
        }
        self.completion.inline_completion(self.text.trim_start())
    }

    /// Takes the inline completion as if it had been typed.
    pub fn accept_completion(&mut self) -> Option<TextChange> {
        let completed = self.inline_completion()?;
        Some(self.type_text(&completed))
    }

    /// Appends a dropped file name, shell-quoted when needed.
    pub fn append_file(&mut self, file: &str) -> Option<TextChange> {
        if file.is_empty() || file.starts_with('-') {
            return None;
        }
        let quoted = quote_string(file)?;
        let text = if self.text.is_empty() {
            quoted
        } else {
            format!("{} {}", self.text, quoted)
        };
        Some(self.set_text(&text))
    }

    /// Writes a desktop entry for the current text into `dir`. A selected
    /// list entry is copied as is.
    pub fn create_launcher(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let text = self.text.trim_start();
        if text.is_empty() {
            return Ok(None);
        }

        if let Some(selected) = &self.desktop_path {
            let stem = selected.file_stem().and_then(|s| s.to_str()).unwrap_or("launcher");
            let path = unique_desktop_path(dir, stem);
            fs::copy(selected, &path).map_err(|source| RunError::LauncherFile {
                path: path.clone(),
                source,
            })?;
            info!("Copied launcher {:?} to {:?}", selected, path);
            return Ok(Some(path));
        }

        let is_program = (text.starts_with('/') || classifier::uri_scheme(text).is_none())
            && classifier::executable_argv(text, &self.home, &self.search_path).is_some();

        let mut entry = DesktopEntry {
            terminal: self.terminal,
            icon: Some(self.icon.clone().unwrap_or_else(|| LAUNCHER_ICON.to_string())),
            ..Default::default()
        };
        let name = if is_program {
            entry.kind = Some("Application".to_string());
            entry.exec = Some(text.to_string());
            self.item_name.clone().unwrap_or_else(|| text.to_string())
        } else {
            let uri = classifier::location_uri(text, &self.home);
            entry.kind = Some("Link".to_string());
            entry.url = Some(uri.clone());
            uri
        };
        entry.name = Some(name.clone());

        let path = unique_desktop_path(dir, &name);
        fs::write(&path, entry.to_key_file()).map_err(|source| RunError::LauncherFile {
            path: path.clone(),
            source,
        })?;
        info!("Saved launcher {:?}", path);
        Ok(Some(path))
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn item_name(&self) -> Option<&str> {
        self.item_name.as_deref()
    }

    pub fn terminal(&self) -> bool {
        self.terminal
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn index(&self) -> &ApplicationIndex {
        &self.index
    }

    pub fn index_loaded(&self) -> bool {
        self.index_loaded
    }
}

/// Leaves plain names alone and shell-quotes anything else.
fn quote_string(s: &str) -> Option<String> {
    let plain = s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_./=:".contains(c));
    if plain {
        Some(s.to_string())
    } else {
        shlex::try_quote(s).ok().map(|q| q.into_owned())
    }
}

fn unique_desktop_path(dir: &Path, name: &str) -> PathBuf {
    let mut base: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '-' })
        .collect();
    base = base.trim_matches('-').to_string();
    if base.is_empty() {
        base = "launcher".to_string();
    }

    let mut candidate = dir.join(format!("{base}.desktop"));
    let mut n = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{base}-{n}.desktop"));
        n += 1;
    }
    candidate
}
