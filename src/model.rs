use std::path::PathBuf;

/// One launchable application as listed in the program list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationEntry {
    pub display_name: String,        // Name shown in the list
    pub description: Option<String>, // Comment key
    pub exec: String,                // Raw Exec line, field codes included
    pub icon: Option<String>,        // Icon name/path
    pub source_path: PathBuf,        // The .desktop file; identity of the entry
}

impl ApplicationEntry {
    pub fn new(display_name: String, exec: String, source_path: PathBuf) -> Self {
        Self {
            display_name,
            description: None,
            exec,
            icon: None,
            source_path,
        }
    }
}

/// How a typed command matched an entry's exec line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandMatch {
    /// Text and exec are identical.
    Exact,
    /// The basenames of the first words agree.
    Basename,
}

impl CommandMatch {
    pub fn is_fuzzy(self) -> bool {
        self == CommandMatch::Basename
    }
}

/// Per-row match state, recomputed on every text change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub entry: usize,
    pub command_match: Option<CommandMatch>,
    pub visible: bool,
}

impl MatchResult {
    pub fn shown(entry: usize) -> Self {
        Self {
            entry,
            command_match: None,
            visible: true,
        }
    }

    pub fn is_fuzzy(&self) -> bool {
        self.command_match.is_some_and(CommandMatch::is_fuzzy)
    }
}

/// Outcome of matching the whole index against one input text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub rows: Vec<MatchResult>,
    /// Entry whose icon and name stand for the typed command.
    pub best: Option<usize>,
}

impl MatchOutcome {
    pub fn visible_entries(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().filter(|r| r.visible).map(|r| r.entry)
    }
}
