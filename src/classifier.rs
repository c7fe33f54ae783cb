use std::path::{Path, PathBuf};
use url::Url;
use crate::error::{Result, RunError};
use crate::sources::bin;

/// What the entry text turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A runnable program; `argv[0]` resolved to `program`.
    Executable { argv: Vec<String>, program: PathBuf },
    /// Something to hand to the desktop's default handler.
    UriOrPath(String),
}

/// Classifies already left-trimmed text.
pub fn classify(text: &str, home: &Path, search_path: &[PathBuf]) -> Result<Classification> {
    if text.contains('\0') {
        return Err(RunError::Encoding(text.replace('\0', "\\0")));
    }

    if text.starts_with('/') || uri_scheme(text).is_none() {
        if let Some((argv, program)) = executable_argv(text, home, search_path) {
            return Ok(Classification::Executable { argv, program });
        }
    }

    Ok(Classification::UriOrPath(location_uri(text, home)))
}

/// Splits `command` into words and checks that the first one names a
/// regular executable file. `~/` at the start of any word is expanded.
pub fn executable_argv(command: &str, home: &Path, search_path: &[PathBuf]) -> Option<(Vec<String>, PathBuf)> {
    let words = shlex::split(command)?;
    if words.is_empty() {
        return None;
    }

    let home_prefix = format!("{}/", home.display().to_string().trim_end_matches('/'));
    let argv: Vec<String> = words
        .into_iter()
        .map(|word| match word.strip_prefix("~/") {
            Some(rest) => format!("{home_prefix}{rest}"),
            None => word,
        })
        .collect();

    let program = bin::find_program_in_path(&argv[0], search_path)?;
    Some((argv, program))
}

/// URI scheme per RFC 3986: a letter, then letters, digits, `+`, `-` or
/// `.`, terminated by a colon.
pub fn uri_scheme(text: &str) -> Option<&str> {
    let (scheme, _) = text.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    let valid = first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

/// URI for text that is not a program: URIs pass through, `~` and
/// relative paths are taken from the home directory.
pub fn location_uri(text: &str, home: &Path) -> String {
    if uri_scheme(text).is_some() {
        return text.to_string();
    }

    let path = if text == "~" {
        home.to_path_buf()
    } else if let Some(rest) = text.strip_prefix("~/") {
        home.join(rest)
    } else if Path::new(text).is_absolute() {
        PathBuf::from(text)
    } else {
        home.join(text)
    };

    Url::from_file_path(&path)
        .map(String::from)
        .unwrap_or_else(|()| path.display().to_string())
}
