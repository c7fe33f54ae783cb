use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use log::debug;
use crate::sources::bin;

/// Path and executable completion for one dialog session.
///
/// Each `(directory, first letter)` pair is listed at most once; everything
/// offered so far accumulates in `items` for the rest of the session.
pub struct CompletionProvider {
    home: PathBuf,
    search_path: Vec<PathBuf>,
    possible_executables: Option<Vec<PathBuf>>,
    scanned: HashSet<String>,
    items: Vec<String>,
    model: Vec<String>,
    dir_scans: usize,
    path_scans: usize,
}

impl CompletionProvider {
    pub fn new(home: PathBuf, search_path: Vec<PathBuf>) -> Self {
        Self {
            home,
            search_path,
            possible_executables: None,
            scanned: HashSet::new(),
            items: Vec::new(),
            model: Vec::new(),
            dir_scans: 0,
            path_scans: 0,
        }
    }

    /// Gathers candidates for `text`. Returns whether a new batch arrived.
    pub fn update(&mut self, text: &str) -> bool {
        if text.is_empty() || text.starts_with(char::is_whitespace) {
            return false;
        }

        let Some(prefix) = path_basename(text).chars().next() else { return false };
        if prefix == '/' || prefix == '.' {
            return false;
        }

        let mut executables = Vec::new();
        let (dirname, dirprefix) = if text.starts_with('/') {
            let dirname = path_dirname(text);
            (PathBuf::from(&dirname), dirname)
        } else {
            let dirprefix = if text.contains('/') {
                path_dirname(text)
            } else {
                executables = self.fill_executables(prefix);
                String::new()
            };
            (self.home.join(&dirprefix), dirprefix)
        };

        let key = format!("{dirprefix}/{prefix}");
        let mut batch = if self.scanned.insert(key) {
            self.fill_files_from(&dirname, &dirprefix, prefix)
        } else {
            Vec::new()
        };
        batch.extend(executables);

        if batch.is_empty() {
            return false;
        }
        debug!("Completion: {} new candidates for {:?}", batch.len(), text);
        self.model = batch.clone();
        self.items.extend(batch);
        true
    }

    fn fill_files_from(&mut self, dirname: &Path, dirprefix: &str, prefix: char) -> Vec<String> {
        self.dir_scans += 1;
        let Ok(read_dir) = fs::read_dir(dirname) else { return Vec::new() };

        let mut list: Vec<String> = read_dir
            .flatten()
            .filter_map(|dent| {
                let name = dent.file_name().into_string().ok()?;
                if !name.starts_with(prefix) {
                    return None;
                }
                let suffix = if dent.path().is_dir() { "/" } else { "" };
                Some(build_filename(dirprefix, &name, suffix))
            })
            .collect();
        list.sort();
        list
    }

    /// Executables on the search path starting with `prefix`. If any of
    /// them was offered before, the whole batch is dropped.
    fn fill_executables(&mut self, prefix: char) -> Vec<String> {
        let search_path = &self.search_path;
        let path_scans = &mut self.path_scans;
        let possible = self.possible_executables.get_or_insert_with(|| {
            *path_scans += 1;
            bin::list_search_path(search_path)
        });

        let mut list = Vec::new();
        for filename in possible.iter() {
            let Some(basename) = filename.file_name().and_then(|n| n.to_str()) else { continue };
            if !basename.starts_with(prefix) || !bin::is_executable_file(filename) {
                continue;
            }
            if self.items.iter().any(|item| item == basename) {
                return Vec::new();
            }
            list.push(basename.to_string());
        }
        list
    }

    /// Candidates of the latest batch that extend `text`, ignoring case,
    /// with the byte length of the part `text` stands for.
    fn matching(&self, text: &str) -> Vec<(&str, usize)> {
        let folded = fold_case(text);
        self.model
            .iter()
            .filter_map(|c| Some((c.as_str(), folded_prefix_len(c, &folded)?)))
            .collect()
    }

    pub fn candidates(&self, text: &str) -> Vec<&str> {
        self.matching(text).into_iter().map(|(c, _)| c).collect()
    }

    /// `text` extended by the common prefix of all candidates, if longer.
    pub fn inline_completion(&self, text: &str) -> Option<String> {
        let matching = self.matching(text);
        let ((first, typed), rest) = matching.split_first()?;

        let common = rest
            .iter()
            .map(|(other, _)| common_prefix_len(first, other))
            .fold(first.len(), usize::min);

        if common <= *typed {
            return None;
        }
        Some(format!("{text}{}", &first[*typed..common]))
    }

    #[cfg(test)]
    pub fn items(&self) -> &[String] {
        &self.items
    }

    #[cfg(test)]
    pub fn dir_scans(&self) -> usize {
        self.dir_scans
    }

    #[cfg(test)]
    pub fn path_scans(&self) -> usize {
        self.path_scans
    }
}

fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Byte length of the prefix of `candidate` whose case fold is `folded`.
fn folded_prefix_len(candidate: &str, folded: &str) -> Option<usize> {
    if folded.is_empty() {
        return Some(0);
    }
    let mut lowered = String::new();
    for (idx, c) in candidate.char_indices() {
        lowered.extend(c.to_lowercase());
        if lowered == folded {
            return Some(idx + c.len_utf8());
        }
        if !folded.starts_with(lowered.as_str()) {
            return None;
        }
    }
    None
}

/// Byte length of the longest shared prefix; a char boundary in both.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, x), y)| x != y)
        .map(|((idx, _), _)| idx)
        .unwrap_or_else(|| a.len().min(b.len()))
}

/// Last path component; `/` for the root, trailing separators ignored.
fn path_basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { "." } else { "/" };
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Everything before the last separator; `.` when there is none.
fn path_dirname(path: &str) -> String {
    match path.rfind('/') {
        None => ".".to_string(),
        Some(idx) => {
            let dir = path[..idx].trim_end_matches('/');
            if dir.is_empty() { "/".to_string() } else { dir.to_string() }
        }
    }
}

fn build_filename(dirprefix: &str, name: &str, suffix: &str) -> String {
    if dirprefix.is_empty() {
        format!("{name}{suffix}")
    } else if dirprefix.ends_with('/') {
        format!("{dirprefix}{name}{suffix}")
    } else {
        format!("{dirprefix}/{name}{suffix}")
    }
}
