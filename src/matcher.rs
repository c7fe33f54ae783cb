use crate::model::{ApplicationEntry, CommandMatch, MatchOutcome, MatchResult};
use nucleo_matcher::pattern::{Atom, AtomKind, CaseMatching, Normalization};
use nucleo_matcher::{Matcher, Utf32Str};
use std::path::Path;

/// Compares typed text with an entry's exec line: identical strings match
/// exactly, otherwise the basenames of the first words are compared.
pub fn fuzzy_match(text: &str, exec: &str) -> Option<CommandMatch> {
    if text == exec {
        return Some(CommandMatch::Exact);
    }

    let word1 = command_basename(text)?;
    let word2 = command_basename(exec)?;
    (word1 == word2).then_some(CommandMatch::Basename)
}

fn command_basename(command: &str) -> Option<&str> {
    let first = command.split_whitespace().next()?;
    let trimmed = first.trim_end_matches('/');
    if trimmed.is_empty() {
        return Some("/");
    }
    Path::new(trimmed).file_name().and_then(|n| n.to_str())
}

pub struct FuzzyMatcher {
    matcher: Matcher,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FuzzyMatcher {
    pub fn new() -> Self {
        Self {
            matcher: Matcher::new(nucleo_matcher::Config::DEFAULT),
        }
    }

    /// Decides visibility of every entry for `text` and picks the entry
    /// that stands for the typed command. Only exact or basename matches
    /// can become that entry; the first one in index order wins. Entries
    /// mentioning the text in exec, name or description stay visible.
    pub fn match_entries(&mut self, text: &str, entries: &[ApplicationEntry]) -> MatchOutcome {
        if text.is_empty() {
            return MatchOutcome {
                rows: (0..entries.len()).map(MatchResult::shown).collect(),
                best: None,
            };
        }

        let atom = Atom::new(
            text,
            CaseMatching::Ignore,
            Normalization::Never,
            AtomKind::Substring,
            false,
        );
        let mut buf = Vec::new();
        let mut best = None;
        let mut rows = Vec::with_capacity(entries.len());

        for (idx, entry) in entries.iter().enumerate() {
            let command_match = fuzzy_match(text, &entry.exec);
            if best.is_none() && command_match.is_some() {
                best = Some(idx);
            }

            let visible = command_match.is_some() || {
                let mut contains = |haystack: &str| {
                    atom.score(Utf32Str::new(haystack, &mut buf), &mut self.matcher)
                        .is_some()
                };
                contains(&entry.exec)
                    || contains(&entry.display_name)
                    || entry.description.as_deref().is_some_and(&mut contains)
            };

            rows.push(MatchResult {
                entry: idx,
                command_match,
                visible,
            });
        }

        MatchOutcome { rows, best }
    }
}
