use std::fs;
use std::io;
use std::path::Path;
use std::sync::LazyLock;
use regex::{Captures, Regex};
use thiserror::Error;

const GROUP: &str = "[Desktop Entry]";

#[derive(Error, Debug)]
pub enum DesktopEntryError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("missing [Desktop Entry] group")]
    MissingGroup,
}

/// The fields of a desktop entry this launcher reads and writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesktopEntry {
    pub kind: Option<String>,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub exec: Option<String>,
    pub url: Option<String>,
    pub icon: Option<String>,
    pub terminal: bool,
    pub no_display: bool,
    pub hidden: bool,
}

impl DesktopEntry {
    pub fn load(path: &Path, locale: Option<&str>) -> Result<Self, DesktopEntryError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content, locale)
    }

    pub fn parse(content: &str, locale: Option<&str>) -> Result<Self, DesktopEntryError> {
        let variants = locale.map(locale_variants).unwrap_or_default();
        let mut entry = DesktopEntry::default();
        // Rank of the locale variant each localized value came from; lower wins.
        let mut name_rank = usize::MAX;
        let mut comment_rank = usize::MAX;
        let mut icon_rank = usize::MAX;
        let mut in_group = false;
        let mut seen_group = false;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') { continue; }

            if line.starts_with('[') {
                in_group = line == GROUP;
                seen_group |= in_group;
                continue;
            }

            if !in_group { continue; }

            let Some((key, value)) = line.split_once('=') else { continue };
            let (key, value) = (key.trim(), unescape(value.trim()));

            let (base, rank) = match key.split_once('[') {
                Some((base, rest)) => {
                    let tag = rest.trim_end_matches(']');
                    match variants.iter().position(|v| v == tag) {
                        Some(rank) => (base, rank),
                        None => continue,
                    }
                }
                None => (key, variants.len()),
            };

            match base {
                "Type" => entry.kind = Some(value),
                "Exec" => entry.exec = Some(value),
                "URL" => entry.url = Some(value),
                "Terminal" => entry.terminal = value == "true",
                "NoDisplay" => entry.no_display = value == "true",
                "Hidden" => entry.hidden = value == "true",
                "Name" => set_ranked(&mut entry.name, &mut name_rank, value, rank),
                "Comment" => set_ranked(&mut entry.comment, &mut comment_rank, value, rank),
                "Icon" => set_ranked(&mut entry.icon, &mut icon_rank, value, rank),
                _ => {}
            }
        }

        if !seen_group {
            return Err(DesktopEntryError::MissingGroup);
        }
        Ok(entry)
    }

    /// Whether the entry belongs in the program list.
    pub fn is_listed_application(&self) -> bool {
        self.kind.as_deref().is_none_or(|k| k == "Application")
            && !self.no_display
            && !self.hidden
            && self.exec.is_some()
    }

    /// The text a selection puts into the entry box. Whitespace left
    /// behind by a trailing field code is dropped.
    pub fn command_text(&self) -> Option<String> {
        match &self.exec {
            Some(exec) => Some(strip_field_codes(exec).trim_end().to_string()),
            None => self.url.clone(),
        }
    }

    pub fn to_key_file(&self) -> String {
        let mut out = String::from(GROUP);
        out.push('\n');
        let mut push = |key: &str, value: &str| {
            out.push_str(key);
            out.push('=');
            out.push_str(&escape(value));
            out.push('\n');
        };

        push("Version", "1.0");
        if let Some(kind) = &self.kind { push("Type", kind); }
        if let Some(name) = &self.name { push("Name", name); }
        if let Some(comment) = &self.comment { push("Comment", comment); }
        if let Some(exec) = &self.exec { push("Exec", exec); }
        if let Some(url) = &self.url { push("URL", url); }
        if let Some(icon) = &self.icon { push("Icon", icon); }
        push("Terminal", if self.terminal { "true" } else { "false" });
        out
    }
}

fn set_ranked(slot: &mut Option<String>, best: &mut usize, value: String, rank: usize) {
    if rank <= *best {
        *slot = Some(value);
        *best = rank;
    }
}

/// Locale tags to try, most specific first: `de_DE.UTF-8@euro` gives
/// `de_DE@euro`, `de_DE`, `de@euro`, `de`.
fn locale_variants(locale: &str) -> Vec<String> {
    let (rest, modifier) = match locale.split_once('@') {
        Some((rest, m)) => (rest, Some(m)),
        None => (locale, None),
    };
    let rest = rest.split('.').next().unwrap_or(rest);
    let (lang, country) = match rest.split_once('_') {
        Some((l, c)) => (l, Some(c)),
        None => (rest, None),
    };

    let mut variants = Vec::new();
    if let (Some(c), Some(m)) = (country, modifier) {
        variants.push(format!("{lang}_{c}@{m}"));
    }
    if let Some(c) = country {
        variants.push(format!("{lang}_{c}"));
    }
    if let Some(m) = modifier {
        variants.push(format!("{lang}@{m}"));
    }
    if !lang.is_empty() {
        variants.push(lang.to_string());
    }
    variants
}

static FIELD_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("%[%fFuUdDnNickvm]").expect("static regex"));

/// Removes Exec field codes (`%f`, `%U`, ...) and unescapes `%%`.
pub fn strip_field_codes(exec: &str) -> String {
    let stripped = FIELD_CODE.replace_all(exec, |caps: &Captures| {
        if &caps[0] == "%%" { "%" } else { "" }
    });
    stripped.into_owned()
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            ' ' if i == 0 => out.push_str("\\s"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIREFOX: &str = "\
[Desktop Entry]
Type=Application
Name=Firefox
Name[de]=Firefox Webbrowser
Comment=Browse the Web
Exec=/usr/bin/firefox %u
Icon=firefox
Terminal=false

[Desktop Action new-window]
Name=New Window
Exec=/usr/bin/firefox --new-window
";

    #[test]
    fn test_parse_main_group_only() {
        let entry = DesktopEntry::parse(FIREFOX, None).unwrap();
        assert_eq!(entry.kind.as_deref(), Some("Application"));
        assert_eq!(entry.name.as_deref(), Some("Firefox"));
        assert_eq!(entry.comment.as_deref(), Some("Browse the Web"));
        assert_eq!(entry.exec.as_deref(), Some("/usr/bin/firefox %u"));
        assert_eq!(entry.icon.as_deref(), Some("firefox"));
        assert!(!entry.terminal);
        assert!(entry.is_listed_application());
    }

    #[test]
    fn test_localized_name_preferred() {
        let entry = DesktopEntry::parse(FIREFOX, Some("de_DE.UTF-8")).unwrap();
        assert_eq!(entry.name.as_deref(), Some("Firefox Webbrowser"));

        let entry = DesktopEntry::parse(FIREFOX, Some("fr_FR")).unwrap();
        assert_eq!(entry.name.as_deref(), Some("Firefox"));
    }

    #[test]
    fn test_locale_variants_order() {
        assert_eq!(
            locale_variants("sr_RS.UTF-8@latin"),
            vec!["sr_RS@latin", "sr_RS", "sr@latin", "sr"]
        );
        assert_eq!(locale_variants("pt"), vec!["pt"]);
    }

    #[test]
    fn test_missing_group_is_malformed() {
        let err = DesktopEntry::parse("Name=Nothing\n", None).unwrap_err();
        assert!(matches!(err, DesktopEntryError::MissingGroup));
    }

    #[test]
    fn test_hidden_and_link_entries_not_listed() {
        let hidden = DesktopEntry::parse("[Desktop Entry]\nExec=x\nNoDisplay=true\n", None).unwrap();
        assert!(!hidden.is_listed_application());

        let link = DesktopEntry::parse("[Desktop Entry]\nType=Link\nURL=https://example.org\n", None).unwrap();
        assert!(!link.is_listed_application());
        assert_eq!(link.command_text().as_deref(), Some("https://example.org"));
    }

    #[test]
    fn test_strip_field_codes() {
        assert_eq!(strip_field_codes("/usr/bin/firefox %u"), "/usr/bin/firefox ");
        assert_eq!(strip_field_codes("gimp-2.10 %U --batch"), "gimp-2.10  --batch");
        assert_eq!(strip_field_codes("printf 100%% %f"), "printf 100% ");
        assert_eq!(strip_field_codes("keep %z code"), "keep %z code");
        assert_eq!(strip_field_codes("tool %f  "), "tool   ");
    }

    #[test]
    fn test_command_text_drops_trailing_space() {
        let entry = DesktopEntry::parse("[Desktop Entry]\nExec=/usr/bin/firefox %u\n", None).unwrap();
        assert_eq!(entry.command_text().as_deref(), Some("/usr/bin/firefox"));
    }

    #[test]
    fn test_escapes_in_values() {
        let entry = DesktopEntry::parse("[Desktop Entry]\nComment=\\sline one\\nline two\n", None).unwrap();
        assert_eq!(entry.comment.as_deref(), Some(" line one\nline two"));
    }

    #[test]
    fn test_key_file_output_reads_back() {
        let entry = DesktopEntry {
            kind: Some("Application".to_string()),
            name: Some("My Tool".to_string()),
            exec: Some("mytool --flag".to_string()),
            icon: Some("system-run".to_string()),
            terminal: true,
            ..Default::default()
        };
        let text = entry.to_key_file();
        assert!(text.starts_with("[Desktop Entry]\n"));
        assert!(text.contains("Exec=mytool --flag\n"));
        assert!(text.contains("Terminal=true\n"));

        let parsed = DesktopEntry::parse(&text, None).unwrap();
        assert_eq!(parsed, entry);
    }
}
