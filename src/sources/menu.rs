use crate::sources::desktop::DesktopEntry;
use crate::sources::MenuSource;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use log::{debug, info};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("no application directory found in {0:?}")]
    NoApplicationDirs(Vec<PathBuf>),
}

/// An application listed in the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub display_name: String,
    pub description: Option<String>,
    pub exec: String,
    pub icon: Option<String>,
    pub desktop_file_path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuDirectory {
    pub name: String,
    pub children: Vec<MenuNode>,
}

/// Owned, acyclic snapshot of one node of the application menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuNode {
    Entry(MenuEntry),
    Directory(MenuDirectory),
    /// Another entry or directory reachable under a second name.
    Alias(Box<MenuNode>),
}

/// Builds the menu from `applications/` under each XDG data directory.
pub struct XdgMenuSource {
    data_dirs: Vec<PathBuf>,
    locale: Option<String>,
}

impl XdgMenuSource {
    pub fn new(data_dirs: Vec<PathBuf>, locale: Option<String>) -> Self {
        Self { data_dirs, locale }
    }
}

impl MenuSource for XdgMenuSource {
    fn load(&self) -> Result<MenuDirectory, MenuError> {
        let mut walker = Walker {
            locale: self.locale.as_deref(),
            seen_ids: HashSet::new(),
            entries: 0,
        };
        let mut root = MenuDirectory {
            name: "Applications".to_string(),
            children: Vec::new(),
        };
        let mut searched = Vec::new();

        for data_dir in &self.data_dirs {
            let apps = data_dir.join("applications");
            searched.push(apps.clone());
            if !apps.is_dir() {
                continue;
            }
            debug!("Scanning desktop files in {:?}", apps);
            let mut ancestors = Vec::new();
            if let Ok(canonical) = apps.canonicalize() {
                ancestors.push(canonical);
            }
            let dir = walker.directory(&apps, "", &mut ancestors);
            root.children.push(MenuNode::Directory(dir));
        }

        if root.children.is_empty() {
            return Err(MenuError::NoApplicationDirs(searched));
        }
        info!("MenuSource: found {} entries", walker.entries);
        Ok(root)
    }
}

struct Walker<'a> {
    locale: Option<&'a str>,
    /// Desktop-file IDs already claimed by an earlier data directory.
    seen_ids: HashSet<String>,
    entries: usize,
}

impl Walker<'_> {
    /// `id_prefix` turns `kde/konsole.desktop` into the ID `kde-konsole.desktop`.
    fn directory(&mut self, dir: &Path, id_prefix: &str, ancestors: &mut Vec<PathBuf>) -> MenuDirectory {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut children = Vec::new();

        let listing = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .flatten();

        for item in listing {
            let path = item.path();
            let file_name = item.file_name().to_string_lossy();
            if item.path_is_symlink() {
                if let Some(node) = self.alias(path, &format!("{id_prefix}{file_name}"), ancestors) {
                    children.push(node);
                }
            } else if item.file_type().is_dir() {
                let Ok(canonical) = path.canonicalize() else { continue };
                ancestors.push(canonical);
                let sub = self.directory(path, &format!("{id_prefix}{file_name}-"), ancestors);
                ancestors.pop();
                children.push(MenuNode::Directory(sub));
            } else if let Some(entry) = self.entry(path, path, format!("{id_prefix}{file_name}")) {
                children.push(MenuNode::Entry(entry));
            }
        }

        MenuDirectory { name, children }
    }

    fn alias(&mut self, link: &Path, id: &str, ancestors: &mut Vec<PathBuf>) -> Option<MenuNode> {
        let target = link.canonicalize().ok()?;
        if target.is_dir() {
            if ancestors.contains(&target) {
                debug!("Skipping directory cycle through {:?}", link);
                return None;
            }
            ancestors.push(target.clone());
            let mut dir = self.directory(&target, &format!("{id}-"), ancestors);
            ancestors.pop();
            if let Some(name) = link.file_name() {
                dir.name = name.to_string_lossy().into_owned();
            }
            Some(MenuNode::Alias(Box::new(MenuNode::Directory(dir))))
        } else {
            let entry = self.entry(link, &target, id.to_string())?;
            Some(MenuNode::Alias(Box::new(MenuNode::Entry(entry))))
        }
    }

    /// Reads `file` (listed as `listed_at`) unless its ID is already taken.
    fn entry(&mut self, listed_at: &Path, file: &Path, id: String) -> Option<MenuEntry> {
        if listed_at.extension().and_then(|s| s.to_str()) != Some("desktop") {
            return None;
        }
        if !self.seen_ids.insert(id) {
            return None;
        }

        let parsed = match DesktopEntry::load(file, self.locale) {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Ignoring {:?}: {}", file, e);
                return None;
            }
        };
        if !parsed.is_listed_application() {
            return None;
        }

        self.entries += 1;
        Some(MenuEntry {
            display_name: parsed.name.unwrap_or_else(|| {
                listed_at.file_stem().unwrap_or_default().to_string_lossy().into_owned()
            }),
            description: parsed.comment,
            exec: parsed.exec.unwrap_or_default(),
            icon: parsed.icon,
            desktop_file_path: listed_at.to_path_buf(),
        })
    }
}

/// Reads the entry behind `path` for a list selection.
pub fn read_selection(path: &Path, locale: Option<&str>) -> Option<DesktopEntry> {
    match fs::metadata(path) {
        Ok(m) if m.is_file() => DesktopEntry::load(path, locale).ok(),
        _ => None,
    }
}
