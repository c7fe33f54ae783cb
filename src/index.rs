use std::cmp::Ordering;
use log::{error, info};
use crate::model::ApplicationEntry;
use crate::sources::menu::{MenuDirectory, MenuNode};
use crate::sources::MenuSource;

/// Flat, name-sorted list of installed applications.
#[derive(Debug, Clone, Default)]
pub struct ApplicationIndex {
    entries: Vec<ApplicationEntry>,
}

impl ApplicationIndex {
    /// Full rebuild from `source`. A failed load gives an empty index.
    pub fn load(source: &dyn MenuSource) -> Self {
        match source.load() {
            Ok(root) => {
                let index = Self::from_menu(&root);
                info!("ApplicationIndex: {} entries", index.len());
                index
            }
            Err(e) => {
                error!("Failed to load application menu: {}", e);
                Self::default()
            }
        }
    }

    pub fn from_menu(root: &MenuDirectory) -> Self {
        let mut entries = Vec::new();
        for child in &root.children {
            flatten(child, &mut entries);
        }
        Self::from_entries(entries)
    }

    /// Sorts by collated name and drops adjacent duplicates, keeping the first.
    pub fn from_entries(mut entries: Vec<ApplicationEntry>) -> Self {
        entries.sort_by(|a, b| collate(&a.display_name, &b.display_name));
        entries.dedup_by(|later, earlier| later.display_name == earlier.display_name);
        Self { entries }
    }

    pub fn entries(&self) -> &[ApplicationEntry] {
        &self.entries
    }

    pub fn get(&self, idx: usize) -> Option<&ApplicationEntry> {
        self.entries.get(idx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn flatten(node: &MenuNode, out: &mut Vec<ApplicationEntry>) {
    match node {
        MenuNode::Entry(entry) => out.push(ApplicationEntry {
            display_name: entry.display_name.clone(),
            description: entry.description.clone(),
            exec: entry.exec.clone(),
            icon: entry.icon.clone(),
            source_path: entry.desktop_file_path.clone(),
        }),
        MenuNode::Directory(dir) => {
            for child in &dir.children {
                flatten(child, out);
            }
        }
        MenuNode::Alias(target) => flatten(target, out),
    }
}

/// Case-insensitive name order, falling back to byte order.
pub fn collate(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}
