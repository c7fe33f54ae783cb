/// Bounded list of commands that launched successfully.
///
/// Storage always keeps the most recent command first. With `reverse` set
/// the list is presented oldest-first, so the latest command sits at the
/// bottom of the dropdown.
#[derive(Debug, Clone, Copy)]
pub struct HistoryStore {
    pub max_size: usize,
    pub reverse: bool,
}

impl HistoryStore {
    pub fn new(max_size: usize, reverse: bool) -> Self {
        Self { max_size, reverse }
    }

    /// Entries in display order, at most `max_size` of them.
    pub fn load(&self, stored: &[String]) -> Vec<String> {
        let mut items: Vec<String> = stored.iter().take(self.max_size).cloned().collect();
        if self.reverse {
            items.reverse();
        }
        items
    }

    /// New stored list after `command` ran.
    pub fn record(&self, stored: &[String], command: &str) -> Vec<String> {
        if self.max_size == 0 {
            return Vec::new();
        }

        let mut items = vec![command.to_string()];
        items.extend(self.load(stored).into_iter().filter(|c| c != command));
        if self.reverse {
            items[1..].reverse();
        }
        items.truncate(self.max_size);
        items
    }
}
