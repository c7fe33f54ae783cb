use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use crate::model::MatchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Alt,
}

/// A modifier plus a digit key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Accelerator {
    pub modifier: Modifier,
    pub key: char,
}

impl Accelerator {
    const fn alt(key: char) -> Self {
        Self { modifier: Modifier::Alt, key }
    }
}

/// Bindings handed to the first ten visible rows, in this order.
pub const SLOTS: [Accelerator; 10] = [
    Accelerator::alt('1'),
    Accelerator::alt('2'),
    Accelerator::alt('3'),
    Accelerator::alt('4'),
    Accelerator::alt('5'),
    Accelerator::alt('6'),
    Accelerator::alt('7'),
    Accelerator::alt('8'),
    Accelerator::alt('9'),
    Accelerator::alt('0'),
];

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifier {
            Modifier::Alt => write!(f, "Alt+{}", self.key),
        }
    }
}

impl FromStr for Accelerator {
    type Err = String;

    /// Accepts `Alt+3`, `alt+3` or a bare digit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s.split_once('+') {
            Some((m, k)) if m.eq_ignore_ascii_case("alt") => k,
            Some((m, _)) => return Err(format!("unknown modifier '{m}'")),
            None => s,
        };
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_digit() => Ok(Accelerator::alt(c)),
            _ => Err(format!("not an accelerator: '{s}'")),
        }
    }
}

/// Accelerator to visible-row mapping for one dialog.
#[derive(Debug, Default)]
pub struct AcceleratorMap {
    rows: HashMap<Accelerator, usize>,
}

impl AcceleratorMap {
    /// Rebinds from scratch: the n-th visible row gets `SLOTS[n]`.
    pub fn rebuild(&mut self, rows: &[MatchResult]) {
        self.rows.clear();
        let visible = rows.iter().filter(|r| r.visible).count();
        for (position, slot) in SLOTS.iter().enumerate().take(visible) {
            self.rows.insert(*slot, position);
        }
    }

    /// Visible-row position bound to `accel`, if any.
    pub fn lookup(&self, accel: &Accelerator) -> Option<usize> {
        self.rows.get(accel).copied()
    }

    pub fn for_row(&self, position: usize) -> Option<Accelerator> {
        SLOTS
            .get(position)
            .copied()
            .filter(|slot| self.rows.get(slot) == Some(&position))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(visible: &[bool]) -> Vec<MatchResult> {
        visible
            .iter()
            .enumerate()
            .map(|(entry, &visible)| MatchResult { entry, command_match: None, visible })
            .collect()
    }

    #[test]
    fn test_twelve_visible_rows_get_ten_bindings() {
        let mut map = AcceleratorMap::default();
        map.rebuild(&rows(&[true; 12]));

        assert_eq!(map.len(), 10);
        for (position, slot) in SLOTS.iter().enumerate() {
            assert_eq!(map.lookup(slot), Some(position));
            assert_eq!(map.for_row(position), Some(*slot));
        }
        assert_eq!(map.for_row(10), None);
        assert_eq!(map.for_row(11), None);
        assert_eq!(map.for_row(9).unwrap().to_string(), "Alt+0");
    }

    #[test]
    fn test_hidden_rows_are_skipped() {
        let mut map = AcceleratorMap::default();
        map.rebuild(&rows(&[false, true, false, true]));
        assert_eq!(map.len(), 2);
        assert_eq!(map.lookup(&"Alt+2".parse().unwrap()), Some(1));
        assert_eq!(map.lookup(&"Alt+3".parse().unwrap()), None);
    }

    #[test]
    fn test_rebuild_clears_old_bindings() {
        let mut map = AcceleratorMap::default();
        map.rebuild(&rows(&[true; 5]));
        map.rebuild(&rows(&[true]));
        assert_eq!(map.len(), 1);
        assert_eq!(map.lookup(&SLOTS[4]), None);
    }

    #[test]
    fn test_parse_accelerators() {
        assert_eq!("Alt+7".parse::<Accelerator>(), Ok(SLOTS[6]));
        assert_eq!("0".parse::<Accelerator>(), Ok(SLOTS[9]));
        assert!("Ctrl+1".parse::<Accelerator>().is_err());
        assert!("Alt+x".parse::<Accelerator>().is_err());
        assert!("12".parse::<Accelerator>().is_err());
    }
}
