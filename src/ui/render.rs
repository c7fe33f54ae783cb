use std::io::{self, Write};
use crate::state::DialogSession;

/// Draws a dialog session as plain text.
pub struct Renderer {
    rows: usize,
}

impl Renderer {
    pub fn new(rows: usize) -> Self {
        Self { rows: rows.max(1) }
    }

    pub fn draw(&self, out: &mut impl Write, session: &DialogSession) -> io::Result<()> {
        let text = session.text();
        if text.is_empty() {
            writeln!(out, "> ")?;
        } else {
            match session.inline_completion() {
                Some(completed) => writeln!(out, "> {text}  [Tab: {completed}]")?,
                None => writeln!(out, "> {text}")?,
            }
        }

        let icon = session.icon().unwrap_or("-");
        if !session.label().is_empty() {
            writeln!(out, "({icon}) {}", session.label())?;
        }

        if session.show_program_list() {
            self.draw_list(out, session)?;
        }

        let mark = if session.terminal() { 'x' } else { ' ' };
        writeln!(out, "[{mark}] Run in terminal")?;
        out.flush()
    }

    fn draw_list(&self, out: &mut impl Write, session: &DialogSession) -> io::Result<()> {
        if !session.index_loaded() {
            return writeln!(out, "  (loading applications...)");
        }
        if session.index().is_empty() {
            return writeln!(out, "  (no applications)");
        }

        let rows = session.visible_rows();
        if rows.is_empty() {
            return writeln!(out, "  (no matching applications)");
        }

        let selected = session.cursor().unwrap_or(0);
        let offset = scroll_offset(selected, rows.len(), self.rows);

        for (i, (row, entry)) in rows.iter().enumerate().skip(offset).take(self.rows) {
            let cursor = if session.cursor() == Some(i) { '>' } else { ' ' };
            // `=` same command, `~` same program name
            let mark = if row.is_fuzzy() {
                '~'
            } else if row.command_match.is_some() {
                '='
            } else {
                ' '
            };
            let accel = session
                .accelerator_for(i)
                .map(|a| a.to_string())
                .unwrap_or_default();
            match &entry.description {
                Some(description) => writeln!(out, "{cursor}{mark} {accel:>6}  {}  ({description})", entry.display_name)?,
                None => writeln!(out, "{cursor}{mark} {accel:>6}  {}", entry.display_name)?,
            }
        }
        Ok(())
    }
}

/// First row to draw so that `selected` stays near the middle.
fn scroll_offset(selected: usize, total: usize, visible: usize) -> usize {
    if total <= visible {
        0
    } else if selected < visible / 2 {
        0
    } else if selected >= total - visible / 2 {
        total.saturating_sub(visible)
    } else {
        selected - visible / 2
    }
}
