use std::io::{self, Write};
use std::path::PathBuf;
use log::{debug, warn};
use crate::accelerator::Accelerator;
use crate::executor::Launcher;
use crate::index::ApplicationIndex;
use crate::scheduler::{Scheduler, Task};
use crate::sources::MenuSource;
use crate::state::{DialogSession, Launched, TextChange};
use crate::ui::render::Renderer;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Text(String),
    Run,
    Accelerator(Accelerator),
    Up,
    Down,
    Activate,
    Tab,
    ToggleList,
    ToggleTerminal,
    History,
    Drop(String),
    Save(Option<PathBuf>),
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            return Command::Run;
        }
        let Some(rest) = line.strip_prefix(':') else {
            return Command::Text(line.to_string());
        };
        // `::` enters text that itself starts with a colon
        if rest.starts_with(':') {
            return Command::Text(rest.to_string());
        }

        let (name, arg) = match rest.split_once(' ') {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        match name {
            "run" => Command::Run,
            "up" => Command::Up,
            "down" => Command::Down,
            "activate" => Command::Activate,
            "tab" => Command::Tab,
            "list" => Command::ToggleList,
            "terminal" => Command::ToggleTerminal,
            "history" => Command::History,
            "drop" if !arg.is_empty() => Command::Drop(arg.to_string()),
            "save" if arg.is_empty() => Command::Save(None),
            "save" => Command::Save(Some(PathBuf::from(arg))),
            "q" | "quit" => Command::Quit,
            _ => match name.parse::<Accelerator>() {
                Ok(accel) if arg.is_empty() => Command::Accelerator(accel),
                _ => Command::Unknown(line.to_string()),
            },
        }
    }
}

/// Event loop data for the interactive dialog.
pub struct RunDialog {
    pub session: DialogSession,
    scheduler: Scheduler<RunDialog>,
    source: Box<dyn MenuSource>,
    launcher: Box<dyn Launcher>,
    renderer: Renderer,
    out: Box<dyn Write>,
    pub should_exit: bool,
}

impl RunDialog {
    pub fn new(
        session: DialogSession,
        scheduler: Scheduler<RunDialog>,
        source: Box<dyn MenuSource>,
        launcher: Box<dyn Launcher>,
        out: Box<dyn Write>,
    ) -> Self {
        let renderer = Renderer::new(session.config().dialog.list_rows);
        Self {
            session,
            scheduler,
            source,
            launcher,
            renderer,
            out,
            should_exit: false,
        }
    }

    /// Draws the dialog and queues the program list load.
    pub fn open(&mut self) {
        if self.session.config().dialog.enable_program_list {
            self.scheduler.schedule(Task::RebuildIndex, RunDialog::rebuild_index);
        }
        self.draw();
    }

    fn rebuild_index(&mut self) {
        let index = ApplicationIndex::load(self.source.as_ref());
        if self.session.install_index(index) {
            self.schedule_find();
        }
        self.draw();
    }

    fn schedule_find(&mut self) {
        self.scheduler.schedule(Task::FindCommand, |dialog: &mut RunDialog| {
            dialog.session.refresh_matches();
            dialog.draw();
        });
    }

    fn text_changed(&mut self, change: TextChange) {
        match change {
            TextChange::FindCommand => self.schedule_find(),
            TextChange::Cleared => self.scheduler.cancel(Task::FindCommand),
            TextChange::Unchanged => {}
        }
    }

    pub fn handle_line(&mut self, line: &str) {
        let command = Command::parse(line);
        debug!("Input: {:?}", command);

        match command {
            Command::Text(text) => {
                let change = self.session.type_text(&text);
                self.text_changed(change);
            }
            Command::Run => {
                let result = self.session.execute(self.launcher.as_ref());
                self.report(result);
            }
            Command::Accelerator(accel) => {
                if self.session.press_accelerator(&accel).is_none() {
                    debug!("{} is not bound", accel);
                }
            }
            Command::Up => {
                self.session.move_cursor(-1);
            }
            Command::Down => {
                self.session.move_cursor(1);
            }
            Command::Activate => {
                let position = self.session.cursor().unwrap_or(0);
                let result = self.session.activate(position, self.launcher.as_ref());
                self.report(result);
            }
            Command::Tab => {
                if let Some(change) = self.session.accept_completion() {
                    self.text_changed(change);
                }
            }
            Command::ToggleList => {
                self.session.toggle_program_list();
            }
            Command::ToggleTerminal => {
                self.session.toggle_terminal();
            }
            Command::History => {
                let history = self.session.history();
                for (i, item) in history.iter().enumerate() {
                    self.print(&format!("{:>3}  {item}", i + 1));
                }
            }
            Command::Drop(path) => match self.session.append_file(&path) {
                Some(change) => self.text_changed(change),
                None => warn!("Ignoring dropped file {:?}", path),
            },
            Command::Save(dir) => {
                let dir = dir.unwrap_or_else(std::env::temp_dir);
                match self.session.create_launcher(&dir) {
                    Ok(Some(path)) => self.print(&format!("Saved launcher {}", path.display())),
                    Ok(None) => {}
                    Err(e) => self.print(&e.to_string()),
                }
            }
            Command::Quit => self.session.close(),
            Command::Unknown(line) => self.print(&format!("Unknown command: {line}")),
        }

        if self.session.is_closed() {
            self.close();
        } else {
            self.draw();
        }
    }

    fn report(&mut self, result: crate::error::Result<Option<Launched>>) {
        match result {
            Ok(Some(Launched::Command(argv))) => debug!("Started {:?}", argv),
            Ok(Some(Launched::Location(uri))) => debug!("Opened {}", uri),
            Ok(None) => {}
            Err(e) => {
                warn!("{}", e);
                self.print(&e.to_string());
            }
        }
    }

    /// Ends the session; queued work is dropped.
    pub fn close(&mut self) {
        self.scheduler.cancel_all();
        self.session.close();
        self.should_exit = true;
    }

    fn draw(&mut self) {
        if let Err(e) = self.renderer.draw(&mut self.out, &self.session) {
            warn!("Failed to draw dialog: {}", e);
        }
    }

    fn print(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}").and_then(|()| self.out.flush()) {
            warn!("Failed to write output: {}", e);
        }
    }
}

/// Writes to stdout; used when nothing else is given.
pub fn stdout() -> Box<dyn Write> {
    Box::new(io::stdout())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::settings::{SettingsFile, StoredSettings};
    use crate::sources::menu::tests::write_app;
    use crate::sources::menu::XdgMenuSource;
    use calloop::EventLoop;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct SharedOut(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedOut {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedOut {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    struct NoLaunch;

    impl Launcher for NoLaunch {
        fn spawn(&self, _argv: &[String]) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::NotFound))
        }

        fn show_uri(&self, _uri: &str) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::NotFound))
        }
    }

    fn setup(data: &tempfile::TempDir) -> (EventLoop<'static, RunDialog>, RunDialog, SharedOut) {
        let event_loop = EventLoop::try_new().unwrap();
        let apps = data.path().join("applications");
        write_app(&apps, "editor.desktop", "Editor", "gedit %U");
        write_app(&apps, "terminal.desktop", "Terminal", "xterm");

        let session = DialogSession::new(
            Config::default(),
            SettingsFile::in_memory(StoredSettings::default()),
            data.path().to_path_buf(),
            Vec::new(),
        );
        let out = SharedOut::default();
        let dialog = RunDialog::new(
            session,
            Scheduler::new(event_loop.handle()),
            Box::new(XdgMenuSource::new(vec![data.path().to_path_buf()], None)),
            Box::new(NoLaunch),
            Box::new(out.clone()),
        );
        (event_loop, dialog, out)
    }

    fn idle(event_loop: &mut EventLoop<'static, RunDialog>, dialog: &mut RunDialog) {
        event_loop.dispatch(Some(Duration::ZERO), dialog).unwrap();
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(""), Command::Run);
        assert_eq!(Command::parse(":run\n"), Command::Run);
        assert_eq!(Command::parse("firefox"), Command::Text("firefox".to_string()));
        assert_eq!(Command::parse(":3"), Command::Accelerator("Alt+3".parse().unwrap()));
        assert_eq!(Command::parse(":0"), Command::Accelerator("Alt+0".parse().unwrap()));
        assert_eq!(Command::parse(":drop /tmp/a b"), Command::Drop("/tmp/a b".to_string()));
        assert_eq!(Command::parse(":save"), Command::Save(None));
        assert_eq!(Command::parse(":save /tmp"), Command::Save(Some(PathBuf::from("/tmp"))));
        assert_eq!(Command::parse(":q"), Command::Quit);
        assert_eq!(Command::parse(":drop"), Command::Unknown(":drop".to_string()));
        assert_eq!(Command::parse(":12"), Command::Unknown(":12".to_string()));
    }

    #[test]
    fn test_double_colon_enters_colon_text() {
        assert_eq!(Command::parse("::q"), Command::Text(":q".to_string()));
        assert_eq!(Command::parse("::"), Command::Text(":".to_string()));

        let data = tempfile::tempdir().unwrap();
        let (_event_loop, mut dialog, _out) = setup(&data);
        dialog.handle_line("::memo");
        assert_eq!(dialog.session.text(), ":memo");
        assert!(!dialog.should_exit);
    }

    #[test]
    fn test_failed_menu_load_is_not_shown_as_loading() {
        let data = tempfile::tempdir().unwrap();
        let mut event_loop: EventLoop<'static, RunDialog> = EventLoop::try_new().unwrap();
        let session = DialogSession::new(
            Config::default(),
            SettingsFile::in_memory(StoredSettings::default()),
            data.path().to_path_buf(),
            Vec::new(),
        );
        let out = SharedOut::default();
        let mut dialog = RunDialog::new(
            session,
            Scheduler::new(event_loop.handle()),
            Box::new(XdgMenuSource::new(vec![data.path().to_path_buf()], None)),
            Box::new(NoLaunch),
            Box::new(out.clone()),
        );

        dialog.open();
        idle(&mut event_loop, &mut dialog);
        assert!(dialog.session.index_loaded());
        assert!(dialog.session.index().is_empty());

        out.0.borrow_mut().clear();
        dialog.handle_line("x");
        idle(&mut event_loop, &mut dialog);
        let text = out.text();
        assert!(text.contains("(no applications)"));
        assert!(!text.contains("loading applications"));
    }

    #[test]
    fn test_index_loads_when_idle() {
        let data = tempfile::tempdir().unwrap();
        let (mut event_loop, mut dialog, out) = setup(&data);

        dialog.open();
        assert!(dialog.session.index().is_empty());
        assert!(out.text().contains("(loading applications...)"));

        idle(&mut event_loop, &mut dialog);
        assert_eq!(dialog.session.index().len(), 2);
        assert!(out.text().contains("Alt+2  Terminal"));
    }

    #[test]
    fn test_typing_refreshes_matches_when_idle() {
        let data = tempfile::tempdir().unwrap();
        let (mut event_loop, mut dialog, _out) = setup(&data);
        dialog.open();
        idle(&mut event_loop, &mut dialog);

        dialog.handle_line("gedit");
        assert_eq!(dialog.session.visible_entries().len(), 2);
        idle(&mut event_loop, &mut dialog);
        assert_eq!(dialog.session.visible_entries().len(), 1);
        assert_eq!(dialog.session.item_name(), Some("Editor"));
    }

    #[test]
    fn test_clearing_text_cancels_refresh() {
        let data = tempfile::tempdir().unwrap();
        let (mut event_loop, mut dialog, _out) = setup(&data);
        dialog.open();
        idle(&mut event_loop, &mut dialog);

        dialog.handle_line("gedit");
        dialog.handle_line("   ");
        idle(&mut event_loop, &mut dialog);
        assert_eq!(dialog.session.visible_entries().len(), 2);
        assert_eq!(dialog.session.item_name(), None);
    }

    #[test]
    fn test_accelerator_line_selects_row() {
        let data = tempfile::tempdir().unwrap();
        let (mut event_loop, mut dialog, _out) = setup(&data);
        dialog.open();
        idle(&mut event_loop, &mut dialog);

        dialog.handle_line(":1");
        assert_eq!(dialog.session.text(), "gedit");
        assert_eq!(dialog.session.cursor(), Some(0));
    }

    #[test]
    fn test_failed_run_keeps_dialog_open() {
        let data = tempfile::tempdir().unwrap();
        let (_event_loop, mut dialog, out) = setup(&data);

        dialog.handle_line("somewhere");
        dialog.handle_line("");
        assert!(!dialog.should_exit);
        assert!(out.text().contains("Could not open location"));
    }

    #[test]
    fn test_quit_cancels_pending_work() {
        let data = tempfile::tempdir().unwrap();
        let (mut event_loop, mut dialog, _out) = setup(&data);
        dialog.open();

        dialog.handle_line(":q");
        assert!(dialog.should_exit);
        idle(&mut event_loop, &mut dialog);
        assert!(dialog.session.index().is_empty());
    }
}
