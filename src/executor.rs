use std::collections::HashMap;
use std::io;
use std::process::{Command, Stdio};
use std::thread;
use log::{debug, info};
use crate::config::Config;

/// Side effects of running something from the dialog.
pub trait Launcher {
    /// Starts `argv` without waiting for it; only spawn failure is reported.
    fn spawn(&self, argv: &[String]) -> io::Result<()>;

    /// Opens `uri` with the desktop's default handler.
    fn show_uri(&self, uri: &str) -> io::Result<()>;
}

pub struct SystemLauncher {
    env: HashMap<String, String>,
    url_handler: Option<Vec<String>>,
}

impl SystemLauncher {
    pub fn new(config: &Config) -> Self {
        Self {
            env: config.launch.env.clone(),
            url_handler: config.launch.url_handler.as_deref().and_then(shlex::split),
        }
    }
}

impl Launcher for SystemLauncher {
    fn spawn(&self, argv: &[String]) -> io::Result<()> {
        let Some((program, args)) = argv.split_first() else {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty command"));
        };

        let mut command = Command::new(program);
        command.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .envs(&self.env);

        let mut child = command.spawn()?;
        info!("Launched {:?} (pid {})", argv, child.id());

        // Reap the child so it never lingers as a zombie.
        thread::spawn(move || {
            if let Ok(status) = child.wait() {
                debug!("Child {} exited with {}", child.id(), status);
            }
        });
        Ok(())
    }

    fn show_uri(&self, uri: &str) -> io::Result<()> {
        match &self.url_handler {
            Some(handler) if !handler.is_empty() => {
                let mut argv = handler.clone();
                argv.push(uri.to_string());
                self.spawn(&argv)
            }
            _ => {
                info!("Opening {}", uri);
                open::that_detached(uri)
            }
        }
    }
}
