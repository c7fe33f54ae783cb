use crate::sources::menu::{MenuDirectory, MenuError};

/// Anything that can produce a snapshot of the application menu.
pub trait MenuSource {
    fn load(&self) -> Result<MenuDirectory, MenuError>;
}

pub mod bin;
pub mod desktop;
pub mod history;
pub mod menu;
