use anyhow::Result;

use crate::storage::{DARK_MODE_KEY, SharedStorage};

/// Persisted display preferences.
#[derive(Debug)]
pub struct Preferences {
    storage: SharedStorage,
    dark_mode: bool,
}

impl Preferences {
    /// Anything other than the literal `"true"` reads as light mode.
    pub fn load(storage: SharedStorage) -> Self {
        let dark_mode = storage.get(DARK_MODE_KEY).as_deref() == Some("true");
        Self { storage, dark_mode }
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    /// The flag only changes once the value is stored.
    pub fn set_dark_mode(&mut self, enabled: bool) -> Result<()> {
        self.storage.set(DARK_MODE_KEY, enabled.to_string())?;
        self.dark_mode = enabled;
        Ok(())
    }

    /// Flip the theme and return the new value.
    pub fn toggle_dark_mode(&mut self) -> Result<bool> {
        self.set_dark_mode(!self.dark_mode)?;
        Ok(self.dark_mode)
    }
}
