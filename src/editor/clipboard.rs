//! Copy/paste storage
//!
//! Uses the system clipboard when one is reachable and always keeps a copy
//! in an in-process register, so paste works on headless sessions too.

use tracing::debug;

pub struct Clipboard {
    system: Option<arboard::Clipboard>,
    register: String,
}

impl Clipboard {
    /// Connect to the system clipboard, falling back to the register alone
    pub fn system() -> Self {
        let system = match arboard::Clipboard::new() {
            Ok(cb) => Some(cb),
            Err(e) => {
                debug!("System clipboard unavailable: {}", e);
                None
            }
        };
        Self {
            system,
            register: String::new(),
        }
    }

    /// Register only
    pub fn local() -> Self {
        Self {
            system: None,
            register: String::new(),
        }
    }

    pub fn set(&mut self, text: &str) {
        self.register = text.to_string();
        if let Some(cb) = self.system.as_mut() {
            if let Err(e) = cb.set_text(text) {
                debug!("Clipboard write failed: {}", e);
            }
        }
    }

    /// System clipboard text if available, otherwise the register
    pub fn get(&mut self) -> Option<String> {
        if let Some(cb) = self.system.as_mut() {
            match cb.get_text() {
                Ok(text) => return Some(text),
                Err(e) => debug!("Clipboard read failed: {}", e),
            }
        }
        if self.register.is_empty() {
            None
        } else {
            Some(self.register.clone())
        }
    }
}
