//! Terminal navigator: "pages" are printed instead of rendered.

use std::sync::{Mutex, MutexGuard};

use fortune_cookie::Navigator;

/// Navigator that tracks the current path and announces every move
pub struct ConsoleNavigator {
    path: Mutex<String>,
}

impl ConsoleNavigator {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            path: Mutex::new(start.into()),
        }
    }

    fn path(&self) -> MutexGuard<'_, String> {
        self.path.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Navigator for ConsoleNavigator {
    fn current_path(&self) -> String {
        self.path().clone()
    }

    fn navigate(&self, path: &str) {
        tracing::info!(from = %self.path(), to = path, "Navigating");
        println!("→ {}", path);
        *self.path() = path.to_string();
    }
}
