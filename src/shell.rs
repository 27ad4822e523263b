//! Header and sidebar state for the application shell.
//!
//! Presentational only: the header toggles the sidebar and the sidebar
//! tracks which navigation entry is active.

#[cfg(test)]
#[path = "shell_test.rs"]
mod shell_test;

pub const DEFAULT_TITLE: &str = "Customer Countries";

/// One sidebar navigation entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavItem {
    pub label: String,
    pub href: String,
}

impl NavItem {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self { label: label.into(), href: href.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShellState {
    pub title: String,
    pub sidebar_open: bool,
    pub nav: Vec<NavItem>,
    pub active: Option<usize>,
}

impl Default for ShellState {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            sidebar_open: false,
            nav: vec![NavItem::new("Customers", "/")],
            active: Some(0),
        }
    }
}

impl ShellState {
    /// Header button handler.
    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    pub fn open_sidebar(&mut self) {
        self.sidebar_open = true;
    }

    pub fn close_sidebar(&mut self) {
        self.sidebar_open = false;
    }

    /// Mark `index` active. Out-of-range indices leave state untouched.
    pub fn select_nav(&mut self, index: usize) -> bool {
        if index >= self.nav.len() {
            return false;
        }
        self.active = Some(index);
        true
    }

    #[must_use]
    pub fn active_item(&self) -> Option<&NavItem> {
        self.active.and_then(|i| self.nav.get(i))
    }
}
