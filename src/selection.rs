//! Active-conversation tracking.

/// Which conversation the client is looking at. Starts empty; the first
/// conversation-list poll picks a default, and explicit user choices are
/// never overridden by later polls.
#[derive(Debug, Default)]
pub struct Selection {
    selected: Option<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Apply the default-selection policy after a list poll: take the first
    /// id in poll-response order, but only when nothing is selected yet.
    /// Returns whether the selection changed.
    pub fn on_conversations_loaded(&mut self, ids: &[String]) -> bool {
        if self.selected.is_some() {
            return false;
        }
        match ids.first() {
            Some(first) => {
                self.selected = Some(first.clone());
                true
            }
            None => false,
        }
    }

    /// Explicit user choice. Returns whether the selection changed, so the
    /// caller knows to restart the detail poller.
    pub fn select(&mut self, id: &str) -> bool {
        if self.selected.as_deref() == Some(id) {
            return false;
        }
        self.selected = Some(id.to_string());
        true
    }
}
