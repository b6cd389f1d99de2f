use thiserror::Error;

#[derive(Debug, Error)]
pub enum TabError {
    #[error("no tab/panel pair matches target {0:?}")]
    UnknownTarget(String),
}

/// One tab and the content panel it controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabPair {
    pub tab_id: String,
    pub panel_id: String,
    pub label: String,
}

/// State machine binding a set of tabs to a set of content panels.
///
/// Invariant: exactly one pair is active whenever the set is non-empty, and
/// none when it is empty. Transitions only move the active pointer; the pair
/// set itself is replaced wholesale via `rebuild` when the entry collection
/// changes.
#[derive(Debug, Default)]
pub struct TabPanel {
    pairs: Vec<TabPair>,
    active: Option<usize>,
}

impl TabPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole pair set. The first pair becomes active without any
    /// user interaction, matching the wiring behavior of the panel.
    pub fn rebuild(&mut self, pairs: Vec<TabPair>) {
        self.active = if pairs.is_empty() { None } else { Some(0) };
        self.pairs = pairs;
    }

    /// Make the pair owning `panel_id` the active one. Unknown targets are a
    /// hard error and leave the current state untouched, so the panel never
    /// ends up with everything hidden.
    pub fn activate(&mut self, panel_id: &str) -> Result<(), TabError> {
        match self.pairs.iter().position(|p| p.panel_id == panel_id) {
            Some(index) => {
                self.active = Some(index);
                Ok(())
            }
            None => Err(TabError::UnknownTarget(panel_id.to_string())),
        }
    }

    /// Activation through a tab click.
    pub fn activate_tab(&mut self, tab_id: &str) -> Result<(), TabError> {
        match self.pairs.iter().position(|p| p.tab_id == tab_id) {
            Some(index) => {
                self.active = Some(index);
                Ok(())
            }
            None => Err(TabError::UnknownTarget(tab_id.to_string())),
        }
    }

    pub fn active(&self) -> Option<&TabPair> {
        self.active.and_then(|i| self.pairs.get(i))
    }

    pub fn is_tab_active(&self, tab_id: &str) -> bool {
        self.active().is_some_and(|p| p.tab_id == tab_id)
    }

    pub fn is_panel_visible(&self, panel_id: &str) -> bool {
        self.active().is_some_and(|p| p.panel_id == panel_id)
    }

    pub fn pairs(&self) -> &[TabPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
