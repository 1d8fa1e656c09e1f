use serde::{Deserialize, Serialize};

/// Name of the home tab that every dashboard starts with.
pub const HOME_TAB_NAME: &str = "Welcome";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Local,
    Network,
}

impl SessionKind {
    pub fn label_prefix(self) -> &'static str {
        match self {
            SessionKind::Local => "LOCAL",
            SessionKind::Network => "NETWORK",
        }
    }

    /// Tab label shown for a session of this kind, e.g. `LOCAL - box1`.
    pub fn tab_label(self, name: &str) -> String {
        format!("{} - {name}", self.label_prefix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Stopped,
    Running,
}
