use chrono::{DateTime, Utc};
use shared::{
    domain::{SessionKind, HOME_TAB_NAME},
    protocol::{SessionListResponse, TabSummary},
};
use thiserror::Error;

use crate::view::{
    welcome_layout, Layout, LocalDashboard, NetworkDashboard, RemoteEndpoint, SessionView,
};

pub const EMPTY_NAME_PROMPT: &str = "Please enter a name and try again.";
pub const DUPLICATE_NAME_PROMPT: &str =
    "Name entered already exists. Please enter a different name.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session name is empty")]
    EmptyName,
    #[error("session name '{0}' already exists")]
    DuplicateName(String),
}

impl SessionError {
    /// Text shown in the name field after a rejected attempt.
    pub fn prompt(&self) -> &'static str {
        match self {
            SessionError::EmptyName => EMPTY_NAME_PROMPT,
            SessionError::DuplicateName(_) => DUPLICATE_NAME_PROMPT,
        }
    }
}

/// State of the session-name text field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInput {
    pub value: String,
    pub placeholder: String,
}

impl SessionInput {
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            placeholder: String::new(),
        }
    }
}

/// Connection parameters handed to newly created sessions.
#[derive(Debug, Clone)]
pub struct SessionWiring {
    pub local_control_port: u16,
    pub remote: RemoteEndpoint,
}

impl Default for SessionWiring {
    fn default() -> Self {
        Self {
            local_control_port: shared::protocol::DEFAULT_HTTP_PORT,
            remote: RemoteEndpoint::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    name: String,
    label: String,
    view: SessionView,
    created_at: DateTime<Utc>,
}

impl Session {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> SessionKind {
        self.view.kind()
    }

    pub fn view(&self) -> &SessionView {
        &self.view
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn layout(&self) -> Layout {
        self.view.layout(&self.label)
    }
}

/// Ordered tabs: the welcome tab at index 0, then sessions in creation order.
///
/// Not synchronized. Owners keep every mutation on one dispatch context.
#[derive(Debug)]
pub struct SessionRegistry {
    wiring: SessionWiring,
    sessions: Vec<Session>,
    focused: usize,
}

impl SessionRegistry {
    pub fn new(wiring: SessionWiring) -> Self {
        Self {
            wiring,
            sessions: Vec::new(),
            focused: 0,
        }
    }

    pub fn wiring(&self) -> &SessionWiring {
        &self.wiring
    }

    /// Number of tabs, including the welcome tab.
    pub fn tab_count(&self) -> usize {
        self.sessions.len() + 1
    }

    pub fn contains(&self, name: &str) -> bool {
        name == HOME_TAB_NAME || self.sessions.iter().any(|session| session.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Session> {
        self.sessions.iter().find(|session| session.name == name)
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    /// Moves focus to tab `index`. Returns false if there is no such tab.
    pub fn focus(&mut self, index: usize) -> bool {
        if index >= self.tab_count() {
            return false;
        }
        self.focused = index;
        true
    }

    pub fn tab_label(&self, index: usize) -> Option<&str> {
        match index {
            0 => Some(HOME_TAB_NAME),
            n => self.sessions.get(n - 1).map(Session::label),
        }
    }

    pub fn focused_layout(&self) -> Layout {
        match self.focused {
            0 => welcome_layout(),
            n => self
                .sessions
                .get(n - 1)
                .map(Session::layout)
                .unwrap_or_else(welcome_layout),
        }
    }

    /// Creates a session named after the input field.
    ///
    /// On success the new tab is appended and focused and the field is
    /// reset. An empty name only sets the prompt; a taken name also clears
    /// the field. The registry is untouched on error.
    pub fn create_session(
        &mut self,
        input: &mut SessionInput,
        kind: SessionKind,
    ) -> Result<usize, SessionError> {
        let name = input.value.trim();
        if name.is_empty() {
            input.placeholder = EMPTY_NAME_PROMPT.to_string();
            return Err(SessionError::EmptyName);
        }
        if self.contains(name) {
            let err = SessionError::DuplicateName(name.to_string());
            input.value.clear();
            input.placeholder = err.prompt().to_string();
            return Err(err);
        }

        let name = name.to_string();
        let view = match kind {
            SessionKind::Local => {
                SessionView::Local(LocalDashboard::new(self.wiring.local_control_port))
            }
            SessionKind::Network => {
                SessionView::Network(NetworkDashboard::new(self.wiring.remote.clone()))
            }
        };
        self.sessions.push(Session {
            label: kind.tab_label(&name),
            name,
            view,
            created_at: Utc::now(),
        });

        let index = self.tab_count() - 1;
        self.focused = index;
        input.value.clear();
        input.placeholder.clear();
        Ok(index)
    }

    pub fn summaries(&self) -> SessionListResponse {
        let home = TabSummary {
            index: 0,
            name: HOME_TAB_NAME.to_string(),
            label: HOME_TAB_NAME.to_string(),
            kind: None,
            focused: self.focused == 0,
            created_at: None,
        };
        let tabs = std::iter::once(home)
            .chain(self.sessions.iter().enumerate().map(|(i, session)| TabSummary {
                index: i + 1,
                name: session.name.clone(),
                label: session.label.clone(),
                kind: Some(session.kind()),
                focused: self.focused == i + 1,
                created_at: Some(session.created_at),
            }))
            .collect();
        SessionListResponse {
            focused: self.focused,
            tabs,
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(SessionWiring::default())
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
