//! Single task that owns the [`SessionRegistry`].
//!
//! Handlers never touch the registry directly; they queue a
//! [`RegistryCommand`] and await the reply. Commands are applied one at a
//! time, in arrival order.

use sessions::{Layout, SessionError, SessionInput, SessionRegistry, SessionView};
use shared::{
    domain::SessionKind,
    protocol::{SessionListResponse, TabSummary},
};
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info};

#[derive(Debug, Error)]
#[error("session registry is not running")]
pub struct RegistryClosed;

/// Everything the home page needs, captured in one dispatch turn.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub input: SessionInput,
    pub tabs: SessionListResponse,
    pub layout: Layout,
}

pub enum RegistryCommand {
    /// Create from the page form; outcome is reflected in the shared input field.
    SubmitForm {
        name: String,
        kind: SessionKind,
        reply: oneshot::Sender<Result<TabSummary, SessionError>>,
    },
    /// Create from the JSON API; the page's input field is left alone.
    Create {
        name: String,
        kind: SessionKind,
        reply: oneshot::Sender<Result<TabSummary, SessionError>>,
    },
    Focus {
        index: usize,
        reply: oneshot::Sender<bool>,
    },
    List {
        reply: oneshot::Sender<SessionListResponse>,
    },
    Snapshot {
        reply: oneshot::Sender<PageSnapshot>,
    },
    View {
        name: String,
        reply: oneshot::Sender<Option<SessionView>>,
    },
}

#[derive(Clone)]
pub struct RegistryHandle {
    tx: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RegistryCommand,
    ) -> Result<T, RegistryClosed> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| RegistryClosed)?;
        rx.await.map_err(|_| RegistryClosed)
    }

    pub async fn submit_form(
        &self,
        name: String,
        kind: SessionKind,
    ) -> Result<Result<TabSummary, SessionError>, RegistryClosed> {
        self.call(|reply| RegistryCommand::SubmitForm { name, kind, reply })
            .await
    }

    pub async fn create(
        &self,
        name: String,
        kind: SessionKind,
    ) -> Result<Result<TabSummary, SessionError>, RegistryClosed> {
        self.call(|reply| RegistryCommand::Create { name, kind, reply })
            .await
    }

    pub async fn focus(&self, index: usize) -> Result<bool, RegistryClosed> {
        self.call(|reply| RegistryCommand::Focus { index, reply })
            .await
    }

    pub async fn list(&self) -> Result<SessionListResponse, RegistryClosed> {
        self.call(|reply| RegistryCommand::List { reply }).await
    }

    pub async fn snapshot(&self) -> Result<PageSnapshot, RegistryClosed> {
        self.call(|reply| RegistryCommand::Snapshot { reply }).await
    }

    pub async fn view(&self, name: String) -> Result<Option<SessionView>, RegistryClosed> {
        self.call(|reply| RegistryCommand::View { name, reply })
            .await
    }
}

pub fn spawn_registry(registry: SessionRegistry) -> (RegistryHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<RegistryCommand>(64);
    let task = tokio::spawn(async move {
        let mut registry = registry;
        let mut input = SessionInput::default();
        while let Some(command) = rx.recv().await {
            apply(&mut registry, &mut input, command);
        }
        debug!("session registry dispatcher stopped");
    });
    (RegistryHandle { tx }, task)
}

fn apply(registry: &mut SessionRegistry, input: &mut SessionInput, command: RegistryCommand) {
    match command {
        RegistryCommand::SubmitForm { name, kind, reply } => {
            input.value = name;
            let _ = reply.send(create(registry, input, kind));
        }
        RegistryCommand::Create { name, kind, reply } => {
            let mut scratch = SessionInput::with_value(name);
            let _ = reply.send(create(registry, &mut scratch, kind));
        }
        RegistryCommand::Focus { index, reply } => {
            let _ = reply.send(registry.focus(index));
        }
        RegistryCommand::List { reply } => {
            let _ = reply.send(registry.summaries());
        }
        RegistryCommand::Snapshot { reply } => {
            let _ = reply.send(PageSnapshot {
                input: input.clone(),
                tabs: registry.summaries(),
                layout: registry.focused_layout(),
            });
        }
        RegistryCommand::View { name, reply } => {
            let _ = reply.send(registry.get(&name).map(|session| session.view().clone()));
        }
    }
}

fn create(
    registry: &mut SessionRegistry,
    input: &mut SessionInput,
    kind: SessionKind,
) -> Result<TabSummary, SessionError> {
    let index = registry.create_session(input, kind)?;
    let mut tabs = registry.summaries().tabs;
    let summary = tabs.swap_remove(index);
    info!(name = %summary.name, label = %summary.label, "session created");
    Ok(summary)
}
