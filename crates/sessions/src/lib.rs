//! Named dashboard sessions and the tab registry that owns them.

pub mod registry;
pub mod view;

pub use registry::{
    Session, SessionError, SessionInput, SessionRegistry, SessionWiring, DUPLICATE_NAME_PROMPT,
    EMPTY_NAME_PROMPT,
};
pub use view::{Layout, LocalDashboard, NetworkDashboard, Panel, RemoteEndpoint, SessionView};
