use serde::Serialize;
use shared::{domain::SessionKind, protocol::DEFAULT_HTTP_PORT};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub title: String,
    pub panels: Vec<Panel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub heading: String,
    pub rows: Vec<(String, String)>,
}

impl Panel {
    fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            rows: Vec::new(),
        }
    }

    fn row(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.rows.push((key.into(), value.into()));
        self
    }
}

/// Control endpoint of a device reached over the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteEndpoint {
    pub host: String,
    pub port: u16,
}

impl Default for RemoteEndpoint {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: DEFAULT_HTTP_PORT,
        }
    }
}

impl RemoteEndpoint {
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("http://{}:{}/", self.host, self.port))
    }

    pub fn health_url(&self) -> Result<Url, url::ParseError> {
        self.base_url()?.join("healthz")
    }
}

/// Session driving the control core running on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDashboard {
    control_port: u16,
}

impl LocalDashboard {
    pub fn new(control_port: u16) -> Self {
        Self { control_port }
    }

    pub fn control_url(&self) -> String {
        format!("http://127.0.0.1:{}/", self.control_port)
    }

    pub fn layout(&self, label: &str) -> Layout {
        Layout {
            title: label.to_string(),
            panels: vec![
                Panel::new("Control core")
                    .row("Mode", "in-process")
                    .row("Endpoint", self.control_url()),
                controls_panel(),
            ],
        }
    }
}

/// Session driving a device found on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDashboard {
    endpoint: RemoteEndpoint,
}

impl NetworkDashboard {
    pub fn new(endpoint: RemoteEndpoint) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> &RemoteEndpoint {
        &self.endpoint
    }

    pub fn layout(&self, label: &str) -> Layout {
        let endpoint = match self.endpoint.base_url() {
            Ok(url) => url.to_string(),
            Err(error) => format!("invalid endpoint: {error}"),
        };
        Layout {
            title: label.to_string(),
            panels: vec![
                Panel::new("Remote device")
                    .row("Host", self.endpoint.host.clone())
                    .row("Port", self.endpoint.port.to_string())
                    .row("Endpoint", endpoint),
                controls_panel(),
            ],
        }
    }
}

fn controls_panel() -> Panel {
    Panel::new("Controls")
        .row("Serial connection", "connect / disconnect the device")
        .row("Program", "upload and start a behavior program")
        .row("Files", "name and export session files")
        .row("Data", "live event stream and summaries")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionView {
    Local(LocalDashboard),
    Network(NetworkDashboard),
}

impl SessionView {
    pub fn kind(&self) -> SessionKind {
        match self {
            SessionView::Local(_) => SessionKind::Local,
            SessionView::Network(_) => SessionKind::Network,
        }
    }

    pub fn layout(&self, label: &str) -> Layout {
        match self {
            SessionView::Local(view) => view.layout(label),
            SessionView::Network(view) => view.layout(label),
        }
    }
}

pub(crate) fn welcome_layout() -> Layout {
    Layout {
        title: "Welcome to the dashboard!".into(),
        panels: vec![Panel::new("Create a session")
            .row("Local", "drive the control core on this machine")
            .row("Network", "drive a device discovered on the network")],
    }
}
