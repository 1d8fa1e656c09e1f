use std::sync::Arc;

use discovery::BroadcastService;
use tokio::sync::Mutex;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) device_name: String,
    pub(crate) http_port: u16,
    pub(crate) broadcast: Arc<Mutex<BroadcastService>>,
}
