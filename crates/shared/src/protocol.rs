use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{domain::SessionKind, error::DiscoveryError};

/// Tag carried in every discovery packet; receivers filter on it.
pub const DISCOVERY_MESSAGE: &str = "REACHER_DEVICE_DISCOVERY";
pub const DEFAULT_DEVICE_NAME: &str = "REACHER_Device";
pub const DEFAULT_DISCOVERY_PORT: u16 = 7899;
pub const DEFAULT_HTTP_PORT: u16 = 6229;
pub const DEFAULT_BROADCAST_INTERVAL_SECS: u64 = 5;
/// Where the dashboard server listens unless told otherwise.
pub const DEFAULT_DASHBOARD_BIND: &str = "127.0.0.1:5006";

/// One UDP announcement of the control endpoint.
///
/// Field order and names are the wire format: `message`, `key`, `name`,
/// `address`, `port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryPayload {
    pub message: String,
    pub key: Uuid,
    pub name: String,
    pub address: Ipv4Addr,
    pub port: u16,
}

impl DiscoveryPayload {
    pub fn new(key: Uuid, name: impl Into<String>, address: Ipv4Addr, port: u16) -> Self {
        Self {
            message: DISCOVERY_MESSAGE.to_string(),
            key,
            name: name.into(),
            address,
            port,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DiscoveryError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a received packet and checks the tag and key version.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DiscoveryError> {
        let payload: Self = serde_json::from_slice(bytes)?;
        if payload.message != DISCOVERY_MESSAGE {
            return Err(DiscoveryError::UnexpectedMessage(payload.message));
        }
        if payload.key.get_version_num() != 4 {
            return Err(DiscoveryError::KeyVersion(payload.key));
        }
        Ok(payload)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabSummary {
    pub index: usize,
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SessionKind>,
    pub focused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub focused: usize,
    pub tabs: Vec<TabSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub name: String,
    pub kind: SessionKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResponse {
    pub name: String,
    pub endpoint: String,
    pub reachable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_serializes_with_named_fields() {
        let key = Uuid::new_v4();
        let payload =
            DiscoveryPayload::new(key, DEFAULT_DEVICE_NAME, Ipv4Addr::new(10, 0, 0, 7), 6229);
        let bytes = payload.to_bytes().expect("encode");

        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        let object = value.as_object().expect("object");
        assert_eq!(object.len(), 5);
        assert_eq!(value["message"], DISCOVERY_MESSAGE);
        assert_eq!(value["key"], key.to_string());
        assert_eq!(value["name"], DEFAULT_DEVICE_NAME);
        assert_eq!(value["address"], "10.0.0.7");
        assert_eq!(value["port"], 6229);
    }

    #[test]
    fn rejects_foreign_message_tag() {
        let raw = serde_json::json!({
            "message": "SOMETHING_ELSE",
            "key": Uuid::new_v4(),
            "name": "x",
            "address": "127.0.0.1",
            "port": 1,
        });
        let err = DiscoveryPayload::from_slice(raw.to_string().as_bytes()).expect_err("tag");
        assert!(matches!(err, DiscoveryError::UnexpectedMessage(tag) if tag == "SOMETHING_ELSE"));
    }

    #[test]
    fn rejects_non_v4_key() {
        let raw = serde_json::json!({
            "message": DISCOVERY_MESSAGE,
            "key": Uuid::nil(),
            "name": "x",
            "address": "127.0.0.1",
            "port": 1,
        });
        let err = DiscoveryPayload::from_slice(raw.to_string().as_bytes()).expect_err("version");
        assert!(matches!(err, DiscoveryError::KeyVersion(_)));
    }

    #[test]
    fn rejects_positional_payload() {
        let err = DiscoveryPayload::from_slice(b"[\"REACHER_DEVICE_DISCOVERY\", 1]")
            .expect_err("shape");
        assert!(matches!(err, DiscoveryError::Malformed(_)));
    }

    #[test]
    fn session_kind_labels() {
        assert_eq!(SessionKind::Local.tab_label("A"), "LOCAL - A");
        assert_eq!(SessionKind::Network.tab_label("rig 2"), "NETWORK - rig 2");
        assert_eq!(
            serde_json::to_string(&SessionKind::Network).expect("json"),
            "\"network\""
        );
    }
}
