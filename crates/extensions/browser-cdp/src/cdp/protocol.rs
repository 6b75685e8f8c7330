//! CDP protocol types and message definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// CDP request message.
#[derive(Debug, Serialize)]
pub struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Any frame received from the browser: a command response when `id` is
/// set, an event when `method` is.
#[derive(Debug, Deserialize)]
pub struct CdpResponse {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<CdpErrorResponse>,
    pub method: Option<String>,
    pub params: Option<Value>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

impl CdpResponse {
    /// The event carried by this frame, if it is one.
    pub fn into_event(self) -> Option<(Option<String>, CdpEvent)> {
        let method = self.method?;
        Some((
            self.session_id,
            CdpEvent {
                method,
                params: self.params.unwrap_or(Value::Null),
            },
        ))
    }
}

/// CDP error in response.
#[derive(Debug, Deserialize)]
pub struct CdpErrorResponse {
    pub code: i64,
    pub message: String,
}

/// An event routed to the session it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct CdpEvent {
    pub method: String,
    pub params: Value,
}

/// Page info from the `/json/list` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub page_type: String,
    #[serde(default)]
    pub title: String,
    pub url: String,
    pub web_socket_debugger_url: Option<String>,
}

impl PageInfo {
    /// Regular tabs, as opposed to workers, extensions and iframes.
    pub fn is_page(&self) -> bool {
        self.page_type == "page"
    }
}

/// Browser version info.
///
/// Note: Chrome returns PascalCase field names for this endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserVersion {
    #[serde(rename = "Browser")]
    pub browser: String,
    #[serde(rename = "Protocol-Version")]
    pub protocol_version: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: String,
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
