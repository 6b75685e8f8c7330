use super::*;

#[test]
fn test_cdp_request_serialize() {
    let req = CdpRequest {
        id: 7,
        method: "Runtime.evaluate".to_string(),
        params: Some(serde_json::json!({"expression": "location.href"})),
        session_id: Some("S1".to_string()),
    };
    let json = serde_json::to_string(&req).unwrap();
    assert!(json.contains("Runtime.evaluate"));
    assert!(json.contains("\"sessionId\":\"S1\""));
}

#[test]
fn test_cdp_request_omits_empty_fields() {
    let req = CdpRequest {
        id: 1,
        method: "Target.getTargets".to_string(),
        params: None,
        session_id: None,
    };
    let json = serde_json::to_string(&req).unwrap();
    assert!(!json.contains("params"));
    assert!(!json.contains("sessionId"));
}

#[test]
fn test_response_is_not_an_event() {
    let json = r#"{"id": 1, "result": {"frameId": "abc"}}"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    assert_eq!(resp.id, Some(1));
    assert!(resp.into_event().is_none());
}

#[test]
fn test_event_carries_session() {
    let json = r#"{
        "method": "Runtime.bindingCalled",
        "params": {"name": "__snaprelayMutation", "payload": ""},
        "sessionId": "S1"
    }"#;
    let resp: CdpResponse = serde_json::from_str(json).unwrap();
    let (session, event) = resp.into_event().unwrap();
    assert_eq!(session.as_deref(), Some("S1"));
    assert_eq!(event.method, "Runtime.bindingCalled");
    assert_eq!(event.params["name"], "__snaprelayMutation");
}

#[test]
fn test_page_info_deserialize() {
    let json = r#"[
        {
            "id": "page123",
            "type": "page",
            "title": "Gemini",
            "url": "https://gemini.google.com/app",
            "webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/page123"
        },
        {
            "id": "sw1",
            "type": "service_worker",
            "url": "https://gemini.google.com/sw.js"
        }
    ]"#;
    let pages: Vec<PageInfo> = serde_json::from_str(json).unwrap();
    assert_eq!(pages.len(), 2);
    assert!(pages[0].is_page());
    assert!(!pages[1].is_page());
    assert_eq!(pages[1].title, "");
}

#[test]
fn test_browser_version_deserialize() {
    let json = r#"{
        "Browser": "Chrome/126.0.0.0",
        "Protocol-Version": "1.3",
        "User-Agent": "Mozilla/5.0",
        "webSocketDebuggerUrl": "ws://localhost:9222/devtools/browser/abc"
    }"#;
    let version: BrowserVersion = serde_json::from_str(json).unwrap();
    assert_eq!(version.protocol_version, "1.3");
    assert!(version.web_socket_debugger_url.ends_with("/browser/abc"));
}
