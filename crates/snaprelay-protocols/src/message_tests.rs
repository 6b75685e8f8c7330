use super::*;
use crate::capture::{ImagePayload, SequenceTag};

#[test]
fn test_decode_process_request() {
    let frame = r#"{
        "action": "process-request",
        "screenshot": "data:image/png;base64,AAEC",
        "prompt": "Analyze this image"
    }"#;
    match ChannelMessage::decode(frame).unwrap() {
        ChannelMessage::ProcessRequest(request) => {
            assert_eq!(request.prompt, "Analyze this image");
            assert_eq!(request.image.bytes(), &[0, 1, 2]);
            assert!(request.sequence.is_none());
        }
        other => panic!("unexpected message: {:?}", other),
    }
}

#[test]
fn test_decode_legacy_actions() {
    let frame = r#"{"action":"processScreenshot","screenshot":"AAEC","prompt":"p"}"#;
    assert!(matches!(
        ChannelMessage::decode(frame).unwrap(),
        ChannelMessage::ProcessRequest(_)
    ));

    let frame = r#"{"action":"geminiResult","result":"42"}"#;
    match ChannelMessage::decode(frame).unwrap() {
        ChannelMessage::CaptureResult { id, result } => {
            assert!(id.is_none());
            assert_eq!(result.unwrap().text(), Some("42"));
        }
        other => panic!("unexpected message: {:?}", other),
    }
}

#[test]
fn test_result_encodes_text_and_html() {
    let id = CorrelationId::new();
    let message = ChannelMessage::result(id, CaptureResult::new("42", Some("<div>42</div>".into())));
    let json: serde_json::Value = serde_json::from_str(&message.encode().unwrap()).unwrap();
    assert_eq!(json["action"], "result");
    assert_eq!(json["result"]["text"], "42");
    assert_eq!(json["result"]["html"], "<div>42</div>");
    assert_eq!(json["id"], id.to_string());
}

#[test]
fn test_result_without_text_has_no_usable_text() {
    let frame = r#"{"action":"result","result":{"html":"<div></div>"}}"#;
    match ChannelMessage::decode(frame).unwrap() {
        ChannelMessage::CaptureResult { result, .. } => {
            let result = result.unwrap();
            assert_eq!(result.text(), None);
            assert_eq!(result.html(), Some("<div></div>"));
        }
        other => panic!("unexpected message: {:?}", other),
    }

    let frame = r#"{"action":"result"}"#;
    assert!(matches!(
        ChannelMessage::decode(frame).unwrap(),
        ChannelMessage::CaptureResult { result: None, .. }
    ));
}

#[test]
fn test_whitespace_text_is_not_usable() {
    let payload = ResultPayload::Plain("   \n".to_string());
    assert_eq!(payload.text(), None);
}

#[test]
fn test_error_message() {
    let message = ChannelMessage::error(None, "Target page not found");
    let encoded = message.encode().unwrap();
    assert_eq!(encoded, r#"{"action":"error","error":"Target page not found"}"#);
}

#[test]
fn test_heartbeats() {
    let hb = ChannelMessage::decode(r#"{"action":"heartbeat"}"#).unwrap();
    let ack = ChannelMessage::decode(r#"{"action":"heartbeat-ack"}"#).unwrap();
    assert_eq!(hb, ChannelMessage::Heartbeat);
    assert_eq!(ack, ChannelMessage::HeartbeatAck);
    assert!(hb.is_heartbeat());
    assert!(ack.is_heartbeat());
    assert_eq!(ChannelMessage::HeartbeatAck.encode().unwrap(), r#"{"action":"heartbeat-ack"}"#);
}

#[test]
fn test_malformed_frames() {
    assert!(ChannelMessage::decode("{not json").is_err());
    assert!(ChannelMessage::decode(r#"{"action":"launch-missiles"}"#).is_err());
    assert!(ChannelMessage::decode(r#"{"screenshot":"AAEC"}"#).is_err());
    assert!(ChannelMessage::decode(r#"{"action":"process-request","screenshot":"%%%"}"#).is_err());
}

#[test]
fn test_request_fields_survive_round_trip() {
    let request = CaptureRequest::new(ImagePayload::png(vec![9, 8, 7]), "Summarize (2/3)")
        .with_sequence(SequenceTag::new(2, 3));
    let message = ChannelMessage::ProcessRequest(request.clone());
    let decoded = ChannelMessage::decode(&message.encode().unwrap()).unwrap();
    assert_eq!(decoded, ChannelMessage::ProcessRequest(request));
    assert_eq!(decoded.action(), "process-request");
}

#[test]
fn test_correlation_id_accessor() {
    let id = CorrelationId::new();
    assert_eq!(ChannelMessage::error(Some(id), "x").correlation_id(), Some(id));
    assert_eq!(ChannelMessage::Heartbeat.correlation_id(), None);
}
