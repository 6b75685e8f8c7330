use super::*;

const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

#[test]
fn test_image_payload_data_uri() {
    let payload = ImagePayload::png(PNG_HEADER.to_vec());
    let uri = payload.to_data_uri();
    assert!(uri.starts_with("data:image/png;base64,"));
    assert_eq!(ImagePayload::from_encoded(&uri).unwrap(), payload);
}

#[test]
fn test_image_payload_accepts_bare_base64() {
    let payload = ImagePayload::png(PNG_HEADER.to_vec());
    let decoded = ImagePayload::from_encoded(&payload.to_base64()).unwrap();
    assert_eq!(decoded.mime(), "image/png");
    assert_eq!(decoded.bytes(), &PNG_HEADER);
}

#[test]
fn test_image_payload_keeps_declared_mime() {
    let decoded = ImagePayload::from_encoded("data:image/jpeg;base64,AAEC").unwrap();
    assert_eq!(decoded.mime(), "image/jpeg");
    assert_eq!(decoded.extension(), "jpg");
    assert_eq!(decoded.bytes(), &[0, 1, 2]);
}

#[test]
fn test_image_payload_rejects_empty() {
    assert!(ImagePayload::from_encoded("").is_err());
    assert!(ImagePayload::from_encoded("data:image/png;base64,").is_err());
}

#[test]
fn test_image_payload_rejects_garbage() {
    let err = ImagePayload::from_encoded("not*base64!").unwrap_err();
    assert!(matches!(err, MessageError::InvalidImage(_)));
}

#[test]
fn test_image_payload_debug_hides_bytes() {
    let payload = ImagePayload::png(vec![0u8; 1024]);
    let debug = format!("{:?}", payload);
    assert!(debug.contains("1024"));
    assert!(!debug.contains("0, 0, 0"));
}

#[test]
fn test_sequence_tag_display() {
    assert_eq!(SequenceTag::new(2, 3).to_string(), "(2/3)");
}

#[test]
fn test_capture_request_serializes_screenshot_field() {
    let request = CaptureRequest::new(ImagePayload::png(PNG_HEADER.to_vec()), "Analyze this image");
    let json = serde_json::to_value(&request).unwrap();
    assert!(json["screenshot"].as_str().unwrap().starts_with("data:image/png"));
    assert_eq!(json["prompt"], "Analyze this image");
    assert!(json.get("sequence").is_none());
}

#[test]
fn test_capture_request_without_id_gets_one() {
    let json = r#"{"screenshot":"AAEC","prompt":"hi"}"#;
    let request: CaptureRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.prompt, "hi");
    assert_eq!(request.image.bytes(), &[0, 1, 2]);
}

#[test]
fn test_capture_request_with_sequence() {
    let request = CaptureRequest::new(ImagePayload::png(vec![1]), "Summarize")
        .with_sequence(SequenceTag::new(1, 3));
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["sequence"]["index"], 1);
    assert_eq!(json["sequence"]["total"], 3);
}

#[test]
fn test_correlation_ids_are_unique() {
    assert_ne!(CorrelationId::new(), CorrelationId::new());
}

#[test]
fn test_capture_result_skips_missing_html() {
    let result = CaptureResult::new("42", None);
    let json = serde_json::to_string(&result).unwrap();
    assert_eq!(json, r#"{"text":"42"}"#);
}
