use super::*;

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

#[test]
fn test_encode_png() {
    let image = RgbaImage::new(4, 3);
    let data = encode_png(&image).unwrap();
    assert_eq!(data[..8], PNG_MAGIC);
}

#[test]
fn test_encoded_capture_is_png_payload() {
    let payload = ImagePayload::png(encode_png(&RgbaImage::new(1, 1)).unwrap());
    assert_eq!(payload.mime(), "image/png");
    assert_eq!(payload.extension(), "png");
    assert!(payload.to_data_uri().starts_with("data:image/png;base64,"));
}

#[test]
fn test_screenshot_error_display() {
    assert_eq!(ScreenshotError::NoMonitor.to_string(), "No monitor found");
    let err = ScreenshotError::CaptureFailed("permission denied".to_string());
    assert!(err.to_string().contains("permission denied"));
}

#[test]
fn test_screenshot_error_into_capture_error() {
    let err: CaptureError = ScreenshotError::NoMonitor.into();
    assert!(matches!(err, CaptureError::Capture(_)));
    assert!(err.to_string().contains("No monitor found"));
}
