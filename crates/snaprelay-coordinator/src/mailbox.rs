//! Hand-off of image and prompt to the page worker.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use snaprelay_protocols::{CorrelationId, ImagePayload, MessageError};

/// One pending hand-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailboxSlot {
    /// Image as a data URI.
    pub current_screenshot: String,
    pub current_prompt: String,
}

impl MailboxSlot {
    pub fn new(image: &ImagePayload, prompt: impl Into<String>) -> Self {
        Self {
            current_screenshot: image.to_data_uri(),
            current_prompt: prompt.into(),
        }
    }

    /// Decode the stored image.
    pub fn image(&self) -> Result<ImagePayload, MessageError> {
        ImagePayload::from_encoded(&self.current_screenshot)
    }
}

/// One-shot slots keyed by request id. Each slot is taken exactly once, so
/// concurrent requests never read each other's image.
#[derive(Debug, Default)]
pub struct Mailbox {
    slots: Mutex<HashMap<CorrelationId, MailboxSlot>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `slot` for `id`. Returns `false` if a slot was already waiting
    /// under that id and got replaced.
    pub fn put(&self, id: CorrelationId, slot: MailboxSlot) -> bool {
        self.slots.lock().insert(id, slot).is_none()
    }

    /// Remove and return the slot for `id`.
    pub fn take(&self, id: &CorrelationId) -> Option<MailboxSlot> {
        self.slots.lock().remove(id)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(prompt: &str) -> MailboxSlot {
        MailboxSlot::new(&ImagePayload::png(vec![1, 2, 3]), prompt)
    }

    #[test]
    fn test_take_is_one_shot() {
        let mailbox = Mailbox::new();
        let id = CorrelationId::new();

        assert!(mailbox.put(id, slot("first")));
        assert_eq!(mailbox.len(), 1);
        assert_eq!(mailbox.take(&id).unwrap().current_prompt, "first");
        assert!(mailbox.take(&id).is_none());
        assert!(mailbox.is_empty());
    }

    #[test]
    fn test_slots_are_independent() {
        let mailbox = Mailbox::new();
        let a = CorrelationId::new();
        let b = CorrelationId::new();

        mailbox.put(a, slot("a"));
        mailbox.put(b, slot("b"));

        assert_eq!(mailbox.take(&b).unwrap().current_prompt, "b");
        assert_eq!(mailbox.take(&a).unwrap().current_prompt, "a");
    }

    #[test]
    fn test_put_same_id_replaces() {
        let mailbox = Mailbox::new();
        let id = CorrelationId::new();

        assert!(mailbox.put(id, slot("old")));
        assert!(!mailbox.put(id, slot("new")));
        assert_eq!(mailbox.take(&id).unwrap().current_prompt, "new");
    }

    #[test]
    fn test_slot_image_round_trips() {
        let image = ImagePayload::png(vec![0x89, b'P', b'N', b'G']);
        let slot = MailboxSlot::new(&image, "prompt");
        assert!(slot.current_screenshot.starts_with("data:image/png;base64,"));
        assert_eq!(slot.image().unwrap(), image);
    }

    #[test]
    fn test_slot_field_names() {
        let json = serde_json::to_value(slot("p")).unwrap();
        assert!(json.get("currentScreenshot").is_some());
        assert_eq!(json["currentPrompt"], "p");
    }
}
