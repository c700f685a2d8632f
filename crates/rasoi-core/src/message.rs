use serde::{Deserialize, Serialize};

pub const TEMP_ID_PREFIX: &str = "temp_";

/// Per-message delivery state. `Failed` entries stay in the list; whether
/// the UI surfaces them is its call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    Pending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub conversation_id: String,
    pub sender_phone: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    pub location: Option<GeoPoint>,
    pub timestamp: i64,
    pub delivery: DeliveryState,
}

/// What a screen hands over when the partner hits send. The id and the
/// canonical timestamp are the server's to assign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub conversation_id: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
    pub location: Option<GeoPoint>,
}

impl OutgoingMessage {
    pub fn text(conversation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

impl ChatMessage {
    /// Local echo shown before the server acknowledges the send.
    pub fn optimistic(outgoing: &OutgoingMessage, sender_phone: &str, millis: i64) -> Self {
        Self {
            id: temp_id(millis),
            conversation_id: outgoing.conversation_id.clone(),
            sender_phone: sender_phone.to_string(),
            content: outgoing.content.clone(),
            image_url: outgoing.image_url.clone(),
            audio_url: outgoing.audio_url.clone(),
            location: outgoing.location,
            timestamp: millis,
            delivery: DeliveryState::Pending,
        }
    }

    pub fn is_optimistic(&self) -> bool {
        is_temp_id(&self.id)
    }
}

pub fn temp_id(millis: i64) -> String {
    format!("{TEMP_ID_PREFIX}{millis}")
}

pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}
