use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};

use rasoi_core::{ChatMessage, DeliveryState, OutgoingMessage, RemoteSession, now_millis};

use crate::api::{AuthApi, MessageApi, SessionApi, Subscription, User};
use crate::error::{RemoteError, Result};

/// In-memory stand-in for the hosted backend, used by tests and the demo
/// CLI. Sends are echoed to every subscriber of the conversation, the
/// sender included, which matches what the hosted realtime channel does.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    next_message_seq: AtomicU64,
    sessions_down: AtomicBool,
    sends_down: AtomicBool,
    history_down: AtomicBool,
}

#[derive(Default)]
struct MockState {
    sessions: HashMap<String, RemoteSession>,
    messages: HashMap<String, Vec<ChatMessage>>,
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<ChatMessage>>>,
    user: Option<User>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn sign_in(&self, user: User) {
        self.state.lock().await.user = Some(user);
    }

    pub fn fail_sessions(&self, down: bool) {
        self.sessions_down.store(down, Ordering::Relaxed);
    }

    pub fn fail_sends(&self, down: bool) {
        self.sends_down.store(down, Ordering::Relaxed);
    }

    pub fn fail_history(&self, down: bool) {
        self.history_down.store(down, Ordering::Relaxed);
    }

    /// Pre-populate history without going through the send path.
    pub async fn seed_message(&self, message: ChatMessage) {
        self.state
            .lock()
            .await
            .messages
            .entry(message.conversation_id.clone())
            .or_default()
            .push(message);
    }

    /// Simulate an insert from another participant: stored and pushed to
    /// every live subscriber of the conversation.
    pub async fn push_from_server(&self, message: ChatMessage) {
        let mut state = self.state.lock().await;
        state
            .messages
            .entry(message.conversation_id.clone())
            .or_default()
            .push(message.clone());
        Self::broadcast(&mut state, &message);
    }

    fn broadcast(state: &mut MockState, message: &ChatMessage) {
        if let Some(subs) = state.subscribers.get_mut(&message.conversation_id) {
            subs.retain(|tx| tx.send(message.clone()).is_ok());
        }
    }
}

impl SessionApi for MockBackend {
    async fn get_session(&self, phone: &str) -> Result<Option<RemoteSession>> {
        if self.sessions_down.load(Ordering::Relaxed) {
            return Err(RemoteError::Unavailable("session api is down".into()));
        }
        Ok(self.state.lock().await.sessions.get(phone).cloned())
    }

    async fn update_session(&self, session: RemoteSession) -> Result<()> {
        if self.sessions_down.load(Ordering::Relaxed) {
            return Err(RemoteError::Unavailable("session api is down".into()));
        }
        let mut state = self.state.lock().await;
        state.sessions.insert(session.phone.clone(), session);
        Ok(())
    }
}

impl MessageApi for MockBackend {
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>> {
        if self.history_down.load(Ordering::Relaxed) {
            return Err(RemoteError::Unavailable("message api is down".into()));
        }
        let state = self.state.lock().await;
        let mut messages = state
            .messages
            .get(conversation_id)
            .cloned()
            .unwrap_or_default();
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    async fn send_message(
        &self,
        outgoing: OutgoingMessage,
        sender_phone: &str,
    ) -> Result<ChatMessage> {
        if self.sends_down.load(Ordering::Relaxed) {
            return Err(RemoteError::Rejected("message api is down".into()));
        }

        let seq = self.next_message_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let message = ChatMessage {
            id: format!("msg_{seq}"),
            conversation_id: outgoing.conversation_id.clone(),
            sender_phone: sender_phone.to_string(),
            content: outgoing.content,
            image_url: outgoing.image_url,
            audio_url: outgoing.audio_url,
            location: outgoing.location,
            timestamp: now_millis(),
            delivery: DeliveryState::Sent,
        };

        let mut state = self.state.lock().await;
        state
            .messages
            .entry(message.conversation_id.clone())
            .or_default()
            .push(message.clone());
        Self::broadcast(&mut state, &message);

        Ok(message)
    }

    async fn subscribe(&self, conversation_id: &str) -> Result<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state
            .lock()
            .await
            .subscribers
            .entry(conversation_id.to_string())
            .or_default()
            .push(tx);
        tracing::debug!(conversation_id, "New realtime subscriber");
        Ok(Subscription::new(rx))
    }
}

impl AuthApi for MockBackend {
    async fn current_user(&self) -> Option<User> {
        self.state.lock().await.user.clone()
    }

    async fn sign_out(&self) {
        self.state.lock().await.user = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasoi_core::DraftFields;

    fn session(phone: &str, kitchen_name: &str, updated_at: i64) -> RemoteSession {
        RemoteSession {
            phone: phone.into(),
            fields: DraftFields {
                phone: Some(phone.into()),
                kitchen_name: Some(kitchen_name.into()),
                ..DraftFields::default()
            },
            updated_at,
        }
    }

    #[tokio::test]
    async fn session_upsert_is_last_write_wins() {
        let backend = MockBackend::new();

        backend
            .update_session(session("+9230012345", "Handi House", 1))
            .await
            .unwrap();
        backend
            .update_session(session("+9230012345", "Karahi Corner", 2))
            .await
            .unwrap();

        let stored = backend.get_session("+9230012345").await.unwrap().unwrap();
        assert_eq!(stored.fields.kitchen_name.as_deref(), Some("Karahi Corner"));
        assert_eq!(stored.updated_at, 2);
    }

    #[tokio::test]
    async fn send_assigns_id_and_echoes_to_subscribers() {
        let backend = MockBackend::new();
        let mut sub = backend.subscribe("conv_1").await.unwrap();

        let sent = backend
            .send_message(OutgoingMessage::text("conv_1", "hi"), "+9230012345")
            .await
            .unwrap();
        assert_eq!(sent.id, "msg_1");
        assert_eq!(sent.delivery, DeliveryState::Sent);

        let echoed = sub.next().await.unwrap();
        assert_eq!(echoed.id, sent.id);

        let history = backend.list_messages("conv_1").await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn dropped_subscription_stops_receiving() {
        let backend = MockBackend::new();
        let sub = backend.subscribe("conv_1").await.unwrap();
        sub.unsubscribe();

        backend
            .send_message(OutgoingMessage::text("conv_1", "hi"), "+9230012345")
            .await
            .unwrap();

        // Sender list is pruned on the failed send.
        let state = backend.state.lock().await;
        assert!(state.subscribers.get("conv_1").unwrap().is_empty());
    }
}
