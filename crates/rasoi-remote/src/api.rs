use std::future::Future;

use tokio::sync::mpsc;

use rasoi_core::{ChatMessage, OutgoingMessage, RemoteSession};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub phone: String,
    pub name: Option<String>,
}

/// Remote mirror of the onboarding draft, keyed by phone number. Upsert
/// semantics, last write wins; the backend applies no field-level merge.
pub trait SessionApi: Send + Sync + 'static {
    fn get_session(
        &self,
        phone: &str,
    ) -> impl Future<Output = Result<Option<RemoteSession>>> + Send;

    fn update_session(&self, session: RemoteSession) -> impl Future<Output = Result<()>> + Send;
}

pub trait MessageApi: Send + Sync + 'static {
    /// History for one conversation, ascending by creation time.
    fn list_messages(
        &self,
        conversation_id: &str,
    ) -> impl Future<Output = Result<Vec<ChatMessage>>> + Send;

    /// Returns the canonical record with the server-assigned id and
    /// timestamp.
    fn send_message(
        &self,
        outgoing: OutgoingMessage,
        sender_phone: &str,
    ) -> impl Future<Output = Result<ChatMessage>> + Send;

    fn subscribe(
        &self,
        conversation_id: &str,
    ) -> impl Future<Output = Result<Subscription>> + Send;
}

pub trait AuthApi: Send + Sync + 'static {
    fn current_user(&self) -> impl Future<Output = Option<User>> + Send;

    fn sign_out(&self) -> impl Future<Output = ()> + Send;
}

/// Live feed of server-originated inserts for one conversation. Dropping it
/// tears the subscription down; pushes after that are discarded, not queued.
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<ChatMessage>,
}

impl Subscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<ChatMessage>) -> Self {
        Self { receiver }
    }

    pub async fn next(&mut self) -> Option<ChatMessage> {
        self.receiver.recv().await
    }

    pub fn unsubscribe(self) {}
}
