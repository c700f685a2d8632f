use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use rasoi_core::{ChatMessage, DeliveryState, OutgoingMessage, now_millis};
use rasoi_remote::{AuthApi, MessageApi};

use crate::error::{Result, SyncError};
use crate::events::ChatEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Loading,
    Loaded,
}

struct Conversation {
    state: ConversationState,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    fn loaded_empty() -> Self {
        Self {
            state: ConversationState::Loaded,
            messages: Vec::new(),
        }
    }
}

type ConversationMap = HashMap<String, Conversation>;

/// Append-only message list per conversation with optimistic sends and a
/// deduplicating realtime ingress. Display order is insertion order, not
/// server timestamp order; a late push lands at the tail.
pub struct ChatStore<M, A> {
    api: Arc<M>,
    auth: Arc<A>,
    conversations: Arc<Mutex<ConversationMap>>,
    event_tx: mpsc::UnboundedSender<ChatEvent>,
    event_rx: Option<mpsc::UnboundedReceiver<ChatEvent>>,
    subscriptions: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl<M: MessageApi, A: AuthApi> ChatStore<M, A> {
    pub fn new(api: Arc<M>, auth: Arc<A>) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            api,
            auth,
            conversations: Arc::new(Mutex::new(HashMap::new())),
            event_tx,
            event_rx: Some(event_rx),
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    pub fn take_event_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<ChatEvent>> {
        self.event_rx.take()
    }

    pub fn state(&self, conversation_id: &str) -> Option<ConversationState> {
        lock_map(&self.conversations)
            .get(conversation_id)
            .map(|c| c.state)
    }

    /// Snapshot of the conversation's list in display order.
    pub fn messages(&self, conversation_id: &str) -> Vec<ChatMessage> {
        lock_map(&self.conversations)
            .get(conversation_id)
            .map(|c| c.messages.clone())
            .unwrap_or_default()
    }

    /// Fetch history for a conversation. A failed fetch renders as an empty
    /// conversation, not an error screen; local entries the server does not
    /// know about yet (in-flight optimistic sends) are kept at the tail.
    pub async fn load_history(&self, conversation_id: &str) -> Result<usize> {
        {
            let mut convs = lock_map(&self.conversations);
            convs
                .entry(conversation_id.to_string())
                .or_insert_with(Conversation::loaded_empty)
                .state = ConversationState::Loading;
        }

        let history = match self.api.list_messages(conversation_id).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!(
                    conversation_id,
                    error = %e,
                    "History fetch failed, showing empty conversation"
                );
                Vec::new()
            }
        };

        let count = history.len();
        {
            let mut convs = lock_map(&self.conversations);
            let conv = convs
                .entry(conversation_id.to_string())
                .or_insert_with(Conversation::loaded_empty);

            let mut messages: Vec<ChatMessage> = history
                .into_iter()
                .map(|mut m| {
                    m.delivery = DeliveryState::Sent;
                    m
                })
                .collect();
            for existing in conv.messages.drain(..) {
                if !messages.iter().any(|m| m.id == existing.id) {
                    messages.push(existing);
                }
            }

            conv.messages = messages;
            conv.state = ConversationState::Loaded;
        }

        self.emit(ChatEvent::HistoryLoaded {
            conversation_id: conversation_id.to_string(),
            count,
        });
        Ok(count)
    }

    /// Optimistic send: the message appears in the list immediately with a
    /// temporary id and `Pending` delivery, and the call returns. A spawned
    /// task performs the remote send and either confirms the entry in place
    /// or marks it `Failed`. Returns the temporary id.
    pub async fn send(&self, outgoing: OutgoingMessage) -> Result<String> {
        let user = self.auth.current_user().await.ok_or(SyncError::NotSignedIn)?;

        let message = ChatMessage::optimistic(&outgoing, &user.phone, now_millis());
        let temp_id = message.id.clone();
        let conversation_id = outgoing.conversation_id.clone();

        {
            let mut convs = lock_map(&self.conversations);
            convs
                .entry(conversation_id.clone())
                .or_insert_with(Conversation::loaded_empty)
                .messages
                .push(message.clone());
        }
        self.emit(ChatEvent::MessageInserted {
            conversation_id: conversation_id.clone(),
            message,
        });

        let api = self.api.clone();
        let conversations = self.conversations.clone();
        let event_tx = self.event_tx.clone();
        let sender_phone = user.phone;
        let task_temp_id = temp_id.clone();
        tokio::spawn(async move {
            match api.send_message(outgoing, &sender_phone).await {
                Ok(confirmed) => {
                    confirm_entry(&conversations, &event_tx, &conversation_id, &task_temp_id, confirmed);
                }
                Err(e) => {
                    tracing::warn!(
                        conversation_id = %conversation_id,
                        temp_id = %task_temp_id,
                        error = %e,
                        "Message send failed"
                    );
                    fail_entry(&conversations, &event_tx, &conversation_id, &task_temp_id, e.to_string());
                }
            }
        });

        Ok(temp_id)
    }

    /// Realtime ingress. Pushes whose id is already in the list (the
    /// sender's own echo, a redelivery) are dropped; everything else is
    /// appended in arrival order.
    pub fn ingest_push(&self, message: ChatMessage) {
        ingest(&self.conversations, &self.event_tx, message);
    }

    /// Subscribe to the conversation's realtime channel and drain it into
    /// `ingest_push` until detached. Replaces any previous attachment.
    pub async fn attach(&self, conversation_id: &str) -> Result<()> {
        self.detach(conversation_id);

        let mut subscription = self.api.subscribe(conversation_id).await?;
        let conversations = self.conversations.clone();
        let event_tx = self.event_tx.clone();
        let id = conversation_id.to_string();

        let handle = tokio::spawn(async move {
            while let Some(message) = subscription.next().await {
                ingest(&conversations, &event_tx, message);
            }
            tracing::debug!(conversation_id = %id, "Realtime subscription closed");
        });

        self.subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(conversation_id.to_string(), handle);
        Ok(())
    }

    /// Tear down the conversation's subscription; late pushes are dropped,
    /// not queued.
    pub fn detach(&self, conversation_id: &str) {
        let handle = self
            .subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(conversation_id);
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    fn emit(&self, event: ChatEvent) {
        let _ = self.event_tx.send(event);
    }
}

impl<M, A> Drop for ChatStore<M, A> {
    fn drop(&mut self) {
        let handles = self
            .subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for handle in handles.values() {
            handle.abort();
        }
    }
}

fn lock_map(map: &Mutex<ConversationMap>) -> MutexGuard<'_, ConversationMap> {
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn confirm_entry(
    conversations: &Mutex<ConversationMap>,
    event_tx: &mpsc::UnboundedSender<ChatEvent>,
    conversation_id: &str,
    temp_id: &str,
    mut confirmed: ChatMessage,
) {
    confirmed.delivery = DeliveryState::Sent;
    {
        let mut convs = lock_map(conversations);
        let Some(conv) = convs.get_mut(conversation_id) else {
            return;
        };

        if conv.messages.iter().any(|m| m.id == confirmed.id) {
            // The realtime echo won the race and already holds the server
            // id; keeping the optimistic twin would duplicate it.
            conv.messages.retain(|m| m.id != temp_id);
        } else if let Some(entry) = conv.messages.iter_mut().find(|m| m.id == temp_id) {
            *entry = confirmed.clone();
        } else {
            return;
        }
    }

    let _ = event_tx.send(ChatEvent::MessageConfirmed {
        conversation_id: conversation_id.to_string(),
        temp_id: temp_id.to_string(),
        message: confirmed,
    });
}

fn fail_entry(
    conversations: &Mutex<ConversationMap>,
    event_tx: &mpsc::UnboundedSender<ChatEvent>,
    conversation_id: &str,
    temp_id: &str,
    reason: String,
) {
    {
        let mut convs = lock_map(conversations);
        let Some(conv) = convs.get_mut(conversation_id) else {
            return;
        };
        let Some(entry) = conv.messages.iter_mut().find(|m| m.id == temp_id) else {
            return;
        };
        entry.delivery = DeliveryState::Failed;
    }

    let _ = event_tx.send(ChatEvent::MessageFailed {
        conversation_id: conversation_id.to_string(),
        temp_id: temp_id.to_string(),
        reason,
    });
}

fn ingest(
    conversations: &Mutex<ConversationMap>,
    event_tx: &mpsc::UnboundedSender<ChatEvent>,
    mut message: ChatMessage,
) {
    message.delivery = DeliveryState::Sent;
    let conversation_id = message.conversation_id.clone();

    let appended = {
        let mut convs = lock_map(conversations);
        let conv = convs
            .entry(conversation_id.clone())
            .or_insert_with(Conversation::loaded_empty);
        if conv.messages.iter().any(|m| m.id == message.id) {
            false
        } else {
            conv.messages.push(message.clone());
            true
        }
    };

    if appended {
        let _ = event_tx.send(ChatEvent::MessagePushed {
            conversation_id,
            message,
        });
    }
}
