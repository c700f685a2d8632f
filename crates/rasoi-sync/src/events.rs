use rasoi_core::ChatMessage;

/// Pushed over the chat store's mpsc bridge so a UI layer can react to list
/// changes without polling.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    HistoryLoaded { conversation_id: String, count: usize },
    MessageInserted { conversation_id: String, message: ChatMessage },
    MessageConfirmed { conversation_id: String, temp_id: String, message: ChatMessage },
    MessageFailed { conversation_id: String, temp_id: String, reason: String },
    MessagePushed { conversation_id: String, message: ChatMessage },
}
