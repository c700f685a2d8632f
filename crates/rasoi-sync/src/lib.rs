mod chat;
mod error;
mod events;
mod reconciler;

pub use chat::{ChatStore, ConversationState};
pub use error::SyncError;
pub use events::ChatEvent;
pub use reconciler::{DraftReconciler, PushOutcome, SaveResult};

pub use rasoi_core::{
    ChatMessage, DeliveryState, DraftFields, OnboardingStep, OutgoingMessage, RemoteSession,
};
pub use rasoi_db::RasoiDb;
