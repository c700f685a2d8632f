mod api;
mod error;
mod mock;

pub use api::{AuthApi, MessageApi, SessionApi, Subscription, User};
pub use error::RemoteError;
pub use mock::MockBackend;
