mod draft;
mod error;
mod message;

pub use draft::*;
pub use error::DraftError;
pub use message::*;

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
