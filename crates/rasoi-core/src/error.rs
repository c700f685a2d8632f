use thiserror::Error;

#[derive(Error, Debug)]
pub enum DraftError {
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Field {0} is blank")]
    BlankField(&'static str),
}
