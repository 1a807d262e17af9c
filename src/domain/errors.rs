use crate::domain::entities::CardId;

/// Board data that does not have the expected shape
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("Card id {0} is not in the card catalog")]
    UnknownCard(CardId),
    #[error("State update is missing '{0}'")]
    MissingField(&'static str),
    #[error("Invalid {zone}: {message}")]
    InvalidShape { zone: &'static str, message: String },
    #[error("Invalid player number {0} (expected 1 or 2)")]
    InvalidPlayer(u8),
}

impl DataError {
    pub fn shape(zone: &'static str, err: impl std::fmt::Display) -> Self {
        DataError::InvalidShape {
            zone,
            message: err.to_string(),
        }
    }
}
