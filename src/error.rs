use thiserror::Error;

/// Error types for the raffle server
///
/// The `Display` text of the domain variants is sent verbatim to clients in
/// `error` events, so it is written in the language of the client UI.
#[derive(Debug, Error)]
pub enum RaffleError {
    /// Room lookup and creation errors
    #[error("Çekiliş bulunamadı.")]
    RoomNotFound(String),

    #[error("Bu çekiliş ismi zaten alınmış.")]
    DuplicateRoomId(String),

    #[error("Sistemde şu an çok fazla çekiliş var. Limit: {0}")]
    CapacityExceeded(usize),

    /// Membership errors
    #[error("Hatalı şifre.")]
    WrongPassword,

    #[error("Çekiliş çoktan başladı.")]
    RoomNotWaiting(String),

    #[error("Bu çekiliş doldu. Maksimum katılımcı: {0}")]
    RoomFull(usize),

    #[error("Bu isim çekilişte zaten var.")]
    DuplicateName(String),

    #[error("Bu çekilişe zaten katıldınız.")]
    AlreadyMember(String),

    #[error("{0} boş olamaz.")]
    MissingField(&'static str),

    /// Draw errors
    #[error("Çekiliş için en az 2 kişi gerekiyor.")]
    NotEnoughParticipants(usize),

    /// Operator console errors
    #[error("Hatalı sistem admin anahtarı.")]
    Unauthorized,

    #[error("Bu işlem için sistem yöneticisi girişi gerekli.")]
    OperatorLoginRequired,

    /// Transport errors
    #[error("Invalid raffle message: {0}")]
    InvalidMessage(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Convenience type alias for Results using RaffleError
pub type Result<T> = std::result::Result<T, RaffleError>;

impl RaffleError {
    /// Helper to create configuration errors
    pub fn configuration(msg: impl Into<String>) -> Self {
        RaffleError::InvalidConfiguration(msg.into())
    }

    /// True for request validation failures that are reported to the
    /// requester and otherwise leave the server untouched.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            RaffleError::InvalidMessage(_) | RaffleError::InvalidConfiguration(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RaffleError::WrongPassword;
        assert_eq!(err.to_string(), "Hatalı şifre.");

        let err = RaffleError::RoomNotFound("R1".to_string());
        assert_eq!(err.to_string(), "Çekiliş bulunamadı.");
    }

    #[test]
    fn test_limit_errors_mention_limit() {
        assert_eq!(
            RaffleError::CapacityExceeded(5).to_string(),
            "Sistemde şu an çok fazla çekiliş var. Limit: 5"
        );
        assert_eq!(
            RaffleError::RoomFull(100).to_string(),
            "Bu çekiliş doldu. Maksimum katılımcı: 100"
        );
    }

    #[test]
    fn test_missing_field_names_field() {
        let err = RaffleError::MissingField("İsim");
        assert_eq!(err.to_string(), "İsim boş olamaz.");
    }

    #[test]
    fn test_error_helpers() {
        let err = RaffleError::configuration("bad port");
        assert!(matches!(err, RaffleError::InvalidConfiguration(_)));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validation_classification() {
        assert!(RaffleError::NotEnoughParticipants(1).is_validation());
        assert!(RaffleError::Unauthorized.is_validation());

        let parse_err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(!RaffleError::from(parse_err).is_validation());
    }
}
