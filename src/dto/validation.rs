//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted event name.
pub const MAX_EVENT_NAME_LEN: usize = 64;
/// Longest accepted nickname, in characters, after trimming.
pub const MAX_NICKNAME_LEN: usize = 24;
/// Room codes are exactly this many characters.
pub const ROOM_CODE_LEN: usize = 4;

/// Validates that an event name is 1 to 64 characters from `[A-Za-z0-9_:.-]`.
///
/// # Examples
///
/// ```ignore
/// validate_event_name("card-play")  // Ok
/// validate_event_name("room:join")  // Ok
/// validate_event_name("bad name")   // Err - space
/// ```
pub fn validate_event_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.len() > MAX_EVENT_NAME_LEN {
        let mut err = ValidationError::new("event_name_length");
        err.message = Some(
            format!(
                "Event name must be 1 to {MAX_EVENT_NAME_LEN} characters (got {})",
                name.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-'))
    {
        let mut err = ValidationError::new("event_name_format");
        err.message = Some(
            "Event name may only contain letters, digits, '_', ':', '.' and '-'".into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that a nickname has 1 to 24 characters once surrounding whitespace is removed.
pub fn validate_nickname(nickname: &str) -> Result<(), ValidationError> {
    let length = nickname.trim().chars().count();
    if length == 0 || length > MAX_NICKNAME_LEN {
        let mut err = ValidationError::new("nickname_length");
        err.message = Some(
            format!("Nickname must be 1 to {MAX_NICKNAME_LEN} characters (got {length})").into(),
        );
        return Err(err);
    }

    if nickname.chars().any(char::is_control) {
        let mut err = ValidationError::new("nickname_format");
        err.message = Some("Nickname must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a configured room code: 4 uppercase letters or digits.
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != ROOM_CODE_LEN
        || !code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        let mut err = ValidationError::new("room_code_format");
        err.message = Some(
            format!("Room code must be {ROOM_CODE_LEN} uppercase letters or digits").into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_event_name_valid() {
        assert!(validate_event_name("card-play").is_ok());
        assert!(validate_event_name("room:game-ready").is_ok());
        assert!(validate_event_name("score.update_2").is_ok());
        assert!(validate_event_name(&"a".repeat(MAX_EVENT_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_validate_event_name_invalid_length() {
        assert!(validate_event_name("").is_err());
        assert!(validate_event_name(&"a".repeat(MAX_EVENT_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_event_name_invalid_format() {
        assert!(validate_event_name("bell hit").is_err()); // space
        assert!(validate_event_name("bell/hit").is_err());
        assert!(validate_event_name("cloche-é").is_err()); // non ascii
    }

    #[test]
    fn test_validate_nickname() {
        assert!(validate_nickname("Alice").is_ok());
        assert!(validate_nickname("  Bob  ").is_ok());
        assert!(validate_nickname("ÉloÏse").is_ok());
        assert!(validate_nickname("   ").is_err());
        assert!(validate_nickname("").is_err());
        assert!(validate_nickname(&"x".repeat(MAX_NICKNAME_LEN + 1)).is_err());
        assert!(validate_nickname("tab\there").is_err());
    }

    #[test]
    fn test_validate_room_code() {
        assert!(validate_room_code("AB2C").is_ok());
        assert!(validate_room_code("ab2c").is_err());
        assert!(validate_room_code("ABC").is_err());
        assert!(validate_room_code("ABCDE").is_err());
    }
}
