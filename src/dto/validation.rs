//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest entrant name accepted on creation.
pub const MAX_PARTICIPANT_NAME_LEN: usize = 64;

/// Rejects strings made only of whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Entrant names may be missing or blank (they get a placeholder), but not overly long.
pub fn validate_participant_names(names: &[Option<String>]) -> Result<(), ValidationError> {
    let too_long = names
        .iter()
        .position(|name| {
            name.as_deref()
                .is_some_and(|name| name.trim().chars().count() > MAX_PARTICIPANT_NAME_LEN)
        });

    if let Some(index) = too_long {
        let mut err = ValidationError::new("participant_name_length");
        err.message = Some(
            format!(
                "participant #{} exceeds {MAX_PARTICIPANT_NAME_LEN} characters",
                index + 1
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_rejected() {
        assert!(validate_not_blank("Spring Open").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank(" \t ").is_err());
    }

    #[test]
    fn participant_names_allow_gaps() {
        assert!(validate_participant_names(&[Some("Ana".into()), None, Some("  ".into())]).is_ok());
    }

    #[test]
    fn participant_names_have_a_length_cap() {
        let long = "x".repeat(MAX_PARTICIPANT_NAME_LEN + 1);
        assert!(validate_participant_names(&[Some("Ana".into()), Some(long)]).is_err());
    }
}
