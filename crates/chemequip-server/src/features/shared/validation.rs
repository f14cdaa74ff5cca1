//! Input validation for account and upload fields
//!
//! ```rust,ignore
//! validate_username(&command.username)?;
//! validate_password(&command.password)?;
//! ```

use thiserror::Error;

pub const MAX_USERNAME_LENGTH: usize = 150;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_FILENAME_LENGTH: usize = 255;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsernameValidationError {
    #[error("Username is required and cannot be empty")]
    Required,

    #[error("Username must be at most {max_length} characters")]
    TooLong { max_length: usize },

    #[error("Username may only contain letters, digits and @ . + - _")]
    InvalidFormat,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordValidationError {
    #[error("Password must be at least {min_length} characters")]
    TooShort { min_length: usize },

    #[error("Password must be at most {max_length} characters")]
    TooLong { max_length: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmailValidationError {
    #[error("Email address is invalid")]
    InvalidFormat,

    #[error("Email must be at most {max_length} characters")]
    TooLong { max_length: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilenameValidationError {
    #[error("Filename is required and cannot be empty")]
    Required,

    #[error("Filename must be at most {max_length} characters")]
    TooLong { max_length: usize },
}

/// Letters, digits and `@.+-_`, as accepted by most account systems.
pub fn validate_username(username: &str) -> Result<(), UsernameValidationError> {
    if username.is_empty() {
        return Err(UsernameValidationError::Required);
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(UsernameValidationError::TooLong {
            max_length: MAX_USERNAME_LENGTH,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(UsernameValidationError::InvalidFormat);
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), PasswordValidationError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(PasswordValidationError::TooShort {
            min_length: MIN_PASSWORD_LENGTH,
        });
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(PasswordValidationError::TooLong {
            max_length: MAX_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Shape check only: one `@` with something on both sides and a dot in the
/// domain.
pub fn validate_email(email: &str) -> Result<(), EmailValidationError> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(EmailValidationError::TooLong {
            max_length: MAX_EMAIL_LENGTH,
        });
    }

    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace) =>
        {
            Ok(())
        },
        _ => Err(EmailValidationError::InvalidFormat),
    }
}

/// Reduce a client-supplied filename to its final path component.
///
/// Browsers on some platforms send the full local path; only the last
/// segment is kept, whichever separator was used.
pub fn sanitize_filename(raw: &str) -> Result<String, FilenameValidationError> {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() {
        return Err(FilenameValidationError::Required);
    }

    if name.chars().count() > MAX_FILENAME_LENGTH {
        return Err(FilenameValidationError::TooLong {
            max_length: MAX_FILENAME_LENGTH,
        });
    }

    Ok(name.to_string())
}
