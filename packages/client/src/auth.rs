//! Login and registration payloads with local validation.
//!
//! Validation mirrors the sign-in and sign-up forms: fields are trimmed,
//! e-mails must look like an address, names are 1-128 characters and
//! passwords 6-12 characters.

use regex::Regex;
use serde::Serialize;

/// Longest accepted name or e-mail.
pub const MAX_TEXT_LEN: usize = 128;
/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;
/// Longest accepted password.
pub const MAX_PASSWORD_LEN: usize = 12;

/// A credential field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// The e-mail is not a valid address.
    #[error("Invalid e-mail address")]
    InvalidEmail,

    /// A field is shorter than allowed.
    #[error("{field} must have at least {min} characters")]
    TooShort {
        /// Field name.
        field: &'static str,
        /// Minimum length.
        min: usize,
    },

    /// A field is longer than allowed.
    #[error("{field} must have at most {max} characters")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum length.
        max: usize,
    },
}

/// Credentials for `POST auth/login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    /// Account e-mail, sent as `username`.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Body of `POST auth/login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    /// Account e-mail.
    pub username: &'a str,
    /// Password.
    pub password: &'a str,
}

impl LoginCredentials {
    /// Checks the credentials.
    ///
    /// # Errors
    ///
    /// Returns the first [`CredentialError`] found.
    pub fn validate(&self) -> Result<(), CredentialError> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }

    /// Request body with trimmed fields.
    #[must_use]
    pub fn to_request(&self) -> LoginRequest<'_> {
        LoginRequest {
            username: self.email.trim(),
            password: self.password.trim(),
        }
    }
}

/// Account data for `POST usuarios`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Display name.
    pub name: String,
    /// Account e-mail.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Body of `POST usuarios`. The backend uses Portuguese field names.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    /// Display name.
    pub nome: &'a str,
    /// Account e-mail.
    pub email: &'a str,
    /// Password.
    pub senha: &'a str,
}

impl Registration {
    /// Checks the registration.
    ///
    /// # Errors
    ///
    /// Returns the first [`CredentialError`] found.
    pub fn validate(&self) -> Result<(), CredentialError> {
        check_length("name", self.name.trim(), 1, MAX_TEXT_LEN)?;
        validate_email(&self.email)?;
        validate_password(&self.password)
    }

    /// Request body with trimmed fields.
    #[must_use]
    pub fn to_request(&self) -> RegisterRequest<'_> {
        RegisterRequest {
            nome: self.name.trim(),
            email: self.email.trim(),
            senha: self.password.trim(),
        }
    }
}

fn validate_email(email: &str) -> Result<(), CredentialError> {
    let email = email.trim();
    check_length("e-mail", email, 1, MAX_TEXT_LEN)?;

    let re = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|_| unreachable!());
    if re.is_match(email) {
        Ok(())
    } else {
        Err(CredentialError::InvalidEmail)
    }
}

fn validate_password(password: &str) -> Result<(), CredentialError> {
    check_length(
        "password",
        password.trim(),
        MIN_PASSWORD_LEN,
        MAX_PASSWORD_LEN,
    )
}

fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), CredentialError> {
    let len = value.chars().count();
    if len < min {
        Err(CredentialError::TooShort { field, min })
    } else if len > max {
        Err(CredentialError::TooLong { field, max })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login(email: &str, password: &str) -> LoginCredentials {
        LoginCredentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn accepts_valid_login() {
        assert_eq!(login(" john@example.com ", "123456").validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_email() {
        assert_eq!(
            login("john", "123456").validate(),
            Err(CredentialError::InvalidEmail)
        );
        assert_eq!(
            login("", "123456").validate(),
            Err(CredentialError::TooShort {
                field: "e-mail",
                min: 1
            })
        );
    }

    #[test]
    fn enforces_password_bounds() {
        assert_eq!(
            login("john@example.com", "12345").validate(),
            Err(CredentialError::TooShort {
                field: "password",
                min: MIN_PASSWORD_LEN
            })
        );
        assert_eq!(
            login("john@example.com", "1234567890123").validate(),
            Err(CredentialError::TooLong {
                field: "password",
                max: MAX_PASSWORD_LEN
            })
        );
    }

    #[test]
    fn registration_requires_name() {
        let registration = Registration {
            name: "   ".to_string(),
            email: "jane@example.com".to_string(),
            password: "654321".to_string(),
        };
        assert_eq!(
            registration.validate(),
            Err(CredentialError::TooShort {
                field: "name",
                min: 1
            })
        );
    }

    #[test]
    fn registration_body_uses_backend_field_names() {
        let registration = Registration {
            name: " Jane ".to_string(),
            email: "jane@example.com".to_string(),
            password: "654321".to_string(),
        };
        let body = serde_json::to_value(registration.to_request()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "nome": "Jane", "email": "jane@example.com", "senha": "654321" })
        );
    }
}
