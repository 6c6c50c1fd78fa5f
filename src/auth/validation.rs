use lazy_static::lazy_static;
use regex::Regex;

use super::dto::{LoginRequest, RegisterRequest};
use crate::error::ApiError;

pub const MIN_PASSWORD_LEN: usize = 6;

const ALL_FIELDS_REQUIRED: &str = "All fields are required";
const INVALID_EMAIL: &str = "Invalid email";
const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";

/// Registration input after validation; email normalized.
#[derive(Debug)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Blank text counts as absent.
fn text(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Passwords are taken verbatim; only the empty string counts as absent.
fn secret(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

pub fn validate_registration(req: RegisterRequest) -> Result<Registration, ApiError> {
    let (Some(first_name), Some(last_name), Some(email), Some(password)) = (
        text(req.first_name),
        text(req.last_name),
        text(req.email),
        secret(req.password),
    ) else {
        return Err(ApiError::Validation(ALL_FIELDS_REQUIRED));
    };

    if !is_valid_email(&email) {
        return Err(ApiError::Validation(INVALID_EMAIL));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(PASSWORD_TOO_SHORT));
    }

    Ok(Registration {
        first_name,
        last_name,
        email: normalize_email(&email),
        password,
    })
}

pub fn validate_login(req: LoginRequest) -> Result<Credentials, ApiError> {
    let (Some(email), Some(password)) = (text(req.email), secret(req.password)) else {
        return Err(ApiError::Validation(ALL_FIELDS_REQUIRED));
    };
    Ok(Credentials {
        email: normalize_email(&email),
        password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> RegisterRequest {
        RegisterRequest {
            first_name: Some("A".into()),
            last_name: Some("B".into()),
            email: Some("a@b.com".into()),
            password: Some("secret1".into()),
        }
    }

    fn message(err: ApiError) -> String {
        assert!(matches!(err, ApiError::Validation(_)));
        err.to_string()
    }

    #[test]
    fn accepts_complete_payload() {
        let r = validate_registration(full()).unwrap();
        assert_eq!(r.first_name, "A");
        assert_eq!(r.email, "a@b.com");
        assert_eq!(r.password, "secret1");
    }

    #[test]
    fn any_missing_field_is_rejected() {
        let cases: [fn(&mut RegisterRequest); 8] = [
            |r| r.first_name = None,
            |r| r.last_name = None,
            |r| r.email = None,
            |r| r.password = None,
            |r| r.first_name = Some("  ".into()),
            |r| r.last_name = Some(String::new()),
            |r| r.email = Some(String::new()),
            |r| r.password = Some(String::new()),
        ];
        for strip in cases {
            let mut req = full();
            strip(&mut req);
            let err = validate_registration(req).unwrap_err();
            assert_eq!(message(err), "All fields are required");
        }
    }

    #[test]
    fn email_pattern() {
        for ok in ["a@b.com", "first.last+tag@sub.example.org", "X_Y%z-1@host-name.io"] {
            assert!(is_valid_email(ok), "{ok}");
        }
        for bad in ["a@b", "a@b.c", "@b.com", "a b@c.com", "a@b..", "plainaddress", "a@b.c0m"] {
            assert!(!is_valid_email(bad), "{bad}");
        }
    }

    #[test]
    fn invalid_email_is_rejected() {
        let mut req = full();
        req.email = Some("not-an-email".into());
        assert_eq!(message(validate_registration(req).unwrap_err()), "Invalid email");
    }

    #[test]
    fn short_password_is_rejected() {
        let mut req = full();
        req.password = Some("12345".into());
        assert_eq!(
            message(validate_registration(req).unwrap_err()),
            "Password must be at least 6 characters"
        );

        let mut req = full();
        req.password = Some("123456".into());
        assert!(validate_registration(req).is_ok());
    }

    #[test]
    fn email_is_normalized() {
        let mut req = full();
        req.email = Some("  Someone@Example.COM ".into());
        assert_eq!(validate_registration(req).unwrap().email, "someone@example.com");

        let creds = validate_login(LoginRequest {
            email: Some("Someone@Example.com".into()),
            password: Some("pw".into()),
        })
        .unwrap();
        assert_eq!(creds.email, "someone@example.com");
    }

    #[test]
    fn login_requires_both_fields() {
        let missing_pw = LoginRequest {
            email: Some("a@b.com".into()),
            password: None,
        };
        assert_eq!(message(validate_login(missing_pw).unwrap_err()), "All fields are required");
        assert!(validate_login(LoginRequest::default()).is_err());
    }
}
