//! Secret redaction for startup logging.
//!
//! The serve command logs its effective configuration once at boot; provider
//! keys go through here first.

/// Mask a secret, keeping a short prefix as a which-key-is-this hint.
pub fn redact_secret(secret: &str) -> String {
    if secret.len() > 4 {
        format!("{}***", &secret[..4])
    } else {
        "***".to_string()
    }
}

/// Mask an optional secret; `None` renders as "unset".
pub fn redact_opt(secret: Option<&str>) -> String {
    match secret {
        Some(s) if !s.is_empty() => redact_secret(s),
        _ => "unset".to_string(),
    }
}
