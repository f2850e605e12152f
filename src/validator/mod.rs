//! Address syntax validation, the first and cheapest pipeline stage.
//!
//! [`validate`] is the typed entry point used by the pipeline; it never touches
//! the network. [`validate_email`] exposes the full list of reasons for
//! callers that want to display them.

mod domain;
mod local;
mod types;

pub use types::{EmailAddress, SyntaxError, ValidationMode, ValidationReport};

use unicode_normalization::UnicodeNormalization;

use domain::{check_domain, normalize_domain};
use local::{is_local_relaxed, is_local_strict, is_quoted};

/// Validates `raw` and returns the normalized address.
pub fn validate(raw: &str, mode: ValidationMode) -> Result<EmailAddress, SyntaxError> {
    let report = validate_email(raw, mode);
    if !report.ok {
        return Err(SyntaxError::invalid(report.reasons));
    }

    let (local, domain) = split_address(raw.trim(), mode)
        .ok_or_else(|| SyntaxError::invalid(vec!["must contain exactly one '@'".to_string()]))?;
    let (domain_lower, ascii_domain) = normalize_domain(domain);
    if ascii_domain.is_empty() {
        return Err(SyntaxError::invalid(vec![
            "domain punycode conversion failed".to_string(),
        ]));
    }

    Ok(EmailAddress::new(
        local.nfc().collect(),
        domain_lower,
        ascii_domain,
    ))
}

pub fn validate_email(email: &str, mode: ValidationMode) -> ValidationReport {
    let input = email.trim();

    let mut reasons = Vec::new();

    if input.len() > 254 {
        reasons.push(format!("total length {} > 254", input.len()));
    }

    let Some((local, domain)) = split_address(input, mode) else {
        reasons.push("must contain exactly one '@'".to_string());
        return ValidationReport { ok: false, reasons };
    };
    let local: String = local.nfc().collect();

    if local.is_empty() || local.len() > 64 {
        reasons.push(format!(
            "local part length {} invalid (1..=64)",
            local.len()
        ));
    }

    if domain.is_empty() {
        reasons.push("domain part is empty".to_string());
    } else {
        check_domain(&domain.to_lowercase(), &mut reasons);
    }

    let local_ok = match mode {
        ValidationMode::Strict => is_local_strict(&local),
        ValidationMode::Relaxed => is_local_relaxed(&local),
    };
    if !local.is_empty() && !local_ok {
        reasons.push(match mode {
            ValidationMode::Strict => "invalid local part (strict rules)".into(),
            ValidationMode::Relaxed => "invalid local part (relaxed rules)".into(),
        });
    }

    let ok = reasons.is_empty();
    ValidationReport { ok, reasons }
}

/// Splits on the last '@'. A second '@' is only tolerated inside a quoted
/// local part in relaxed mode.
fn split_address(input: &str, mode: ValidationMode) -> Option<(&str, &str)> {
    let (local, domain) = input.rsplit_once('@')?;
    let quoted = mode == ValidationMode::Relaxed && is_quoted(local);
    if local.contains('@') && !quoted {
        return None;
    }
    Some((local, domain))
}
