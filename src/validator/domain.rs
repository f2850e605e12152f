const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Checks the domain after IDNA conversion and pushes every problem found
/// into `reasons`.
pub(crate) fn check_domain(domain: &str, reasons: &mut Vec<String>) {
    let Ok(ascii) = idna::domain_to_ascii(domain) else {
        reasons.push("domain punycode conversion failed".to_string());
        return;
    };
    if ascii.is_empty() {
        reasons.push("domain empty after IDNA conversion".to_string());
        return;
    }

    if ascii.len() > MAX_DOMAIN_LEN {
        reasons.push(format!("domain length {} > {MAX_DOMAIN_LEN}", ascii.len()));
    }
    if !ascii.contains('.') {
        reasons.push("domain must contain at least one dot".to_string());
    }
    reasons.extend(ascii.split('.').filter_map(label_problem));

    let tld = ascii.rsplit('.').next().unwrap_or_default();
    if !tld.is_empty() && tld.bytes().all(|b| b.is_ascii_digit()) {
        reasons.push(format!("top-level domain '{tld}' cannot be numeric"));
    }
}

fn label_problem(label: &str) -> Option<String> {
    if label.is_empty() {
        Some("empty domain label".to_string())
    } else if label.len() > MAX_LABEL_LEN {
        Some(format!(
            "domain label '{label}' length {} > {MAX_LABEL_LEN}",
            label.len()
        ))
    } else if label.starts_with('-') || label.ends_with('-') {
        Some(format!("domain label '{label}' cannot start/end with '-'"))
    } else if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        Some(format!("domain label '{label}' has invalid chars"))
    } else {
        None
    }
}

/// Returns `(lowercased unicode domain, ascii domain)`. The ASCII form is
/// empty when IDNA conversion fails.
pub(crate) fn normalize_domain(domain: &str) -> (String, String) {
    let lower = domain.trim().to_lowercase();
    let ascii = idna::domain_to_ascii(&lower).unwrap_or_default();
    (lower, ascii)
}
