use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use mailverify_lib::{MxStatus, Verification};

pub fn human_verification(verification: &Verification) -> String {
    match &verification.rejection {
        None => format!("[{}]   {}", verification.status, verification.input),
        Some(rejection) => format!(
            "[{}] {} :: {rejection}",
            verification.status, verification.input
        ),
    }
}

pub fn human_mx(domain: &str, status: &MxStatus) -> String {
    match status {
        MxStatus::Records(set) => {
            let hosts = set
                .records()
                .iter()
                .map(|r| format!("{}:{}", r.preference, r.exchange))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{domain}: {hosts}")
        }
        MxStatus::Absent(reason) => format!("{domain}: no mail route ({reason})"),
    }
}

/// `[n/total] pct%` line for a progress fraction.
pub fn progress_line(fraction: f64, total: usize) -> String {
    let done = (fraction * total as f64).round() as usize;
    format!("[{done}/{total}] {:.0}%", fraction * 100.0)
}

#[cfg(feature = "with-serde")]
pub fn json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("serializing JSON output")
}

#[cfg(not(feature = "with-serde"))]
pub fn json<T>(_value: &T) -> Result<String> {
    anyhow::bail!("--format json needs the 'with-serde' feature")
}

/// Writes through a sibling temp file so readers never see a partial file.
pub fn write_all_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);
    {
        let mut f = std::fs::File::create(tmp)
            .with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(tmp, path).with_context(|| format!("renaming to {}", path.display()))?;
    Ok(())
}
