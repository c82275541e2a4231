//! Permission decoding.
//!
//! Translates an octal-like permission encoding into owner/group/other
//! read-write-execute triads. Decoding is best-effort and total: malformed
//! input yields `None` (rendered as `"unset"`), never an error.

/// Placeholder rendered for missing or undecodable permissions.
pub const PERM_UNSET: &str = "unset";

/// Decode an octal permission string into a 9-character `rwx` triad.
///
/// Only the last three characters are significant ("0644" and "644" decode
/// alike). Input that does not parse as octal is retried as decimal, which
/// tolerates sources that stored the digits as plain numbers.
pub fn octal_to_rwx(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let tail: String = {
        let chars: Vec<char> = s.chars().collect();
        chars[chars.len().saturating_sub(3)..].iter().collect()
    };
    let n = u32::from_str_radix(&tail, 8)
        .or_else(|_| tail.parse::<u32>())
        .ok()?;

    let triads = [(n / 64) % 8, (n / 8) % 8, n % 8];
    let mut out = String::with_capacity(9);
    for v in triads {
        out.push(if v & 4 != 0 { 'r' } else { '-' });
        out.push(if v & 2 != 0 { 'w' } else { '-' });
        out.push(if v & 1 != 0 { 'x' } else { '-' });
    }
    Some(out)
}

/// Decode permissions for display, falling back to [`PERM_UNSET`].
pub fn rwx_display(raw: Option<&str>) -> String {
    raw.and_then(octal_to_rwx)
        .unwrap_or_else(|| PERM_UNSET.to_string())
}

/// Check whether the "other" triad has the write bit set.
pub fn world_writable(raw: Option<&str>) -> bool {
    raw.and_then(octal_to_rwx)
        .is_some_and(|rwx| rwx[6..].contains('w'))
}

/// Check whether the "other" triad has the read bit set.
///
/// Callers wanting the world-writable/world-readable precedence must guard
/// on [`world_writable`] first; the two are intentionally mutually
/// exclusive in scoring.
pub fn world_readable(raw: Option<&str>) -> bool {
    raw.and_then(octal_to_rwx)
        .is_some_and(|rwx| rwx[6..].contains('r'))
}
