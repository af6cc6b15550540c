//! Permission extraction from `manifest.json` text.
//!
//! The permissions array is located by literal scanning, not JSON parsing:
//! first `"permissions"` key, then the next `[`, then the next `]`. Arrays
//! with nested brackets or `]` inside a string literal are cut short at the
//! first `]`.

use once_cell::sync::Lazy;
use regex::Regex;

const PERMISSIONS_KEY: &str = "\"permissions\"";

/// Permissions that grant broad access to browsing data or the host.
pub const SENSITIVE_PERMISSIONS: &[&str] = &[
    "webRequest",
    "webRequestBlocking",
    "clipboardRead",
    "clipboardWrite",
    "nativeMessaging",
    "proxy",
    "debugger",
    "downloads",
    "management",
    "history",
    "cookies",
    "bookmarks",
];

static QUOTED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).unwrap());

/// Return the raw `[...]` block following the first `"permissions"` key.
pub fn extract_permissions(manifest: &str) -> Option<&str> {
    let key = manifest.find(PERMISSIONS_KEY)?;
    let open = key + manifest[key..].find('[')?;
    let close = open + manifest[open..].find(']')?;
    Some(&manifest[open..=close])
}

/// Quoted names inside an extracted permissions block, in order.
pub fn permission_names(block: &str) -> Vec<&str> {
    QUOTED_RE
        .captures_iter(block)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
        .collect()
}

/// Names from the block that appear in [`SENSITIVE_PERMISSIONS`], deduplicated.
pub fn flag_sensitive(block: &str) -> Vec<String> {
    let mut flagged: Vec<String> = Vec::new();
    for name in permission_names(block) {
        if SENSITIVE_PERMISSIONS.contains(&name) && !flagged.iter().any(|f| f == name) {
            flagged.push(name.to_string());
        }
    }
    flagged
}
