use std::fmt;
use std::str::FromStr;

use crate::util::paths::is_safe_component;

/// Filesystem-safe customer name used as a backup directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Replaces `'`, `"` and spaces with `_`, in that order.
pub fn sanitize_customer(raw: &str) -> String {
    raw.replace('\'', "_").replace('"', "_").replace(' ', "_")
}

impl FromStr for CustomerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sanitized = sanitize_customer(s.trim_end_matches(['\r', '\n']));
        if sanitized.is_empty() {
            return Err("customer name is empty".to_string());
        }
        if !is_safe_component(&sanitized) {
            return Err(format!(
                "customer name {} must not be '.', '..' or contain '/'",
                sanitized
            ));
        }
        Ok(CustomerId(sanitized))
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunMode {
    pub verbose: bool,
}
