//! Check instance identity.

use std::fmt;

use xxhash_rust::xxh3::xxh3_64;

/// Identity of one configured check instance.
///
/// Formatted as `<check name>:<16 hex digits>`, the digits being an xxh3
/// digest of the raw instance and init documents. Identical configurations
/// therefore share an id (and a sender).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CheckId(String);

impl CheckId {
    pub fn new(check_name: &str, instance: &str, init_config: &str) -> Self {
        let mut buf = Vec::with_capacity(instance.len() + init_config.len() + 1);
        buf.extend_from_slice(instance.as_bytes());
        buf.push(0);
        buf.extend_from_slice(init_config.as_bytes());
        Self(format!("{}:{:016x}", check_name, xxh3_64(&buf)))
    }

    /// Check name part of the id.
    pub fn check_name(&self) -> &str {
        self.0.rsplit_once(':').map(|(name, _)| name).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        let id = CheckId::new("systemd", "unit_names: [sshd.service]", "");
        let (name, digest) = id.as_str().split_once(':').unwrap();
        assert_eq!(name, "systemd");
        assert_eq!(digest.len(), 16);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id.check_name(), "systemd");
    }

    #[test]
    fn test_stable_for_same_config() {
        let a = CheckId::new("systemd", "unit_regex: ['ok.*']", "{}");
        let b = CheckId::new("systemd", "unit_regex: ['ok.*']", "{}");
        assert_eq!(a, b);
    }

    #[test]
    fn test_differs_between_configs() {
        let a = CheckId::new("systemd", "unit_names: [a]", "");
        let b = CheckId::new("systemd", "unit_names: [b]", "");
        assert_ne!(a, b);
    }

    #[test]
    fn test_documents_do_not_bleed_into_each_other() {
        let a = CheckId::new("systemd", "ab", "");
        let b = CheckId::new("systemd", "a", "b");
        assert_ne!(a, b);
    }
}
