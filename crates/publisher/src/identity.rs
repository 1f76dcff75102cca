use std::fmt;

use serde::Serialize;
use uuid::Uuid;

pub const DEFAULT_CLIENT_ID_PREFIX: &str = "scratch";
const SUFFIX_LEN: usize = 8;

/// Per-session broker identity: a readable prefix plus 8 random hex digits.
/// Generated once at startup and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn generate(prefix: &str) -> Self {
        let random = Uuid::new_v4().simple().to_string();
        let suffix = &random[..SUFFIX_LEN];
        let prefix = prefix.trim();
        if prefix.is_empty() {
            ClientId(suffix.to_string())
        } else {
            ClientId(format!("{prefix}_{suffix}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn suffix(&self) -> &str {
        &self.0[self.0.len() - SUFFIX_LEN..]
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_has_prefix_and_hex_suffix() {
        let id = ClientId::generate(DEFAULT_CLIENT_ID_PREFIX);
        assert!(id.as_str().starts_with("scratch_"));
        assert_eq!(id.suffix().len(), 8);
        assert!(id.suffix().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn empty_prefix_yields_bare_suffix() {
        let id = ClientId::generate("  ");
        assert_eq!(id.as_str().len(), 8);
        assert_eq!(id.as_str(), id.suffix());
    }

    #[test]
    fn ids_differ_between_sessions() {
        assert_ne!(ClientId::generate("neo"), ClientId::generate("neo"));
    }
}
