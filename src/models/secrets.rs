use serde::{Deserialize, Serialize};
use std::fmt;

pub const GLOBAL_KEY: &str = "global";
pub const SECRETS_KEY: &str = "secrets";
pub const SEALED_SECRETS_VAR: &str = "sealedSecrets";
pub const SECRETS_ENCODING_VAR: &str = "secretsEncoding";

/// How plaintext leaves are stored before sealing.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecretsEncoding {
    #[default]
    Base64,
    Plain,
}

/// Address of one leaf in `global.secrets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretLeaf {
    pub namespace: String,
    pub secret_name: String,
    pub key: String,
}

impl SecretLeaf {
    pub fn new(namespace: &str, secret_name: &str, key: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            secret_name: secret_name.to_string(),
            key: key.to_string(),
        }
    }
}

impl fmt::Display for SecretLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.secret_name, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_marker_parsing() {
        let enc: SecretsEncoding = serde_yaml::from_str("plain").unwrap();
        assert_eq!(enc, SecretsEncoding::Plain);
        let enc: SecretsEncoding = serde_yaml::from_str("base64").unwrap();
        assert_eq!(enc, SecretsEncoding::Base64);
        assert!(serde_yaml::from_str::<SecretsEncoding>("hex").is_err());
    }

    #[test]
    fn test_leaf_display() {
        let leaf = SecretLeaf::new("test-ns", "test-secret", "valueone");
        assert_eq!(leaf.to_string(), "test-ns/test-secret/valueone");
    }
}
