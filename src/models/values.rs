use anyhow::{anyhow, Context, Result};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

use super::secrets::{
    SecretLeaf, SecretsEncoding, GLOBAL_KEY, SEALED_SECRETS_VAR, SECRETS_ENCODING_VAR, SECRETS_KEY,
};

/// A leaf from `global.secrets` together with its stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafValue {
    pub leaf: SecretLeaf,
    pub value: String,
}

/// A Helm values document held as an ordered YAML tree.
#[derive(Debug, Clone)]
pub struct ValuesDocument {
    path: PathBuf,
    root: Value,
}

impl ValuesDocument {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!("Values file '{}' not found", path.display()));
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read values file '{}'", path.display()))?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(content)
            .with_context(|| format!("Failed to parse values file '{}'", path.display()))?;
        match root {
            Value::Mapping(_) | Value::Null => {}
            _ => return Err(anyhow!("Values file '{}' must contain a mapping at the top level", path.display())),
        }
        Ok(Self { path: path.to_path_buf(), root })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    fn global(&self) -> Result<Option<&Mapping>> {
        match self.root.get(GLOBAL_KEY) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Mapping(m)) => Ok(Some(m)),
            Some(_) => Err(anyhow!("'{}' in '{}' must be a mapping", GLOBAL_KEY, self.path.display())),
        }
    }

    pub fn encoding(&self) -> Result<SecretsEncoding> {
        let marker = match self.global()? {
            Some(global) => global.get(SECRETS_ENCODING_VAR),
            None => None,
        };
        match marker {
            None | Some(Value::Null) => Ok(SecretsEncoding::default()),
            Some(v) => serde_yaml::from_value(v.clone()).map_err(|_| {
                anyhow!(
                    "Unsupported {}.{} value {:?} (expected 'base64' or 'plain')",
                    GLOBAL_KEY,
                    SECRETS_ENCODING_VAR,
                    v
                )
            }),
        }
    }

    /// The `global.secrets` mapping, or `None` when it is absent or empty.
    pub fn secrets(&self) -> Result<Option<&Mapping>> {
        let secrets = match self.global()? {
            Some(global) => global.get(SECRETS_KEY),
            None => None,
        };

        match secrets {
            Some(Value::Mapping(m)) if !m.is_empty() => Ok(Some(m)),
            Some(Value::Mapping(_)) | Some(Value::Null) => Ok(None),
            Some(_) => Err(anyhow!(
                "'{}.{}' in '{}' must be a mapping",
                GLOBAL_KEY,
                SECRETS_KEY,
                self.path.display()
            )),
            None => {
                if self.root.get(SECRETS_KEY).is_some() {
                    return Err(anyhow!(
                        "Values file '{}' has a top-level '{}' mapping. Move it under '{}.{}' and re-run.",
                        self.path.display(),
                        SECRETS_KEY,
                        GLOBAL_KEY,
                        SECRETS_KEY
                    ));
                }
                Ok(None)
            }
        }
    }

    /// Every non-null leaf under `global.secrets`, in document order.
    pub fn leaves(&self) -> Result<Vec<LeafValue>> {
        let mut out = Vec::new();
        let Some(secrets) = self.secrets()? else {
            return Ok(out);
        };

        for (ns_key, ns_val) in secrets {
            let namespace = key_name(ns_key, "namespace")?;
            let Some(secret_map) = as_mapping(ns_val, &namespace)? else {
                continue;
            };
            for (secret_key, secret_val) in secret_map {
                let secret_name = key_name(secret_key, "secret name")?;
                let path = format!("{}/{}", namespace, secret_name);
                let Some(keys) = as_mapping(secret_val, &path)? else {
                    continue;
                };
                for (k, v) in keys {
                    let key = key_name(k, "key")?;
                    let leaf = SecretLeaf::new(&namespace, &secret_name, &key);
                    match v {
                        Value::Null => continue,
                        Value::String(s) => out.push(LeafValue { leaf, value: s.clone() }),
                        _ => return Err(anyhow!("Value at '{}' must be a string", leaf)),
                    }
                }
            }
        }
        Ok(out)
    }

    pub fn set_leaf(&mut self, leaf: &SecretLeaf, value: String) -> Result<()> {
        let slot = self
            .root
            .get_mut(GLOBAL_KEY)
            .and_then(|g| g.get_mut(SECRETS_KEY))
            .and_then(|s| s.as_mapping_mut())
            .and_then(|m| entry_mut(m, &leaf.namespace))
            .and_then(|n| n.as_mapping_mut())
            .and_then(|m| entry_mut(m, &leaf.secret_name))
            .and_then(|s| s.as_mapping_mut())
            .and_then(|m| entry_mut(m, &leaf.key))
            .ok_or_else(|| anyhow!("Secret '{}' not found in values document", leaf))?;
        *slot = Value::String(value);
        Ok(())
    }

    pub fn set_sealed(&mut self) -> Result<()> {
        let global = self
            .root
            .get_mut(GLOBAL_KEY)
            .and_then(|g| g.as_mapping_mut())
            .ok_or_else(|| anyhow!("'{}' mapping missing from values document", GLOBAL_KEY))?;
        global.insert(Value::String(SEALED_SECRETS_VAR.to_string()), Value::Bool(true));
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(&self.root).map_err(|e| anyhow!("Failed to serialize values: {}", e))
    }

    pub fn write(&self, target: &Path) -> Result<()> {
        let content = self.to_yaml()?;
        crate::infra::fs::write_atomic(target, &content, &self.path)
            .with_context(|| format!("Unable to write new values file '{}'", target.display()))
    }
}

fn key_name(key: &Value, what: &str) -> Result<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(anyhow!("Unsupported {} key {:?} in secrets", what, key)),
    }
}

fn as_mapping<'a>(value: &'a Value, path: &str) -> Result<Option<&'a Mapping>> {
    match value {
        Value::Null => Ok(None),
        Value::Mapping(m) => Ok(Some(m)),
        _ => Err(anyhow!("Expected a mapping at '{}' in secrets", path)),
    }
}

fn entry_mut<'a>(map: &'a mut Mapping, name: &str) -> Option<&'a mut Value> {
    map.iter_mut()
        .find(|(k, _)| key_name(k, "").map(|k| k == name).unwrap_or(false))
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "
global:
  sealedSecrets: false
  secrets:
    test-ns:
      test-secret:
        valueone: VGhpcyBpcyBhIHRlc3Q=
        valuetwo: dGVzdDI=
        empty: null
";

    fn doc(content: &str) -> ValuesDocument {
        ValuesDocument::parse(Path::new("values.yaml"), content).unwrap()
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("values.yaml");
        let err = ValuesDocument::load(&missing).unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(err.to_string().contains("values.yaml"));
    }

    #[test]
    fn test_leaves_skip_null() {
        let leaves = doc(VALID).leaves().unwrap();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].leaf, SecretLeaf::new("test-ns", "test-secret", "valueone"));
        assert_eq!(leaves[0].value, "VGhpcyBpcyBhIHRlc3Q=");
        assert_eq!(leaves[1].leaf.key, "valuetwo");
    }

    #[test]
    fn test_empty_or_absent_secrets() {
        assert!(doc("global:\n  sealedSecrets: false\n  secrets: {}\n").secrets().unwrap().is_none());
        assert!(doc("global:\n  secrets:\n").secrets().unwrap().is_none());
        assert!(doc("image: nginx\n").secrets().unwrap().is_none());
        assert!(doc("").secrets().unwrap().is_none());
    }

    #[test]
    fn test_legacy_top_level_secrets_rejected() {
        let d = doc("secrets:\n  ns:\n    s:\n      k: dg==\n");
        let err = d.secrets().unwrap_err().to_string();
        assert!(err.contains("global.secrets"), "{}", err);
    }

    #[test]
    fn test_non_string_leaf_rejected() {
        let d = doc("global:\n  secrets:\n    ns:\n      s:\n        port: 5432\n");
        let err = d.leaves().unwrap_err().to_string();
        assert!(err.contains("ns/s/port"), "{}", err);
    }

    #[test]
    fn test_encoding_marker() {
        assert_eq!(doc(VALID).encoding().unwrap(), SecretsEncoding::Base64);
        let plain = doc("global:\n  secretsEncoding: plain\n  secrets: {}\n");
        assert_eq!(plain.encoding().unwrap(), SecretsEncoding::Plain);
        let bad = doc("global:\n  secretsEncoding: rot13\n");
        assert!(bad.encoding().is_err());
    }

    #[test]
    fn test_set_leaf_and_flag_preserve_order() {
        let mut d = doc("image: nginx\nglobal:\n  sealedSecrets: false\n  secrets:\n    ns:\n      s:\n        a: YQ==\n        b: Yg==\nreplicas: 2\n");
        d.set_leaf(&SecretLeaf::new("ns", "s", "a"), "sealed-a".to_string()).unwrap();
        d.set_sealed().unwrap();

        let out = d.to_yaml().unwrap();
        assert_eq!(
            out,
            "image: nginx\nglobal:\n  sealedSecrets: true\n  secrets:\n    ns:\n      s:\n        a: sealed-a\n        b: Yg==\nreplicas: 2\n"
        );
    }

    #[test]
    fn test_set_leaf_missing() {
        let mut d = doc(VALID);
        assert!(d.set_leaf(&SecretLeaf::new("other", "s", "k"), "x".into()).is_err());
    }

    #[test]
    fn test_write_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.yaml");
        fs::write(&path, VALID).unwrap();

        let d = ValuesDocument::load(&path).unwrap();
        let out = dir.path().join("new_values.yaml");
        d.write(&out).unwrap();

        let reread = ValuesDocument::load(&out).unwrap();
        assert_eq!(reread.root(), d.root());
    }
}
