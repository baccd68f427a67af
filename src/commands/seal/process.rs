use anyhow::Result;
use std::path::{Path, PathBuf};

use super::types::{SealOutcome, SealerConfig};
use crate::infra::{OracleError, SealingOracle};
use crate::logic::{decode_plaintext, looks_sealed};
use crate::models::{LeafValue, ValuesDocument};
use crate::output;

pub struct SecretSealer<'a, O: SealingOracle> {
    config: &'a SealerConfig,
    oracle: &'a O,
    document: ValuesDocument,
}

impl<'a, O: SealingOracle> SecretSealer<'a, O> {
    pub fn new(config: &'a SealerConfig, oracle: &'a O, values_file: &Path) -> Result<Self> {
        let document = Self::load_values(values_file)?;
        Ok(Self { config, oracle, document })
    }

    pub fn load_values(values_file: &Path) -> Result<ValuesDocument> {
        let document = ValuesDocument::load(values_file)?;
        output::info(format!("Values file '{}' loaded", values_file.display()));
        Ok(document)
    }

    pub fn document(&self) -> &ValuesDocument {
        &self.document
    }

    pub fn seal_secrets(&mut self) -> Result<SealOutcome> {
        let leaves = self.document.leaves()?;
        if leaves.is_empty() {
            output::info("No secrets found to seal");
            return Ok(SealOutcome::NothingToSeal);
        }

        let encoding = self.document.encoding()?;
        output::info(format!(
            "Using certificate file '{}' for encrypting secrets",
            self.config.cert.display()
        ));

        // 1. Skip leaves that already hold kubeseal ciphertext
        let mut skipped = 0;
        let mut pending: Vec<LeafValue> = Vec::new();
        for lv in leaves {
            if looks_sealed(&lv.value) {
                output::debug(format!("'{}' is already sealed, skipping", lv.leaf));
                skipped += 1;
            } else {
                pending.push(lv);
            }
        }

        // 2. Decode everything before the first oracle call
        let mut plaintexts = Vec::with_capacity(pending.len());
        for lv in &pending {
            plaintexts.push(decode_plaintext(lv, encoding)?);
        }

        if self.config.dry_run {
            for lv in &pending {
                output::step(format!("[Dry Run] Would seal secret '{}'", lv.leaf));
            }
            output::info(format!("[Dry Run] {} to seal, {} already sealed", pending.len(), skipped));
            return Ok(SealOutcome::DryRun { pending: pending.len(), skipped });
        }

        // 3. Seal
        for (lv, plaintext) in pending.iter().zip(plaintexts) {
            let leaf = &lv.leaf;
            output::step(format!(
                "Sealing secret '{}, {}, {}'",
                leaf.namespace, leaf.secret_name, leaf.key
            ));

            let sealed = match self.oracle.seal(&self.config.cert, &leaf.namespace, &leaf.secret_name, &plaintext) {
                Ok(s) => s,
                Err(e) => {
                    if let Some(oracle_err) = e.downcast_ref::<OracleError>() {
                        output::info(&oracle_err.stderr);
                    }
                    return Err(e.context(format!("Error sealing secret '{}'. See output above.", leaf)));
                }
            };
            self.document.set_leaf(leaf, sealed)?;
        }

        if pending.is_empty() {
            output::info("All secrets are already sealed");
        }

        // 4. Persist
        self.document.set_sealed()?;
        let written = self.write_new_values()?;
        output::success(format!(
            "Sealed {} secrets into '{}' ({} already sealed)",
            pending.len(),
            written.display(),
            skipped
        ));

        Ok(SealOutcome::Sealed { sealed: pending.len(), skipped, output: written })
    }

    pub fn write_new_values(&self) -> Result<PathBuf> {
        let target = self.config.output.resolve(self.document.path());
        self.document.write(&target)?;
        Ok(target)
    }
}
