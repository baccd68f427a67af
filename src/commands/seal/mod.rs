use anyhow::{anyhow, Result};
use colored::*;
use std::path::{Path, PathBuf};

pub mod process;
pub mod types;

pub use process::SecretSealer;
pub use types::{OutputTarget, SealArgs, SealOutcome, SealerConfig, NEW_VALUES_FILE};

use crate::infra::fs::find_values_files;
use crate::infra::{Kubeseal, SealingOracle};
use crate::output;

pub const USAGE_ERROR: &str = "Error in usage. No cert file passed in.";

impl SealArgs {
    pub fn to_config(&self) -> Result<SealerConfig> {
        let cert = self.cert.as_ref().ok_or_else(|| anyhow!(USAGE_ERROR))?;
        let output = match (&self.output, self.no_overwrite) {
            (Some(path), _) => {
                if self.scan.is_some() {
                    return Err(anyhow!("--output cannot be combined with --scan"));
                }
                OutputTarget::Path(PathBuf::from(path))
            }
            (None, true) => OutputTarget::NewValuesFile,
            (None, false) => OutputTarget::Overwrite,
        };
        Ok(SealerConfig { cert: PathBuf::from(cert), output, dry_run: self.dry_run })
    }
}

pub fn run(args: SealArgs) -> Result<()> {
    output::set_debug(args.debug);

    let config = args.to_config()?;
    let oracle = Kubeseal::new(args.kubeseal.clone());
    output::debug(format!("Using oracle binary '{}'", oracle.bin()));

    match &args.scan {
        Some(root) => run_scan(Path::new(root), &args.values_file, &config, &oracle).map(|_| ()),
        None => {
            let mut sealer = SecretSealer::new(&config, &oracle, Path::new(&args.values_file))?;
            sealer.seal_secrets()?;
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub sealed: usize,
    pub dry_run: usize,
    pub nothing_to_seal: usize,
}

pub fn run_scan<O: SealingOracle>(root: &Path, values_file: &str, config: &SealerConfig, oracle: &O) -> Result<ScanSummary> {
    let file_name = Path::new(values_file)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Invalid values file name '{}'", values_file))?;

    output::info(format!("Scanning for '{}' files in {:?}...", file_name, root));
    let files = find_values_files(root, file_name)?;
    if files.is_empty() {
        output::warn(format!("No '{}' files found under {:?}", file_name, root));
        return Ok(ScanSummary::default());
    }

    let mut sealed_files = 0;
    let mut dry_run_files = 0;
    let mut skipped_files = 0;
    for path in &files {
        output::info(format!("\n{}", path.display().to_string().bold()));
        let mut sealer = SecretSealer::new(config, oracle, path)?;
        match sealer.seal_secrets()? {
            SealOutcome::Sealed { .. } => sealed_files += 1,
            SealOutcome::DryRun { .. } => dry_run_files += 1,
            SealOutcome::NothingToSeal => skipped_files += 1,
        }
    }

    output::info(format!("\n{}", "Scan Summary:".bold()));
    if config.dry_run {
        output::step(format!("[Dry Run] Would seal: {}", dry_run_files));
    } else {
        output::step(format!("Sealed: {}", sealed_files));
    }
    output::step(format!("Nothing to seal: {}", skipped_files));
    Ok(ScanSummary { sealed: sealed_files, dry_run: dry_run_files, nothing_to_seal: skipped_files })
}
