use clap::Args;
use std::path::{Path, PathBuf};

pub const NEW_VALUES_FILE: &str = "new_values.yaml";

#[derive(Args, Clone, Debug)]
pub struct SealArgs {
    #[arg(value_name = "CERT_FILE", help = "Sealed-secrets controller certificate used to seal values")]
    pub cert: Option<String>,

    #[arg(long, env = "SEAL_VALUES_FILE", default_value = "values.yaml")]
    pub values_file: String,

    #[arg(long, env = "SEAL_OUTPUT", conflicts_with = "no_overwrite", help = "Write the sealed document here instead of overwriting")]
    pub output: Option<String>,

    #[arg(long, env = "SEAL_NO_OVERWRITE", help = "Write new_values.yaml next to the values file instead of overwriting it")]
    pub no_overwrite: bool,

    #[arg(long, env = "KUBESEAL_BIN", default_value = "kubeseal")]
    pub kubeseal: String,

    #[arg(long, value_name = "DIR", help = "Seal every values file found under DIR")]
    pub scan: Option<String>,

    #[arg(long, help = "List the secrets that would be sealed without sealing or writing")]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose debug logging")]
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Overwrite,
    NewValuesFile,
    Path(PathBuf),
}

impl OutputTarget {
    pub fn resolve(&self, values_file: &Path) -> PathBuf {
        match self {
            OutputTarget::Overwrite => values_file.to_path_buf(),
            OutputTarget::NewValuesFile => values_file.with_file_name(NEW_VALUES_FILE),
            OutputTarget::Path(p) => p.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SealerConfig {
    pub cert: PathBuf,
    pub output: OutputTarget,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SealOutcome {
    NothingToSeal,
    DryRun { pending: usize, skipped: usize },
    Sealed { sealed: usize, skipped: usize, output: PathBuf },
}
