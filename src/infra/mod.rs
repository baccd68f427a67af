pub mod fs;
pub mod kubeseal;

pub use kubeseal::{Kubeseal, OracleError, SealingOracle};
