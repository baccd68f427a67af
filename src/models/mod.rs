pub mod secrets;
pub mod values;

pub use secrets::*;
pub use values::*;
