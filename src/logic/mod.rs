pub mod detection;
pub mod encoding;

pub use detection::looks_sealed;
pub use encoding::decode_plaintext;
