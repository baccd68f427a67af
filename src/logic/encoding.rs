use anyhow::{anyhow, Result};
use base64::{engine::general_purpose, Engine as _};

use crate::models::{LeafValue, SecretsEncoding};

pub fn decode_plaintext(leaf: &LeafValue, encoding: SecretsEncoding) -> Result<String> {
    match encoding {
        SecretsEncoding::Plain => Ok(leaf.value.clone()),
        SecretsEncoding::Base64 => {
            // Wrapped base64 from `base64 -w 76` style tools
            let clean: String = leaf.value.split_whitespace().collect();
            let bytes = general_purpose::STANDARD
                .decode(&clean)
                .map_err(|e| anyhow!("Secret '{}' is not valid base64: {}", leaf.leaf, e))?;
            String::from_utf8(bytes).map_err(|_| anyhow!("Secret '{}' does not decode to UTF-8 text", leaf.leaf))
        }
    }
}
