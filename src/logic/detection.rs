use base64::{engine::general_purpose, Engine as _};

// kubeseal envelope: u16 BE length | RSA-OAEP session key | AES-GCM payload
const RSA_BLOCK_SIZES: [usize; 4] = [128, 256, 384, 512];
const GCM_TAG_LEN: usize = 16;

pub fn looks_sealed(value: &str) -> bool {
    let bytes = match general_purpose::STANDARD.decode(value.trim()) {
        Ok(b) => b,
        Err(_) => return false,
    };
    if std::str::from_utf8(&bytes).is_ok() {
        return false;
    }
    if bytes.len() < 2 {
        return false;
    }
    let rsa_len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    RSA_BLOCK_SIZES.contains(&rsa_len) && bytes.len() >= 2 + rsa_len + GCM_TAG_LEN
}
