use sha2::{Digest, Sha256};

pub mod block;
pub mod tx;

/// Writer of the canonical byte encoding shared by hashing and payload measurement.
/// Integers are little endian; variable length fields are prefixed with their length.
pub trait CanonicalWriter {
    fn write_bytes(&mut self, bytes: &[u8]);

    fn write_u8(&mut self, value: u8) -> &mut Self {
        self.write_bytes(&[value]);
        self
    }

    fn write_u32(&mut self, value: u32) -> &mut Self {
        self.write_bytes(&value.to_le_bytes());
        self
    }

    fn write_u64(&mut self, value: u64) -> &mut Self {
        self.write_bytes(&value.to_le_bytes());
        self
    }

    fn write_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_u64(bytes.len() as u64);
        self.write_bytes(bytes);
        self
    }

    fn write_str(&mut self, value: &str) -> &mut Self {
        self.write_var_bytes(value.as_bytes())
    }

    fn write_opt_str(&mut self, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) => self.write_u8(1).write_str(value),
            None => self.write_u8(0),
        }
    }

    /// Writes the decoded bytes of a hex field. Malformed hex is written verbatim so that hashing
    /// stays total; such blocks are rejected by the schema check anyway.
    fn write_hex(&mut self, hex: &str) -> &mut Self {
        match decode_hex(hex) {
            Some(bytes) => self.write_var_bytes(&bytes),
            None => self.write_str(hex),
        }
    }
}

impl CanonicalWriter for Vec<u8> {
    fn write_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

impl CanonicalWriter for Sha256 {
    fn write_bytes(&mut self, bytes: &[u8]) {
        Digest::update(self, bytes);
    }
}

pub fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    let mut bytes = vec![0u8; hex.len() / 2];
    faster_hex::hex_decode(hex.as_bytes(), &mut bytes).ok()?;
    Some(bytes)
}

pub fn is_hex_of_len(value: &str, bytes: usize) -> bool {
    value.len() == bytes * 2 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Derives the decimal id token from a digest: its first 8 bytes read as a little endian u64
pub(crate) fn id_from_digest(digest: &[u8]) -> String {
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(prefix).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_encoding() {
        let mut bytes = Vec::new();
        bytes.write_u8(7).write_u32(1).write_opt_str(None).write_hex("0aff");
        assert_eq!(bytes, vec![7, 1, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0x0a, 0xff]);
    }

    #[test]
    fn test_hex_helpers() {
        assert_eq!(decode_hex("00ff"), Some(vec![0, 255]));
        assert_eq!(decode_hex("0g"), None);
        assert_eq!(decode_hex("abc"), None);
        assert!(is_hex_of_len(&"ab".repeat(32), 32));
        assert!(!is_hex_of_len(&"ab".repeat(31), 32));
        assert!(!is_hex_of_len(&"zz".repeat(32), 32));
    }

    #[test]
    fn test_id_from_digest() {
        assert_eq!(id_from_digest(&[1, 0, 0, 0, 0, 0, 0, 0, 9, 9]), "1");
    }
}
