use sha2::{Digest, Sha256};

/// Prefix of every body checksum.
pub(crate) const CHECKSUM_PREFIX: &str = "sha256:";

/// Checksum of a body buffer (`sha256:<hex>`).
pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{}{}", CHECKSUM_PREFIX, hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        assert_eq!(
            checksum(b"abc"),
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn binary_payloads_differ() {
        let a = checksum(b"\x00\x01hello\xffbinary\n");
        let b = checksum(b"\x00\x01hello\xffbinary");
        assert_ne!(a, b);
        assert!(a.starts_with(CHECKSUM_PREFIX));
        assert_eq!(a.len(), CHECKSUM_PREFIX.len() + 64);
    }
}
