//! Password obfuscation for client accounts.
//!
//! This is base64, not a KDF. The store runs on a clinic-local machine and
//! the encoding only keeps casual shoulder-surfing out of the raw document;
//! it matches what existing exported bundles already contain.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

pub fn hash_password(plain: &str) -> String {
    STANDARD.encode(plain.as_bytes())
}

pub fn verify_password(plain: &str, stored: &str) -> bool {
    hash_password(plain) == stored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_matches_only_the_original() {
        let stored = hash_password("s3cret");
        assert!(verify_password("s3cret", &stored));
        assert!(!verify_password("S3cret", &stored));
        assert!(!verify_password("", &stored));
    }

    #[test]
    fn encoding_is_stable() {
        // Bundles written by older installs must keep verifying
        assert_eq!(hash_password("1234"), "MTIzNA==");
    }
}
