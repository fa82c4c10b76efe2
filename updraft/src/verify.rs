//! Manifest signature verification seam.
//!
//! Update manifests are signed with a JWS envelope chained to a set of
//! trusted root keys. The cryptographic verification itself is a vendor
//! primitive supplied by the hosting application; the workflow only needs a
//! yes/no answer before it will act on an apply request.

use thiserror::Error;

/// Signature verification failure.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The signature envelope is malformed.
    #[error("malformed manifest signature: {0}")]
    Malformed(String),

    /// The signature does not validate against the trusted root keys.
    #[error("manifest signature rejected: {0}")]
    Rejected(String),
}

/// Verifies a detached manifest signature against trusted root keys.
pub trait ManifestVerifier {
    /// Verify `signature` over `manifest`.
    ///
    /// # Errors
    ///
    /// Returns an error when the signature is malformed or does not chain
    /// to a trusted root. The workflow treats any error as a protocol
    /// failure and leaves its state untouched.
    fn verify(&self, manifest: &[u8], signature: &[u8]) -> Result<(), VerifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RejectAll;

    impl ManifestVerifier for RejectAll {
        fn verify(&self, _manifest: &[u8], _signature: &[u8]) -> Result<(), VerifyError> {
            Err(VerifyError::Rejected("untrusted".to_string()))
        }
    }

    #[test]
    fn test_verify_error_display() {
        let verifier = RejectAll;
        let err = verifier.verify(b"manifest", b"sig").unwrap_err();
        assert!(err.to_string().contains("rejected"));
    }
}
