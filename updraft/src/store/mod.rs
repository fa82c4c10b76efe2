//! Dual-bank image store.
//!
//! The device carries two image banks: the active one it booted from and
//! an inactive one the agent streams the new image into. The store seam
//! covers the full bank lifecycle:
//! - `init` erases the inactive bank and opens a write context
//! - `write_block` appends image chunks at explicit offsets
//! - `verify` streams a SHA-256 over the written image and compares it
//!   against the manifest digest
//! - `enable` marks the verified bank as the next boot target
//! - `abort` discards a partially written bank
//!
//! # Architecture
//!
//! ```text
//! UpdateWorkflow ──► ImageStore (trait) ──► FileImageStore
//!                         │
//!                         └── ImageContext (one in-flight image)
//! ```
//!
//! `enable` is the point of no return: after it succeeds the device will
//! boot the new image, so it refuses any context that has not passed
//! verification.

mod file;

use std::path::PathBuf;

use thiserror::Error;

pub use file::FileImageStore;

/// Errors from the image bank backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Erase/write/read fault on a bank.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The platform exposes no inactive bank to write into.
    #[error("no inactive bank available")]
    NoSecondaryBank,

    /// The written image does not hash to the manifest digest.
    #[error("image digest mismatch: expected {expected}, got {actual}")]
    VerificationFailed { expected: String, actual: String },

    /// The manifest digest is not valid base64 or not a SHA-256 length.
    #[error("malformed image digest: {0}")]
    BadDigest(String),

    /// The context was already consumed by `enable` or `abort`.
    #[error("image context is closed")]
    Closed,

    /// `enable` was called on an image that has not been verified.
    #[error("image has not been verified")]
    NotVerified,
}

/// Which physical bank an image occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankId {
    A,
    B,
}

impl BankId {
    /// The opposite bank.
    pub fn other(self) -> BankId {
        match self {
            BankId::A => BankId::B,
            BankId::B => BankId::A,
        }
    }

    /// Stable name used in bank file names and markers.
    pub fn name(self) -> &'static str {
        match self {
            BankId::A => "a",
            BankId::B => "b",
        }
    }
}

/// Handle to one in-flight image on the inactive bank.
///
/// Created by [`ImageStore::init`] and consumed by `enable` or `abort`.
/// Tracks how many bytes have been written and whether verification has
/// passed, so `enable` can fail closed on unverified images.
#[derive(Debug)]
pub struct ImageContext {
    bank: BankId,
    image_size: u64,
    open: bool,
    verified: bool,
}

impl ImageContext {
    /// Open a context on `bank`. Called by `ImageStore::init`
    /// implementations.
    pub fn new(bank: BankId) -> Self {
        Self {
            bank,
            image_size: 0,
            open: true,
            verified: false,
        }
    }

    /// The bank this image is being written to.
    pub fn bank(&self) -> BankId {
        self.bank
    }

    /// Bytes written so far.
    pub fn image_size(&self) -> u64 {
        self.image_size
    }

    /// Whether the image has passed digest verification.
    pub fn is_verified(&self) -> bool {
        self.verified
    }

    /// Whether the context is still accepting operations.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Account for a block written at `offset`. Called by `write_block`
    /// implementations.
    pub fn record_write(&mut self, offset: u64, len: u64) {
        self.image_size = self.image_size.max(offset + len);
    }

    /// Mark the image digest-verified. Called by `verify` implementations.
    pub fn mark_verified(&mut self) {
        self.verified = true;
    }

    /// Close the context; subsequent operations fail with `Closed`.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Fail with `Closed` if the context has been consumed.
    pub fn ensure_open(&self) -> Result<(), StoreError> {
        if self.open {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }
}

/// Backend seam for the dual-bank image lifecycle.
///
/// One implementation per storage backend; the workflow is generic over
/// this trait so tests can run against an in-memory store.
pub trait ImageStore {
    /// Erase the inactive bank and open a write context on it.
    ///
    /// # Errors
    ///
    /// Fails when no inactive bank exists or the erase faults.
    fn init(&mut self) -> Result<ImageContext, StoreError>;

    /// Capacity of one bank in bytes, for pre-download size gating.
    fn bank_capacity(&self) -> Result<u64, StoreError>;

    /// Write `data` at `offset` within the in-flight image.
    ///
    /// Offsets arrive in increasing order from the downloader; a rewrite
    /// of an earlier offset after a resume is permitted.
    fn write_block(
        &mut self,
        ctx: &mut ImageContext,
        offset: u64,
        data: &[u8],
    ) -> Result<(), StoreError>;

    /// Stream a SHA-256 over the written image and compare it against the
    /// base64-encoded manifest digest.
    ///
    /// A zero-length image fails verification; marks the context verified
    /// on success.
    ///
    /// # Errors
    ///
    /// [`StoreError::VerificationFailed`] on digest mismatch or empty
    /// image, [`StoreError::BadDigest`] when the expected digest is
    /// malformed.
    fn verify(
        &mut self,
        ctx: &mut ImageContext,
        expected_sha256_base64: &str,
    ) -> Result<(), StoreError>;

    /// Mark the verified bank as the next boot target and close the
    /// context. Point of no return.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotVerified`] when called before a successful
    /// `verify`.
    fn enable(&mut self, ctx: &mut ImageContext) -> Result<(), StoreError>;

    /// Discard a partially written image and close the context.
    ///
    /// Infallible by design: abort runs on error paths that already carry
    /// a primary failure.
    fn abort(&mut self, ctx: ImageContext);

    /// Restart the device so the boot loader picks up the enabled bank.
    fn reset_device(&mut self) -> !;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_other_flips() {
        assert_eq!(BankId::A.other(), BankId::B);
        assert_eq!(BankId::B.other(), BankId::A);
        assert_eq!(BankId::A.other().other(), BankId::A);
    }

    #[test]
    fn test_context_starts_open_and_unverified() {
        let ctx = ImageContext::new(BankId::B);
        assert_eq!(ctx.bank(), BankId::B);
        assert_eq!(ctx.image_size(), 0);
        assert!(!ctx.is_verified());
        assert!(ctx.ensure_open().is_ok());
    }
}
