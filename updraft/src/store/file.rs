//! File-backed dual-bank store.
//!
//! Models the two flash banks as plain files under a root directory:
//!
//! ```text
//! <root>/bank_a.img    image contents of bank A
//! <root>/bank_b.img    image contents of bank B
//! <root>/active_bank   name of the bank the device booted from
//! <root>/next_boot     name of the bank to boot next, written by enable
//! ```
//!
//! Verification reads the written image back from disk rather than hashing
//! write buffers, so it checks what the bank actually holds.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};

use super::{BankId, ImageContext, ImageStore, StoreError};

/// Default capacity of one bank in bytes.
pub const DEFAULT_BANK_CAPACITY: u64 = 4 * 1024 * 1024;

const READ_BUFFER_SIZE: usize = 32 * 1024;

/// [`ImageStore`] backed by files under a root directory.
pub struct FileImageStore {
    root: PathBuf,
    active: BankId,
    capacity: u64,
    writer: Option<File>,
}

impl FileImageStore {
    /// Open or create a store under `root`.
    ///
    /// Reads the active-bank marker if present; a fresh directory starts
    /// with bank A active.
    ///
    /// # Errors
    ///
    /// Fails when the root directory or the marker cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| io_error(&root, e))?;

        let marker = root.join("active_bank");
        let active = match fs::read_to_string(&marker) {
            Ok(name) if name.trim() == "b" => BankId::B,
            Ok(_) => BankId::A,
            Err(_) => {
                fs::write(&marker, BankId::A.name()).map_err(|e| io_error(&marker, e))?;
                BankId::A
            }
        };

        Ok(Self {
            root,
            active,
            capacity: DEFAULT_BANK_CAPACITY,
            writer: None,
        })
    }

    /// Override the per-bank capacity used for size gating.
    pub fn with_bank_capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }

    /// The bank the device is currently running from.
    pub fn active_bank(&self) -> BankId {
        self.active
    }

    fn bank_path(&self, bank: BankId) -> PathBuf {
        self.root.join(format!("bank_{}.img", bank.name()))
    }

    fn decode_digest(expected: &str) -> Result<Vec<u8>, StoreError> {
        let digest = BASE64
            .decode(expected)
            .map_err(|e| StoreError::BadDigest(e.to_string()))?;
        if digest.len() != 32 {
            return Err(StoreError::BadDigest(format!(
                "expected 32 digest bytes, got {}",
                digest.len()
            )));
        }
        Ok(digest)
    }

    fn hash_image(&self, bank: BankId, image_size: u64) -> Result<Vec<u8>, StoreError> {
        let path = self.bank_path(bank);
        let mut file = File::open(&path).map_err(|e| io_error(&path, e))?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        let mut remaining = image_size;

        while remaining > 0 {
            let want = remaining.min(buffer.len() as u64) as usize;
            let read = file
                .read(&mut buffer[..want])
                .map_err(|e| io_error(&path, e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
            remaining -= read as u64;
        }

        Ok(hasher.finalize().to_vec())
    }
}

impl ImageStore for FileImageStore {
    fn init(&mut self) -> Result<ImageContext, StoreError> {
        let bank = self.active.other();
        let path = self.bank_path(bank);

        // Truncating the bank file is the file-backed equivalent of a
        // flash erase.
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| io_error(&path, e))?;

        tracing::info!(bank = bank.name(), path = %path.display(), "erased inactive bank");
        self.writer = Some(file);
        Ok(ImageContext::new(bank))
    }

    fn bank_capacity(&self) -> Result<u64, StoreError> {
        Ok(self.capacity)
    }

    fn write_block(
        &mut self,
        ctx: &mut ImageContext,
        offset: u64,
        data: &[u8],
    ) -> Result<(), StoreError> {
        ctx.ensure_open()?;
        let path = self.bank_path(ctx.bank);
        let writer = self.writer.as_mut().ok_or(StoreError::Closed)?;

        writer
            .seek(SeekFrom::Start(offset))
            .and_then(|_| writer.write_all(data))
            .map_err(|e| io_error(&path, e))?;

        ctx.image_size = ctx.image_size.max(offset + data.len() as u64);
        Ok(())
    }

    fn verify(
        &mut self,
        ctx: &mut ImageContext,
        expected_sha256_base64: &str,
    ) -> Result<(), StoreError> {
        ctx.ensure_open()?;

        if ctx.image_size == 0 {
            return Err(StoreError::VerificationFailed {
                expected: expected_sha256_base64.to_string(),
                actual: "(empty image)".to_string(),
            });
        }

        let expected = Self::decode_digest(expected_sha256_base64)?;

        let path = self.bank_path(ctx.bank);
        if let Some(writer) = self.writer.as_mut() {
            writer.flush().map_err(|e| io_error(&path, e))?;
        }

        let actual = self.hash_image(ctx.bank, ctx.image_size)?;
        if actual != expected {
            return Err(StoreError::VerificationFailed {
                expected: expected_sha256_base64.to_string(),
                actual: BASE64.encode(&actual),
            });
        }

        tracing::info!(
            bank = ctx.bank.name(),
            image_size = ctx.image_size,
            "image digest verified"
        );
        ctx.verified = true;
        Ok(())
    }

    fn enable(&mut self, ctx: &mut ImageContext) -> Result<(), StoreError> {
        ctx.ensure_open()?;
        if !ctx.verified {
            return Err(StoreError::NotVerified);
        }

        // Drop the writer first so the image is fully flushed before the
        // boot marker points at it.
        self.writer = None;

        let marker = self.root.join("next_boot");
        fs::write(&marker, ctx.bank.name()).map_err(|e| io_error(&marker, e))?;

        tracing::info!(bank = ctx.bank.name(), "bank enabled for next boot");
        ctx.open = false;
        Ok(())
    }

    fn abort(&mut self, mut ctx: ImageContext) {
        self.writer = None;
        ctx.open = false;

        let path = self.bank_path(ctx.bank);
        if let Err(e) = fs::remove_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to discard aborted image");
        } else {
            tracing::info!(bank = ctx.bank.name(), "discarded aborted image");
        }
    }

    fn reset_device(&mut self) -> ! {
        tracing::info!("restarting device");
        std::process::exit(0);
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn digest_base64(data: &[u8]) -> String {
        BASE64.encode(Sha256::digest(data))
    }

    fn store(dir: &TempDir) -> FileImageStore {
        FileImageStore::new(dir.path()).unwrap()
    }

    #[test]
    fn test_fresh_store_defaults_to_bank_a() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert_eq!(store.active_bank(), BankId::A);
        assert_eq!(
            fs::read_to_string(dir.path().join("active_bank")).unwrap(),
            "a"
        );
    }

    #[test]
    fn test_active_bank_marker_is_honored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("active_bank"), "b").unwrap();
        let store = store(&dir);
        assert_eq!(store.active_bank(), BankId::B);
    }

    #[test]
    fn test_write_verify_enable_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let image: Vec<u8> = (0..100_000u32).map(|i| (i % 256) as u8).collect();

        let mut ctx = store.init().unwrap();
        for (i, chunk) in image.chunks(32 * 1024).enumerate() {
            store
                .write_block(&mut ctx, (i * 32 * 1024) as u64, chunk)
                .unwrap();
        }
        assert_eq!(ctx.image_size(), image.len() as u64);

        store.verify(&mut ctx, &digest_base64(&image)).unwrap();
        assert!(ctx.is_verified());

        store.enable(&mut ctx).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("next_boot")).unwrap(),
            "b"
        );
        assert_eq!(fs::read(dir.path().join("bank_b.img")).unwrap(), image);
    }

    #[test]
    fn test_verify_rejects_digest_mismatch() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let mut ctx = store.init().unwrap();
        store.write_block(&mut ctx, 0, b"not the image").unwrap();

        let err = store
            .verify(&mut ctx, &digest_base64(b"the real image"))
            .unwrap_err();
        assert!(matches!(err, StoreError::VerificationFailed { .. }));
        assert!(!ctx.is_verified());
    }

    #[test]
    fn test_verify_rejects_empty_image() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let mut ctx = store.init().unwrap();

        let err = store.verify(&mut ctx, &digest_base64(b"")).unwrap_err();
        assert!(matches!(err, StoreError::VerificationFailed { .. }));
    }

    #[test]
    fn test_verify_rejects_malformed_digest() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let mut ctx = store.init().unwrap();
        store.write_block(&mut ctx, 0, b"payload").unwrap();

        assert!(matches!(
            store.verify(&mut ctx, "!!not-base64!!"),
            Err(StoreError::BadDigest(_))
        ));
        assert!(matches!(
            store.verify(&mut ctx, &BASE64.encode(b"short")),
            Err(StoreError::BadDigest(_))
        ));
    }

    #[test]
    fn test_enable_refuses_unverified_image() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let mut ctx = store.init().unwrap();
        store.write_block(&mut ctx, 0, b"payload").unwrap();

        assert!(matches!(store.enable(&mut ctx), Err(StoreError::NotVerified)));
        assert!(!dir.path().join("next_boot").exists());
    }

    #[test]
    fn test_enable_closes_context() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let image = b"image bytes".to_vec();

        let mut ctx = store.init().unwrap();
        store.write_block(&mut ctx, 0, &image).unwrap();
        store.verify(&mut ctx, &digest_base64(&image)).unwrap();
        store.enable(&mut ctx).unwrap();

        assert!(matches!(
            store.write_block(&mut ctx, 0, b"late"),
            Err(StoreError::Closed)
        ));
    }

    #[test]
    fn test_abort_discards_partial_image() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let mut ctx = store.init().unwrap();
        store.write_block(&mut ctx, 0, b"half an image").unwrap();

        store.abort(ctx);
        assert!(!dir.path().join("bank_b.img").exists());
    }

    #[test]
    fn test_resume_rewrite_at_same_offset() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        let mut ctx = store.init().unwrap();

        store.write_block(&mut ctx, 0, b"aaaa").unwrap();
        store.write_block(&mut ctx, 4, b"XXXX").unwrap();
        // A reconnect re-delivers the chunk at offset 4.
        store.write_block(&mut ctx, 4, b"bbbb").unwrap();

        store.verify(&mut ctx, &digest_base64(b"aaaabbbb")).unwrap();
        assert!(ctx.is_verified());
    }
}
