// =============================================================================
// OUTPUT VERIFICATION - src/verify/mod.rs
// =============================================================================

//! Post-link check on the produced target: confirm it exists and record
//! a SHA-256 digest for the build report. Reporting only - the digest
//! is never used as a cache key or compared across runs.

use log::debug;
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::BuildError;

/// Read the linked target and return its SHA-256 digest as lowercase
/// hex. Fails if the target cannot be read.
pub async fn digest_target(target: &Path) -> Result<String, BuildError> {
    let bytes = tokio::fs::read(target).await?;
    let digest = hex::encode(Sha256::digest(&bytes));
    debug!("target {} sha256 {}", target.display(), digest);
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn digest_matches_known_vector() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");
        fs::write(&target, b"abc").unwrap();
        let digest = digest_target(&target).await.unwrap();
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn missing_target_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = digest_target(&dir.path().join("absent")).await;
        assert!(matches!(result, Err(BuildError::Io(_))));
    }
}
