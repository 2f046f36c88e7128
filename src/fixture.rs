use crate::error::{MirrorcheckError, Result};
use rand::RngCore;
use rand_chacha::ChaCha8Rng;
use std::fs;
use std::path::Path;

/// Populate a source directory with `file1`..`fileN`, each `file_size` bytes
/// of pseudo-random content drawn from the caller's RNG. The same seed always
/// produces the same bytes, so a failing run can be replayed exactly.
///
/// Fixture I/O failures are fatal to the scenario: the fixture is a
/// precondition, not a subject under test.
pub fn populate_source(
    source_dir: &Path,
    file_count: u32,
    file_size: u64,
    rng: &mut ChaCha8Rng,
) -> Result<()> {
    for index in 1..=file_count {
        let path = source_dir.join(format!("file{}", index));
        write_random_file(&path, file_size, rng)?;
    }

    tracing::debug!(
        "Populated {} with {} fixture files of {} bytes",
        source_dir.display(),
        file_count,
        file_size
    );

    Ok(())
}

pub fn write_random_file(path: &Path, size: u64, rng: &mut ChaCha8Rng) -> Result<()> {
    let mut bytes = vec![0u8; size as usize];
    rng.fill_bytes(&mut bytes);

    fs::write(path, &bytes).map_err(|e| {
        MirrorcheckError::Fixture(format!(
            "Failed to write fixture file {}: {}",
            path.display(),
            e
        ))
    })
}

pub fn create_fixture_dir(path: &Path) -> Result<()> {
    fs::create_dir(path).map_err(|e| {
        MirrorcheckError::Fixture(format!(
            "Failed to create fixture directory {}: {}",
            path.display(),
            e
        ))
    })
}

pub fn copy_fixture_file(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to).map_err(|e| {
        MirrorcheckError::Fixture(format!(
            "Failed to copy fixture {} -> {}: {}",
            from.display(),
            to.display(),
            e
        ))
    })?;
    Ok(())
}
