use crate::error::{MirrorcheckError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Pure assertion logic for the differential comparison. Every check is
/// fail-fast: the first observable difference between the source tree and the
/// mounted tree aborts the scenario with a `Divergence` error that names the
/// scenario, the operation, and the seed needed to replay it.

pub fn expect_same_bytes(
    scenario: &str,
    seed: u64,
    detail: &str,
    source: &[u8],
    mounted: &[u8],
) -> Result<()> {
    if source.len() != mounted.len() {
        return Err(divergence(
            scenario,
            seed,
            format!(
                "{}: source returned {} bytes, mount returned {}",
                detail,
                source.len(),
                mounted.len()
            ),
        ));
    }

    if let Some(index) = source.iter().zip(mounted.iter()).position(|(a, b)| a != b) {
        return Err(divergence(
            scenario,
            seed,
            format!(
                "{}: byte {} differs (source {:#04x}, mount {:#04x})",
                detail, index, source[index], mounted[index]
            ),
        ));
    }

    Ok(())
}

pub fn expect_existence(
    scenario: &str,
    seed: u64,
    path_label: &str,
    expected: bool,
    source_exists: bool,
    mount_exists: bool,
) -> Result<()> {
    if source_exists != expected || mount_exists != expected {
        return Err(divergence(
            scenario,
            seed,
            format!(
                "{} should {}exist, but source says {} and mount says {}",
                path_label,
                if expected { "" } else { "not " },
                source_exists,
                mount_exists
            ),
        ));
    }
    Ok(())
}

/// Whole-tree equivalence sweep: the mounted tree must expose exactly the
/// relative paths of the source tree, with byte-identical regular files.
pub fn expect_same_tree(scenario: &str, seed: u64, source_root: &Path, mount_root: &Path) -> Result<()> {
    let source_entries = collect_entries(source_root)?;
    let mount_entries = collect_entries(mount_root)?;

    for path in source_entries.keys() {
        if !mount_entries.contains_key(path) {
            return Err(divergence(
                scenario,
                seed,
                format!("{} exists in source but not in mount", path.display()),
            ));
        }
    }
    for path in mount_entries.keys() {
        if !source_entries.contains_key(path) {
            return Err(divergence(
                scenario,
                seed,
                format!("{} exists in mount but not in source", path.display()),
            ));
        }
    }

    for (path, is_file) in &source_entries {
        if !is_file {
            continue;
        }
        let source_bytes = fs::read(source_root.join(path))?;
        let mount_bytes = fs::read(mount_root.join(path))?;
        expect_same_bytes(
            scenario,
            seed,
            &format!("full read of {}", path.display()),
            &source_bytes,
            &mount_bytes,
        )?;
    }

    Ok(())
}

fn divergence(scenario: &str, seed: u64, detail: String) -> MirrorcheckError {
    MirrorcheckError::Divergence {
        scenario: scenario.to_string(),
        seed,
        detail,
    }
}

/// Relative path -> is-regular-file, sorted so mismatch reports are stable.
fn collect_entries(root: &Path) -> Result<BTreeMap<PathBuf, bool>> {
    let mut entries = BTreeMap::new();

    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(|e| {
            MirrorcheckError::Io(e.into())
        })?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .expect("walkdir yields paths under its root")
            .to_path_buf();
        entries.insert(relative, entry.file_type().is_file());
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equal_bytes_pass() {
        assert!(expect_same_bytes("s", 1, "read", b"abc", b"abc").is_ok());
        assert!(expect_same_bytes("s", 1, "read", b"", b"").is_ok());
    }

    #[test]
    fn test_length_mismatch_is_divergence() {
        let err = expect_same_bytes("short-read", 7, "read(offset=9999, len=5)", b"abc", b"ab")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("short-read"));
        assert!(message.contains("seed 7"));
        assert!(message.contains("3 bytes"));
        assert!(message.contains("2"));
    }

    #[test]
    fn test_first_differing_byte_is_reported() {
        let err = expect_same_bytes("s", 1, "read", b"abcd", b"abXd").unwrap_err();
        assert!(err.to_string().contains("byte 2"));
    }

    #[test]
    fn test_existence_checks() {
        assert!(expect_existence("s", 1, "file3", true, true, true).is_ok());
        assert!(expect_existence("s", 1, "file2", false, false, false).is_ok());

        let err = expect_existence("s", 1, "file3", true, true, false).unwrap_err();
        assert!(err.to_string().contains("file3"));

        // A path lingering on only one tree is just as much a divergence.
        assert!(expect_existence("s", 1, "file2", false, true, false).is_err());
    }

    #[test]
    fn test_tree_sweep_accepts_identical_trees() {
        let source = tempfile::tempdir().unwrap();
        let mount = tempfile::tempdir().unwrap();

        for root in [source.path(), mount.path()] {
            fs::create_dir(root.join("sub")).unwrap();
            fs::write(root.join("file1"), b"contents").unwrap();
            fs::write(root.join("sub/file2"), b"nested").unwrap();
        }

        assert!(expect_same_tree("s", 1, source.path(), mount.path()).is_ok());
    }

    #[test]
    fn test_tree_sweep_flags_missing_and_extra_paths() {
        let source = tempfile::tempdir().unwrap();
        let mount = tempfile::tempdir().unwrap();

        fs::write(source.path().join("file1"), b"x").unwrap();
        let err = expect_same_tree("s", 1, source.path(), mount.path()).unwrap_err();
        assert!(err.to_string().contains("file1"));

        fs::write(mount.path().join("file1"), b"x").unwrap();
        fs::write(mount.path().join("extra"), b"y").unwrap();
        let err = expect_same_tree("s", 1, source.path(), mount.path()).unwrap_err();
        assert!(err.to_string().contains("extra"));
    }

    #[test]
    fn test_tree_sweep_flags_content_difference() {
        let source = tempfile::tempdir().unwrap();
        let mount = tempfile::tempdir().unwrap();

        fs::write(source.path().join("file1"), b"aaaa").unwrap();
        fs::write(mount.path().join("file1"), b"aaab").unwrap();

        let err = expect_same_tree("s", 1, source.path(), mount.path()).unwrap_err();
        assert!(err.to_string().contains("byte 3"));
    }

    proptest! {
        #[test]
        fn prop_identical_buffers_always_pass(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert!(expect_same_bytes("prop", 0, "read", &data, &data).is_ok());
        }

        #[test]
        fn prop_any_single_byte_flip_diverges(
            data in proptest::collection::vec(any::<u8>(), 1..512),
            index in any::<prop::sample::Index>(),
        ) {
            let index = index.index(data.len());
            let mut flipped = data.clone();
            flipped[index] ^= 0x01;
            prop_assert!(expect_same_bytes("prop", 0, "read", &data, &flipped).is_err());
        }
    }
}
