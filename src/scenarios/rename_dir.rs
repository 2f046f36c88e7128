use crate::config::RunOptions;
use crate::driver::{self, DescriptorPair};
use crate::error::Result;
use crate::fixture;
use crate::oracle;
use crate::testbed::TestBed;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs;

/// Rename a directory through the mount and check the cascade: the contained
/// file must be reachable only under the new directory name, on both trees.
/// The subdirectory is grown on the source side after mounting - the source
/// tree is authoritative and the mount must pick it up.
pub fn visibility(opts: &RunOptions) -> Result<()> {
    const NAME: &str = "rename-dir";

    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
    let mut bed = TestBed::provision(opts, &mut rng)?;
    bed.mount(opts)?;

    fixture::create_fixture_dir(&bed.source_path("folder1"))?;
    fixture::copy_fixture_file(&bed.source_path("file2"), &bed.source_path("folder1/file2"))?;
    let original_file2 = fs::read(bed.source_path("file2"))?;

    fs::rename(bed.mount_path("folder1"), bed.mount_path("folder2"))?;

    oracle::expect_existence(
        NAME,
        opts.seed,
        "folder2/file2",
        true,
        bed.source_path("folder2/file2").is_file(),
        bed.mount_path("folder2/file2").is_file(),
    )?;
    oracle::expect_existence(
        NAME,
        opts.seed,
        "folder1/file2",
        false,
        bed.source_path("folder1/file2").is_file(),
        bed.mount_path("folder1/file2").is_file(),
    )?;

    let relocated = fs::read(bed.mount_path("folder2/file2"))?;
    oracle::expect_same_bytes(
        NAME,
        opts.seed,
        "folder2/file2 after directory rename",
        &original_file2,
        &relocated,
    )?;

    Ok(())
}

/// Swap two directories through the mount while descriptors on files inside
/// them stay open. A descriptor resolves through the directory name only at
/// open time; renaming an ancestor must not disturb it.
pub fn swap_with_open_descriptors(opts: &RunOptions) -> Result<()> {
    const NAME: &str = "rename-dir-swap";

    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
    let mut bed = TestBed::provision(opts, &mut rng)?;
    bed.mount(opts)?;

    for folder in ["folder1", "folder2"] {
        fixture::create_fixture_dir(&bed.source_path(folder))?;
    }
    fixture::copy_fixture_file(&bed.source_path("file1"), &bed.source_path("folder1/file"))?;
    fixture::copy_fixture_file(&bed.source_path("file2"), &bed.source_path("folder2/file"))?;

    let original_file1 = fs::read(bed.source_path("file1"))?;
    let original_file2 = fs::read(bed.source_path("file2"))?;

    let mut first = DescriptorPair::open(
        &bed.source_path("folder1/file"),
        &bed.mount_path("folder1/file"),
    )?;
    let mut second = DescriptorPair::open(
        &bed.source_path("folder2/file"),
        &bed.mount_path("folder2/file"),
    )?;

    let iterations = opts.interleaved_read_iterations;
    driver::paired_read_cycle(&mut first, opts.file_size, iterations, &mut rng, NAME, opts.seed)?;
    driver::paired_read_cycle(&mut second, opts.file_size, iterations, &mut rng, NAME, opts.seed)?;

    // Ordered two-step directory swap through the mount.
    fs::rename(bed.mount_path("folder2"), bed.mount_path("folder3"))?;
    fs::rename(bed.mount_path("folder1"), bed.mount_path("folder2"))?;

    // Open descriptors are pinned to the files, not to the directory names
    // they were resolved through.
    driver::paired_read_cycle(&mut first, opts.file_size, iterations, &mut rng, NAME, opts.seed)?;
    driver::paired_read_cycle(&mut second, opts.file_size, iterations, &mut rng, NAME, opts.seed)?;

    drop(first);
    drop(second);

    oracle::expect_existence(
        NAME,
        opts.seed,
        "folder1",
        false,
        bed.source_path("folder1").is_dir(),
        bed.mount_path("folder1").is_dir(),
    )?;

    for (path, expected) in [
        ("folder2/file", original_file1.as_slice()),
        ("folder3/file", original_file2.as_slice()),
    ] {
        let source_bytes = fs::read(bed.source_path(path))?;
        let mounted_bytes = fs::read(bed.mount_path(path))?;
        oracle::expect_same_bytes(
            NAME,
            opts.seed,
            &format!("{} after directory swap, source vs mount", path),
            &source_bytes,
            &mounted_bytes,
        )?;
        oracle::expect_same_bytes(
            NAME,
            opts.seed,
            &format!("{} after directory swap, expected mapping", path),
            expected,
            &mounted_bytes,
        )?;
    }

    Ok(())
}
