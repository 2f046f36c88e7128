use crate::config::RunOptions;
use crate::driver::{self, DescriptorPair};
use crate::error::Result;
use crate::oracle;
use crate::testbed::TestBed;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs;

/// Rename a mounted file and check that both trees agree: the new name
/// resolves, the old one no longer does, immediately and on both sides.
pub fn visibility(opts: &RunOptions) -> Result<()> {
    const NAME: &str = "rename-file";

    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
    let mut bed = TestBed::provision(opts, &mut rng)?;
    bed.mount(opts)?;

    let original_file2 = fs::read(bed.source_path("file2"))?;

    fs::rename(bed.mount_path("file2"), bed.mount_path("file3"))?;

    oracle::expect_existence(
        NAME,
        opts.seed,
        "file3",
        true,
        bed.source_path("file3").is_file(),
        bed.mount_path("file3").is_file(),
    )?;
    oracle::expect_existence(
        NAME,
        opts.seed,
        "file2",
        false,
        bed.source_path("file2").is_file(),
        bed.mount_path("file2").is_file(),
    )?;

    // The new name must carry the old content, not just exist.
    let renamed = fs::read(bed.mount_path("file3"))?;
    oracle::expect_same_bytes(
        NAME,
        opts.seed,
        "file3 after rename",
        &original_file2,
        &renamed,
    )?;

    Ok(())
}

/// Swap file1 and file2 through the mount while descriptors opened on both
/// stay live across the renames. The descriptors must keep serving the
/// content they were opened on - before the renames, and again after.
pub fn swap_with_open_descriptors(opts: &RunOptions) -> Result<()> {
    const NAME: &str = "rename-swap-open";

    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
    let mut bed = TestBed::provision(opts, &mut rng)?;
    bed.mount(opts)?;

    let original_file1 = fs::read(bed.source_path("file1"))?;
    let original_file2 = fs::read(bed.source_path("file2"))?;

    let mut first = DescriptorPair::open(&bed.source_path("file1"), &bed.mount_path("file1"))?;
    let mut second = DescriptorPair::open(&bed.source_path("file2"), &bed.mount_path("file2"))?;

    let iterations = opts.interleaved_read_iterations;
    driver::paired_read_cycle(&mut first, opts.file_size, iterations, &mut rng, NAME, opts.seed)?;
    driver::paired_read_cycle(&mut second, opts.file_size, iterations, &mut rng, NAME, opts.seed)?;

    two_step_swap(&bed)?;

    // The open descriptors reference the files, not the names: the swap must
    // be invisible through them.
    driver::paired_read_cycle(&mut first, opts.file_size, iterations, &mut rng, NAME, opts.seed)?;
    driver::paired_read_cycle(&mut second, opts.file_size, iterations, &mut rng, NAME, opts.seed)?;

    drop(first);
    drop(second);

    assert_swap_mapping(NAME, opts, &bed, &original_file1, &original_file2)
}

/// Same swap, but the descriptors are closed before the renames execute. The
/// final name-to-content mapping must not depend on descriptor lifetime
/// ordering, and closing must not resurrect an old name.
pub fn swap_after_close(opts: &RunOptions) -> Result<()> {
    const NAME: &str = "rename-swap-closed";

    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
    let mut bed = TestBed::provision(opts, &mut rng)?;
    bed.mount(opts)?;

    let original_file1 = fs::read(bed.source_path("file1"))?;
    let original_file2 = fs::read(bed.source_path("file2"))?;

    let mut first = DescriptorPair::open(&bed.source_path("file1"), &bed.mount_path("file1"))?;
    let mut second = DescriptorPair::open(&bed.source_path("file2"), &bed.mount_path("file2"))?;

    let iterations = opts.interleaved_read_iterations;
    driver::paired_read_cycle(&mut first, opts.file_size, iterations, &mut rng, NAME, opts.seed)?;
    driver::paired_read_cycle(&mut second, opts.file_size, iterations, &mut rng, NAME, opts.seed)?;

    drop(first);
    drop(second);

    two_step_swap(&bed)?;

    assert_swap_mapping(NAME, opts, &bed, &original_file1, &original_file2)
}

/// The ordered two-step swap: file2 moves aside to file3, then file1 takes
/// file2's old name. The intermediate name avoids a collision; the ordering
/// is part of the protocol and is never collapsed into an atomic exchange.
fn two_step_swap(bed: &TestBed) -> Result<()> {
    fs::rename(bed.mount_path("file2"), bed.mount_path("file3"))?;
    fs::rename(bed.mount_path("file1"), bed.mount_path("file2"))?;
    Ok(())
}

fn assert_swap_mapping(
    scenario: &str,
    opts: &RunOptions,
    bed: &TestBed,
    original_file1: &[u8],
    original_file2: &[u8],
) -> Result<()> {
    oracle::expect_existence(
        scenario,
        opts.seed,
        "file1",
        false,
        bed.source_path("file1").is_file(),
        bed.mount_path("file1").is_file(),
    )?;

    for (name, expected) in [("file2", original_file1), ("file3", original_file2)] {
        let source_bytes = fs::read(bed.source_path(name))?;
        let mounted_bytes = fs::read(bed.mount_path(name))?;
        oracle::expect_same_bytes(
            scenario,
            opts.seed,
            &format!("{} after swap, source vs mount", name),
            &source_bytes,
            &mounted_bytes,
        )?;
        oracle::expect_same_bytes(
            scenario,
            opts.seed,
            &format!("{} after swap, expected mapping", name),
            expected,
            &mounted_bytes,
        )?;
    }

    Ok(())
}
