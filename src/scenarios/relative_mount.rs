use crate::config::RunOptions;
use crate::error::Result;
use crate::oracle;
use crate::testbed::TestBed;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs;

const NAME: &str = "relative-path";

/// Mounting the same source via a relative path from a different working
/// directory must produce an equivalent mounted tree. The filesystem under
/// test is launched from inside the source directory with `.` as the source
/// argument and a relative mount argument.
pub fn run(opts: &RunOptions) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
    let bed = TestBed::provision(opts, &mut rng)?;

    let (mount_dir, _mount) = bed.mount_relative(opts)?;

    oracle::expect_existence(
        NAME,
        opts.seed,
        "file1",
        true,
        bed.source_path("file1").is_file(),
        mount_dir.join("file1").is_file(),
    )?;

    oracle::expect_same_tree(NAME, opts.seed, &bed.source_dir, &mount_dir)?;

    let source_bytes = fs::read(bed.source_path("file1"))?;
    let mounted_bytes = fs::read(mount_dir.join("file1"))?;
    oracle::expect_same_bytes(
        NAME,
        opts.seed,
        "full read of file1 through the relative mount",
        &source_bytes,
        &mounted_bytes,
    )?;

    Ok(())
}
