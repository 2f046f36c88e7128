use crate::config::RunOptions;
use crate::driver::{self, DescriptorPair};
use crate::error::Result;
use crate::oracle;
use crate::testbed::TestBed;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const NAME: &str = "random-access";

/// Open one descriptor on a source file and one on its mounted counterpart,
/// then hammer both with identical random seek+read cycles. Offsets and
/// lengths are independent draws over the whole file, dense enough to surface
/// off-by-one and boundary bugs in the read path.
pub fn run(opts: &RunOptions) -> Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
    let mut bed = TestBed::provision(opts, &mut rng)?;
    bed.mount(opts)?;

    // The mounted view must already mirror the whole source tree before any
    // reads are issued through it.
    oracle::expect_same_tree(NAME, opts.seed, &bed.source_dir, &bed.mount_dir)?;

    let mut pair = DescriptorPair::open(&bed.source_path("file1"), &bed.mount_path("file1"))?;
    driver::paired_read_cycle(
        &mut pair,
        opts.file_size,
        opts.read_iterations,
        &mut rng,
        NAME,
        opts.seed,
    )?;

    Ok(())
}
