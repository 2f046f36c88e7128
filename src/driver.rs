use crate::error::{MirrorcheckError, Result};
use crate::oracle;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Two live read-only handles on the same logical file: one opened through the
/// source tree, one through the mount. Per POSIX the handles track the open
/// file, not the name, so they stay valid across renames of the paths they
/// were opened through. Dropping the pair closes both descriptors, which keeps
/// every exit path leak-free across thousands of iterations.
#[derive(Debug)]
pub struct DescriptorPair {
    pub source: File,
    pub mounted: File,
}

impl DescriptorPair {
    pub fn open(source_path: &Path, mount_path: &Path) -> Result<Self> {
        let source = File::open(source_path).map_err(|e| {
            MirrorcheckError::Fixture(format!(
                "Failed to open source descriptor {}: {}",
                source_path.display(),
                e
            ))
        })?;
        let mounted = File::open(mount_path)?;
        Ok(DescriptorPair { source, mounted })
    }

    /// Absolute seek from start-of-file on both descriptors.
    pub fn seek_both(&mut self, offset: u64) -> Result<()> {
        self.source.seek(SeekFrom::Start(offset))?;
        self.mounted.seek(SeekFrom::Start(offset))?;
        Ok(())
    }
}

/// Read up to `length` bytes, stopping only at end-of-file. Both sides of a
/// pair go through this, so a read extending past end-of-file truncates
/// identically on each and the comparison stays meaningful.
pub fn read_upto(file: &mut File, length: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; length];
    let mut filled = 0;

    while filled < length {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    buf.truncate(filled);
    Ok(buf)
}

/// Drive `iterations` random (offset, length) seek+read cycles against both
/// descriptors and compare every returned byte sequence. Offsets cover
/// [0, file_size] and lengths [1, file_size] as independent uniform draws, so
/// overlapping, out-of-order, and past-end-of-file patterns are all hit.
pub fn paired_read_cycle(
    pair: &mut DescriptorPair,
    file_size: u64,
    iterations: u64,
    rng: &mut ChaCha8Rng,
    scenario: &str,
    seed: u64,
) -> Result<()> {
    for iteration in 0..iterations {
        let offset = rng.random_range(0..=file_size);
        let length = rng.random_range(1..=file_size) as usize;

        pair.seek_both(offset)?;
        let source_bytes = read_upto(&mut pair.source, length)?;
        let mounted_bytes = read_upto(&mut pair.mounted, length)?;

        oracle::expect_same_bytes(
            scenario,
            seed,
            &format!(
                "iteration {}: read(offset={}, len={})",
                iteration, offset, length
            ),
            &source_bytes,
            &mounted_bytes,
        )?;
    }

    Ok(())
}
