use crate::config::RunOptions;
use crate::error::{MirrorcheckError, Result};
use crate::fixture;
use crate::mount::{self, MountGuard, MountOptions};
use rand_chacha::ChaCha8Rng;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Per-scenario lifecycle: a fresh work directory holding the source tree and
/// the mount point, populated fixtures, and a guard on the mounted
/// filesystem. Teardown is unconditional - dropping the bed releases the
/// mount first (tolerating it already being gone) and then removes the work
/// directory, whatever the scenario outcome was.
pub struct TestBed {
    pub source_dir: PathBuf,
    pub mount_dir: PathBuf,
    mount: Option<MountGuard>,
    workdir: TempDir,
}

impl TestBed {
    /// Create the work directory, `src/` and `mount/` under it, and populate
    /// the fixture files from the scenario RNG.
    pub fn provision(opts: &RunOptions, rng: &mut ChaCha8Rng) -> Result<Self> {
        let workdir = tempfile::Builder::new()
            .prefix("mirrorcheck-")
            .tempdir()
            .map_err(|e| {
                MirrorcheckError::Fixture(format!("Failed to create work directory: {}", e))
            })?;

        let source_dir = workdir.path().join("src");
        let mount_dir = workdir.path().join("mount");
        for dir in [&source_dir, &mount_dir] {
            fs::create_dir(dir).map_err(|e| {
                MirrorcheckError::Fixture(format!(
                    "Failed to create directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        fixture::populate_source(&source_dir, opts.file_count, opts.file_size, rng)?;

        Ok(TestBed {
            source_dir,
            mount_dir,
            mount: None,
            workdir,
        })
    }

    /// Mount the filesystem under test over `mount/`, waiting until `file1`
    /// is visible through it.
    pub fn mount(&mut self, opts: &RunOptions) -> Result<()> {
        let sentinel = self.mount_dir.join("file1");
        let guard = mount::mount_passthrough(
            &opts.fs_binary,
            &self.source_dir,
            &self.mount_dir,
            None,
            &sentinel,
            &mount_options(opts),
        )?;
        self.mount = Some(guard);
        Ok(())
    }

    /// Mount the same source again at a sibling mount point, launching the
    /// filesystem under test from inside the source directory with relative
    /// source and mount arguments. Returns the new mount point and its guard;
    /// the caller keeps the guard alive for the duration of the scenario.
    pub fn mount_relative(&self, opts: &RunOptions) -> Result<(PathBuf, MountGuard)> {
        let mount_dir = self.workdir.path().join("mount2");
        fs::create_dir(&mount_dir).map_err(|e| {
            MirrorcheckError::Fixture(format!(
                "Failed to create directory {}: {}",
                mount_dir.display(),
                e
            ))
        })?;

        let sentinel = mount_dir.join("file1");
        let guard = mount::mount_passthrough(
            &opts.fs_binary,
            Path::new("."),
            Path::new("../mount2"),
            Some(&self.source_dir),
            &sentinel,
            &mount_options(opts),
        )?;
        Ok((mount_dir, guard))
    }

    pub fn source_path(&self, name: &str) -> PathBuf {
        self.source_dir.join(name)
    }

    pub fn mount_path(&self, name: &str) -> PathBuf {
        self.mount_dir.join(name)
    }
}

impl Drop for TestBed {
    fn drop(&mut self) {
        // Release the mount before TempDir tries to delete the tree under it.
        if let Some(mut guard) = self.mount.take() {
            guard.release();
        }
    }
}

fn mount_options(opts: &RunOptions) -> MountOptions {
    MountOptions {
        iterations: opts.iterations,
        delay_probability: opts.delay_probability,
        error_probability: opts.error_probability,
        ready_timeout: opts.ready_timeout,
        unmount_command: opts.unmount_command.clone(),
    }
}
