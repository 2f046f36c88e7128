use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mirrorcheck::RunOptions;
use tempfile::TempDir;

/// Scripted stand-ins for the filesystem under test. The faithful mounter
/// satisfies the passthrough contract by replacing the mount directory with a
/// symlink to the source tree, which makes every operation through the mount
/// a literal passthrough. The variants deliberately violate the contract so
/// the harness's oracle can be tested as the subject.
#[allow(dead_code)]
pub struct StubFs {
    pub dir: TempDir,
    pub mounter: PathBuf,
    pub corrupting_mounter: PathBuf,
    pub shadow_mounter: PathBuf,
    pub silent_mounter: PathBuf,
    pub unmounter: PathBuf,
}

#[allow(dead_code)]
impl StubFs {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create stub dir");

        // Contract: <source> <mount> <iterations> <delay-p> <error-p>
        let mounter = write_script(
            dir.path(),
            "passfs",
            r#"#!/bin/sh
src="$(cd "$1" && pwd)" || exit 1
rmdir "$2" || exit 1
ln -s "$src" "$2" || exit 1
"#,
        );

        // Mounts a copy of the source with one file's bytes shifted, so every
        // read of file1 through the mount diverges.
        let corrupting_mounter = write_script(
            dir.path(),
            "passfs-corrupt",
            r#"#!/bin/sh
src="$(cd "$1" && pwd)" || exit 1
shadow="${src}.shadow"
rm -rf "$shadow"
cp -r "$src" "$shadow" || exit 1
tr '\000-\377' '\001-\377\000' < "$src/file1" > "$shadow/file1" || exit 1
rmdir "$2" || exit 1
ln -s "$shadow" "$2" || exit 1
"#,
        );

        // Mounts a faithful copy instead of the source itself: reads match,
        // but mutations through the mount never reach the source tree.
        let shadow_mounter = write_script(
            dir.path(),
            "passfs-shadow",
            r#"#!/bin/sh
src="$(cd "$1" && pwd)" || exit 1
shadow="${src}.shadow"
rm -rf "$shadow"
cp -r "$src" "$shadow" || exit 1
rmdir "$2" || exit 1
ln -s "$shadow" "$2" || exit 1
"#,
        );

        // Exits successfully without mounting anything.
        let silent_mounter = write_script(dir.path(), "passfs-silent", "#!/bin/sh\nexit 0\n");

        // Second invocation on the same mount point fails, which the harness
        // must tolerate.
        let unmounter = write_script(
            dir.path(),
            "unmount-passfs",
            r#"#!/bin/sh
[ -L "$1" ] || exit 1
rm "$1" && mkdir "$1"
"#,
        );

        StubFs {
            dir,
            mounter,
            corrupting_mounter,
            shadow_mounter,
            silent_mounter,
            unmounter,
        }
    }

    pub fn unmount_command(&self) -> Vec<String> {
        vec![self.unmounter.to_string_lossy().into_owned()]
    }

    /// Run options sized for tests: the full-size defaults exercise 10,000
    /// reads per scenario, which is more than integration tests need.
    pub fn run_options(&self, fs_binary: &Path, seed: u64) -> RunOptions {
        RunOptions {
            fs_binary: fs_binary.to_path_buf(),
            iterations: 100,
            delay_probability: 0.0,
            error_probability: 0.0,
            file_count: 2,
            file_size: 4096,
            read_iterations: 400,
            interleaved_read_iterations: 200,
            ready_timeout: Duration::from_secs(5),
            unmount_command: self.unmount_command(),
            seed,
        }
    }
}

impl Default for StubFs {
    fn default() -> Self {
        Self::new()
    }
}

pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("Failed to write stub script");
    let mut perms = fs::metadata(&path)
        .expect("Failed to stat stub script")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("Failed to chmod stub script");
    path
}
