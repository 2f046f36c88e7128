use crate::error::{MirrorcheckError, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

/// Mounts with a live guard, kept for the Ctrl-C path: an interrupted run
/// must still release whatever it mounted.
static ACTIVE_MOUNTS: OnceLock<Mutex<Vec<ActiveMount>>> = OnceLock::new();

#[derive(Clone)]
struct ActiveMount {
    mount_dir: PathBuf,
    unmount_command: Vec<String>,
}

fn active_mounts() -> &'static Mutex<Vec<ActiveMount>> {
    ACTIVE_MOUNTS.get_or_init(|| Mutex::new(Vec::new()))
}

fn register_mount(mount_dir: &Path, unmount_command: &[String]) {
    active_mounts().lock().unwrap().push(ActiveMount {
        mount_dir: mount_dir.to_path_buf(),
        unmount_command: unmount_command.to_vec(),
    });
}

fn deregister_mount(mount_dir: &Path) {
    active_mounts()
        .lock()
        .unwrap()
        .retain(|m| m.mount_dir != mount_dir);
}

/// Parameters for starting the filesystem under test.
#[derive(Debug, Clone)]
pub struct MountOptions {
    pub iterations: u64,
    pub delay_probability: f64,
    pub error_probability: f64,
    pub ready_timeout: Duration,
    pub unmount_command: Vec<String>,
}

/// A mounted filesystem-under-test instance. Releasing is best-effort and
/// idempotent: dropping the guard unmounts, reaps the child process, and
/// tolerates the mount already being gone.
#[derive(Debug)]
pub struct MountGuard {
    mount_dir: PathBuf,
    unmount_command: Vec<String>,
    child: Option<Child>,
    released: bool,
}

impl MountGuard {
    fn wait_ready(&mut self, sentinel: &Path, timeout: Duration) -> Result<()> {
        let check_interval = Duration::from_millis(50);
        let start = Instant::now();

        loop {
            // A filesystem that daemonizes exits successfully once the mount
            // is up; a foreground one keeps running. Either way a failure
            // exit means the mount never happened.
            if let Some(child) = self.child.as_mut() {
                let poll = child.try_wait();
                match poll {
                    Ok(Some(status)) if !status.success() => {
                        return Err(MirrorcheckError::Mount(format!(
                            "Filesystem under test exited with {} before the mount became ready",
                            status
                        )));
                    }
                    Ok(Some(_)) => {
                        self.child = None;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        return Err(MirrorcheckError::Mount(format!(
                            "Failed to poll filesystem under test: {}",
                            e
                        )));
                    }
                }
            }

            if sentinel.exists() {
                tracing::debug!("Mount verified: {} is visible", sentinel.display());
                return Ok(());
            }

            if start.elapsed() >= timeout {
                return Err(MirrorcheckError::Mount(format!(
                    "Mount timed out - {} not visible after {:?}",
                    sentinel.display(),
                    timeout
                )));
            }

            std::thread::sleep(check_interval);
        }
    }

    /// Unmount and reap. Safe to call more than once; later calls are no-ops.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if unmount(&self.mount_dir, &self.unmount_command) {
            tracing::debug!("Unmounted {}", self.mount_dir.display());
        } else {
            tracing::warn!(
                "Failed to unmount {} (may already be unmounted)",
                self.mount_dir.display()
            );
        }

        if let Some(mut child) = self.child.take() {
            // Unmounting normally ends a foreground filesystem process; give
            // it a moment before resorting to kill.
            std::thread::sleep(Duration::from_millis(100));
            match child.try_wait() {
                Ok(Some(_)) => {}
                _ => {
                    let _ = child.kill();
                    let _ = child.wait();
                }
            }
        }

        deregister_mount(&self.mount_dir);
    }
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Start the filesystem under test and wait until the mounted tree is
/// visible.
///
/// The external contract is five positional arguments:
/// `<source-dir> <mount-dir> <iterations> <delay-probability> <error-probability>`.
/// `source_arg` and `mount_arg` are passed through verbatim (they may be
/// relative when `working_dir` is set); `sentinel` is an absolute path that
/// must appear under the mount for it to count as ready.
pub fn mount_passthrough(
    fs_binary: &Path,
    source_arg: &Path,
    mount_arg: &Path,
    working_dir: Option<&Path>,
    sentinel: &Path,
    opts: &MountOptions,
) -> Result<MountGuard> {
    let mount_dir = match working_dir {
        Some(cwd) => cwd.join(mount_arg),
        None => mount_arg.to_path_buf(),
    };

    fs::create_dir_all(&mount_dir).map_err(|e| {
        MirrorcheckError::Mount(format!(
            "Failed to create mount directory {}: {}",
            mount_dir.display(),
            e
        ))
    })?;

    let mut command = Command::new(fs_binary);
    command
        .arg(source_arg)
        .arg(mount_arg)
        .arg(opts.iterations.to_string())
        .arg(opts.delay_probability.to_string())
        .arg(opts.error_probability.to_string())
        .stdout(Stdio::null());
    if let Some(cwd) = working_dir {
        command.current_dir(cwd);
    }

    tracing::info!(
        "Mounting {} -> {} via {}",
        source_arg.display(),
        mount_arg.display(),
        fs_binary.display()
    );

    let child = command.spawn().map_err(|e| {
        MirrorcheckError::Mount(format!(
            "Failed to start filesystem under test {}: {}",
            fs_binary.display(),
            e
        ))
    })?;

    register_mount(&mount_dir, &opts.unmount_command);

    let mut guard = MountGuard {
        mount_dir,
        unmount_command: opts.unmount_command.clone(),
        child: Some(child),
        released: false,
    };

    guard.wait_ready(sentinel, opts.ready_timeout)?;
    Ok(guard)
}

/// Release a mount point with the given command (the mount directory is
/// appended as the final argument). Returns whether the command reported
/// success; failure is expected when the mount is already gone and is never
/// an error.
pub fn unmount(mount_dir: &Path, unmount_command: &[String]) -> bool {
    let (program, args) = match unmount_command.split_first() {
        Some(split) => split,
        None => return false,
    };

    let status = Command::new(program)
        .args(args)
        .arg(mount_dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) => status.success(),
        Err(e) => {
            tracing::warn!("Failed to run unmount command {}: {}", program, e);
            false
        }
    }
}

/// Unmount everything still registered by live guards. Called from the
/// Ctrl-C path, where guards will not get the chance to drop.
pub fn emergency_cleanup() {
    let mounts: Vec<ActiveMount> = active_mounts().lock().unwrap().clone();
    for mount in mounts {
        tracing::info!("Releasing interrupted mount {}", mount.mount_dir.display());
        unmount(&mount.mount_dir, &mount.unmount_command);
    }
}

/// Extract mount points of harness work directories from a mount table.
/// Harness work directories carry the `mirrorcheck-` temp prefix, so anything
/// matching is a leftover from a crashed or killed run.
fn parse_stale_mounts(mount_table: &str) -> Vec<String> {
    let mount_regex = Regex::new(r"\S+ on (\S+) type \S+").unwrap();
    let mut stale = Vec::new();

    for line in mount_table.lines() {
        if let Some(captures) = mount_regex.captures(line) {
            if let Some(mount_path) = captures.get(1) {
                let path = mount_path.as_str();
                if path.contains("mirrorcheck-") {
                    stale.push(path.to_string());
                }
            }
        }
    }

    stale
}

/// Clean up stale mounts from crashed runs.
///
/// A run killed without teardown leaves its work directory mounted, which
/// blocks temp cleanup and, on FUSE, eats into the mount limit. Users can
/// skip this sweep with the MIRRORCHECK_NO_CLEANUP env var.
pub fn cleanup_stale_mounts(unmount_command: &[String]) {
    if std::env::var("MIRRORCHECK_NO_CLEANUP").is_ok() {
        tracing::debug!("Skipping stale mount cleanup (MIRRORCHECK_NO_CLEANUP=1)");
        return;
    }

    let mount_output = match Command::new("mount").output() {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("Failed to run mount command: {}", e);
            return;
        }
    };

    let mount_text = String::from_utf8_lossy(&mount_output.stdout);
    let stale_mounts = parse_stale_mounts(&mount_text);

    if stale_mounts.is_empty() {
        tracing::debug!("No stale mirrorcheck mounts found");
        return;
    }

    tracing::info!("Found {} stale mirrorcheck mount(s)", stale_mounts.len());

    for mount_path in &stale_mounts {
        tracing::info!("Attempting to unmount stale mount: {}", mount_path);
        if unmount(Path::new(mount_path), unmount_command) {
            tracing::info!("Successfully unmounted: {}", mount_path);
        } else {
            tracing::warn!("Failed to unmount stale mount: {}", mount_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stale_mounts_picks_harness_work_dirs() {
        let table = "\
proc on /proc type proc (rw,nosuid)\n\
passfs on /tmp/mirrorcheck-abc123/mount type fuse (rw,nosuid,nodev)\n\
passfs on /home/user/data type fuse (rw,nosuid,nodev)\n\
tmpfs on /run type tmpfs (rw)\n\
passfs on /tmp/mirrorcheck-xyz/mount2 type fuse.passfs (rw)\n";

        let stale = parse_stale_mounts(table);
        assert_eq!(
            stale,
            vec![
                "/tmp/mirrorcheck-abc123/mount".to_string(),
                "/tmp/mirrorcheck-xyz/mount2".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_stale_mounts_empty_table() {
        assert!(parse_stale_mounts("").is_empty());
        assert!(parse_stale_mounts("garbage line\n").is_empty());
    }

    #[test]
    fn test_unmount_reports_command_status() {
        let dir = tempfile::tempdir().unwrap();

        assert!(unmount(dir.path(), &["true".to_string()]));
        assert!(!unmount(dir.path(), &["false".to_string()]));
        // A missing unmount program is swallowed, not an error.
        assert!(!unmount(
            dir.path(),
            &["/nonexistent/unmount-helper".to_string()]
        ));
        assert!(!unmount(dir.path(), &[]));
    }

    #[test]
    fn test_failing_filesystem_binary_is_a_mount_error() {
        let dir = tempfile::tempdir().unwrap();
        let opts = MountOptions {
            iterations: 1,
            delay_probability: 0.0,
            error_probability: 0.0,
            ready_timeout: Duration::from_millis(500),
            unmount_command: vec!["true".to_string()],
        };

        let err = mount_passthrough(
            Path::new("false"),
            &dir.path().join("src"),
            &dir.path().join("mount"),
            None,
            &dir.path().join("mount/file1"),
            &opts,
        )
        .unwrap_err();

        assert!(matches!(err, MirrorcheckError::Mount(_)));
    }

    #[test]
    fn test_mount_timeout_when_nothing_appears() {
        let dir = tempfile::tempdir().unwrap();
        let opts = MountOptions {
            iterations: 1,
            delay_probability: 0.0,
            error_probability: 0.0,
            ready_timeout: Duration::from_millis(200),
            unmount_command: vec!["true".to_string()],
        };

        // `true` exits successfully without mounting anything, so readiness
        // has to come from the sentinel - which never appears.
        let err = mount_passthrough(
            Path::new("true"),
            &dir.path().join("src"),
            &dir.path().join("mount"),
            None,
            &dir.path().join("mount/file1"),
            &opts,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("timed out"), "got: {}", message);
    }
}
