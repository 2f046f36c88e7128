use crate::config::{validate_probability, RunOptions};
use crate::error::{MirrorcheckError, Result};

/// Validate fully-resolved run options before any fixture or mount work
/// happens. The filesystem binary must exist up front - a missing executable
/// would otherwise only surface as a confusing mount timeout.
pub fn validate_run_options(opts: &RunOptions) -> Result<()> {
    if !opts.fs_binary.exists() {
        return Err(MirrorcheckError::Config(format!(
            "Filesystem binary not found: {}",
            opts.fs_binary.display()
        )));
    }

    validate_probability("delay-probability", opts.delay_probability)?;
    validate_probability("error-probability", opts.error_probability)?;

    if opts.file_size == 0 {
        return Err(MirrorcheckError::Config(
            "file-size must be at least 1 byte".to_string(),
        ));
    }

    if opts.file_count < 2 {
        return Err(MirrorcheckError::Config(
            "The rename scenarios need at least 2 fixture files".to_string(),
        ));
    }

    if opts.read_iterations == 0 || opts.interleaved_read_iterations == 0 {
        return Err(MirrorcheckError::Config(
            "read iteration counts must be at least 1".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn sample_options() -> RunOptions {
        RunOptions {
            fs_binary: PathBuf::from("/bin/sh"),
            iterations: 100,
            delay_probability: 0.3,
            error_probability: 0.3,
            file_count: 2,
            file_size: 10_000,
            read_iterations: 10_000,
            interleaved_read_iterations: 1_000,
            ready_timeout: Duration::from_secs(2),
            unmount_command: vec!["fusermount".to_string(), "-u".to_string()],
            seed: 42,
        }
    }

    #[test]
    fn test_valid_options_pass() {
        assert!(validate_run_options(&sample_options()).is_ok());
    }

    #[test]
    fn test_missing_binary_is_rejected() {
        let opts = RunOptions {
            fs_binary: PathBuf::from("/nonexistent/passfs"),
            ..sample_options()
        };
        let err = validate_run_options(&opts).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_out_of_range_probabilities_are_rejected() {
        for (delay, error) in [(1.5, 0.3), (0.3, -0.1), (f64::NAN, 0.0)] {
            let opts = RunOptions {
                delay_probability: delay,
                error_probability: error,
                ..sample_options()
            };
            assert!(validate_run_options(&opts).is_err());
        }
    }

    #[test]
    fn test_degenerate_fixture_and_driver_values_are_rejected() {
        let opts = RunOptions {
            file_size: 0,
            ..sample_options()
        };
        assert!(validate_run_options(&opts).is_err());

        let opts = RunOptions {
            file_count: 1,
            ..sample_options()
        };
        assert!(validate_run_options(&opts).is_err());

        let opts = RunOptions {
            read_iterations: 0,
            ..sample_options()
        };
        assert!(validate_run_options(&opts).is_err());
    }
}
