use crate::error::{MirrorcheckError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Knobs forwarded verbatim to the filesystem under test.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StressConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_probability: Option<f64>,
}

impl StressConfig {
    pub fn get_iterations(&self) -> u64 {
        self.iterations.unwrap_or(DEFAULT_ITERATIONS)
    }

    pub fn get_delay_probability(&self) -> f64 {
        self.delay_probability.unwrap_or(DEFAULT_DELAY_PROBABILITY)
    }

    pub fn get_error_probability(&self) -> f64 {
        self.error_probability.unwrap_or(DEFAULT_ERROR_PROBABILITY)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FixtureConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl FixtureConfig {
    pub fn get_file_count(&self) -> u32 {
        self.file_count.unwrap_or(DEFAULT_FILE_COUNT)
    }

    pub fn get_file_size(&self) -> u64 {
        self.file_size.unwrap_or(DEFAULT_FILE_SIZE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DriverConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_iterations: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interleaved_read_iterations: Option<u64>,
}

impl DriverConfig {
    pub fn get_read_iterations(&self) -> u64 {
        self.read_iterations.unwrap_or(DEFAULT_READ_ITERATIONS)
    }

    pub fn get_interleaved_read_iterations(&self) -> u64 {
        self.interleaved_read_iterations
            .unwrap_or(DEFAULT_INTERLEAVED_READ_ITERATIONS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MountConfig {
    /// How long to wait for the mounted tree to become visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_timeout_ms: Option<u64>,
    /// Command used to release a mount point; the mount directory is appended
    /// as the final argument. Empty means the platform default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unmount_command: Option<Vec<String>>,
}

impl MountConfig {
    pub fn get_ready_timeout_ms(&self) -> u64 {
        self.ready_timeout_ms.unwrap_or(DEFAULT_READY_TIMEOUT_MS)
    }

    pub fn get_unmount_command(&self) -> Vec<String> {
        self.unmount_command.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub stress: StressConfig,
    #[serde(default)]
    pub fixture: FixtureConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub mount: MountConfig,
}

const DEFAULT_ITERATIONS: u64 = 100;
const DEFAULT_DELAY_PROBABILITY: f64 = 0.30;
const DEFAULT_ERROR_PROBABILITY: f64 = 0.30;
const DEFAULT_FILE_COUNT: u32 = 2;
const DEFAULT_FILE_SIZE: u64 = 10_000;
const DEFAULT_READ_ITERATIONS: u64 = 10_000;
const DEFAULT_INTERLEAVED_READ_ITERATIONS: u64 = 1_000;
const DEFAULT_READY_TIMEOUT_MS: u64 = 2_000;

/// Fully-resolved parameters for one `run` invocation: config file defaults
/// overridden by CLI flags, with the seed already drawn.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub fs_binary: PathBuf,
    pub iterations: u64,
    pub delay_probability: f64,
    pub error_probability: f64,
    pub file_count: u32,
    pub file_size: u64,
    pub read_iterations: u64,
    pub interleaved_read_iterations: u64,
    pub ready_timeout: Duration,
    pub unmount_command: Vec<String>,
    pub seed: u64,
}

pub fn validate_config(config: &Config) -> Result<()> {
    validate_probability("delay_probability", config.stress.get_delay_probability())?;
    validate_probability("error_probability", config.stress.get_error_probability())?;

    if config.fixture.get_file_count() < 2 {
        return Err(MirrorcheckError::Config(
            "fixture.file_count must be at least 2 (the rename scenarios need two files)"
                .to_string(),
        ));
    }

    if config.fixture.get_file_size() == 0 {
        return Err(MirrorcheckError::Config(
            "fixture.file_size must be at least 1 byte".to_string(),
        ));
    }

    if config.driver.get_read_iterations() == 0 || config.driver.get_interleaved_read_iterations() == 0
    {
        return Err(MirrorcheckError::Config(
            "driver iteration counts must be at least 1".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_probability(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(MirrorcheckError::Config(format!(
            "{} must be a probability in [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

pub fn get_config_dir() -> Result<PathBuf> {
    if let Ok(config_dir) = std::env::var("MIRRORCHECK_CONFIG_DIR") {
        return Ok(PathBuf::from(config_dir));
    }

    let project_dirs = ProjectDirs::from("com", "mirrorcheck", "mirrorcheck").ok_or_else(|| {
        MirrorcheckError::Config("Could not determine config directory".to_string())
    })?;

    Ok(project_dirs.config_dir().to_path_buf())
}

pub fn get_config_path() -> PathBuf {
    if let Ok(config_dir) = get_config_dir() {
        return config_dir.join("config.toml");
    }
    let project_dirs = ProjectDirs::from("com", "mirrorcheck", "mirrorcheck")
        .expect("Could not determine config directory");
    project_dirs.config_dir().join("config.toml")
}

pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir()?;
    let config_path = config_dir.join("config.toml");

    let config = if !config_path.exists() {
        // Skip the prompt and auto-create in these contexts:
        // - MIRRORCHECK_TEST_MODE is set (automated tests)
        // - MIRRORCHECK_CONFIG_DIR is set (explicit config path, likely programmatic use)
        // - Non-interactive terminal (piped input)
        let is_test_mode = std::env::var("MIRRORCHECK_TEST_MODE").is_ok();
        let is_explicit_config_dir = std::env::var("MIRRORCHECK_CONFIG_DIR").is_ok();
        let is_non_interactive = !std::io::stdin().is_terminal();

        let should_create = if is_test_mode || is_explicit_config_dir || is_non_interactive {
            true
        } else {
            println!("No config file found at {}", config_path.display());

            let stdin = io::stdin();
            let mut stdout = io::stdout();

            loop {
                print!("Create default config? [y/N]: ");
                stdout.flush().map_err(|e| {
                    MirrorcheckError::Config(format!("Failed to flush stdout: {}", e))
                })?;

                let mut input = String::new();
                stdin.read_line(&mut input).map_err(|e| {
                    MirrorcheckError::Config(format!("Failed to read input: {}", e))
                })?;
                let choice = input.trim().to_lowercase();

                match choice.as_str() {
                    "" | "n" | "no" => break false,
                    "y" | "yes" => break true,
                    _ => eprintln!("Please enter 'y' or 'n'."),
                }
            }
        };

        if should_create {
            save_config(&Config::default())?;
            eprintln!("Created default config at {}", config_path.display());
        }

        Config::default()
    } else {
        let toml_content = std::fs::read_to_string(&config_path)
            .map_err(|e| MirrorcheckError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&toml_content)
            .map_err(|e| MirrorcheckError::Config(format!("Failed to parse config: {}", e)))?
    };

    validate_config(&config)?;
    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    let config_dir = get_config_dir()?;
    let config_path = config_dir.join("config.toml");

    std::fs::create_dir_all(&config_dir).map_err(|e| {
        MirrorcheckError::Config(format!(
            "Failed to create config directory {}: {}",
            config_dir.display(),
            e
        ))
    })?;

    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| MirrorcheckError::Config(format!("Failed to serialize config: {}", e)))?;

    std::fs::write(&config_path, toml_str)
        .map_err(|e| MirrorcheckError::Config(format!("Failed to write config file: {}", e)))?;

    Ok(())
}

/// Resolve the platform unmount command when the config does not override it.
/// `fusermount -u` is the FUSE-standard release path on Linux; macOS has no
/// fusermount and uses diskutil instead.
pub fn platform_unmount_command() -> Vec<String> {
    if cfg!(target_os = "macos") {
        vec![
            "diskutil".to_string(),
            "unmount".to_string(),
            "force".to_string(),
        ]
    } else {
        vec!["fusermount".to_string(), "-u".to_string()]
    }
}

/// Resolve an unmount command: config override first, platform default otherwise.
pub fn resolve_unmount_command(config: &Config) -> Vec<String> {
    let configured = config.mount.get_unmount_command();
    if configured.is_empty() {
        platform_unmount_command()
    } else {
        configured
    }
}
