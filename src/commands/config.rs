use crate::cli::ConfigAction;
use crate::config::{get_config_path, load_config, resolve_unmount_command};
use crate::error::{MirrorcheckError, Result};

pub fn handle_config_command(action: Option<ConfigAction>) -> Result<()> {
    match action {
        Some(ConfigAction::Path) => {
            let config_path = get_config_path();
            println!("Config location: {}", config_path.display());
        }
        None | Some(ConfigAction::Show) => {
            let config_path = get_config_path();
            if !config_path.exists() {
                let _ = load_config()?;
            }
            let config = load_config()?;
            println!("Config file: {}", config_path.display());
            println!();
            println!("Current configuration:");
            println!("  Stress:");
            println!("    iterations: {}", config.stress.get_iterations());
            println!(
                "    delay_probability: {}",
                config.stress.get_delay_probability()
            );
            println!(
                "    error_probability: {}",
                config.stress.get_error_probability()
            );
            println!("  Fixture:");
            println!("    file_count: {}", config.fixture.get_file_count());
            println!("    file_size: {}", config.fixture.get_file_size());
            println!("  Driver:");
            println!(
                "    read_iterations: {}",
                config.driver.get_read_iterations()
            );
            println!(
                "    interleaved_read_iterations: {}",
                config.driver.get_interleaved_read_iterations()
            );
            println!("  Mount:");
            println!(
                "    ready_timeout_ms: {}",
                config.mount.get_ready_timeout_ms()
            );
            println!(
                "    unmount_command: {}",
                resolve_unmount_command(&config).join(" ")
            );
        }
        Some(ConfigAction::Edit) => {
            let config_path = get_config_path();
            if !config_path.exists() {
                let _ = load_config()?;
                println!("Created default config at {}", config_path.display());
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status()
                .map_err(|e| {
                    MirrorcheckError::Config(format!(
                        "Failed to open editor '{}': {}. Set EDITOR environment variable to your preferred editor.",
                        editor, e
                    ))
                })?;

            if !status.success() {
                return Err(MirrorcheckError::Config(format!(
                    "Editor '{}' exited with non-zero status",
                    editor
                )));
            }
        }
    }
    Ok(())
}
