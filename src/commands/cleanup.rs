use crate::config::{resolve_unmount_command, Config};
use crate::error::Result;
use crate::mount;

pub fn cleanup_stale(config: &Config) -> Result<()> {
    let unmount_command = resolve_unmount_command(config);
    mount::cleanup_stale_mounts(&unmount_command);
    Ok(())
}
