use anyhow::Result;
use which::which;

/// Version string shown by `driftool --version`: clean semver on release
/// builds, annotated with branch/commit for dev builds. See `build.rs`.
pub const VERSION: &str = env!("DRIFTOOL_VERSION_DISPLAY");

pub mod artifact;
pub mod config;
pub mod core;
pub mod git;
pub mod logging;
pub mod output;
pub mod styles;
pub mod utils;

/// Checks that the external tools driftool shells out to are available.
pub fn check_dependencies() -> Result<()> {
    if which("git").is_err() {
        anyhow::bail!("Missing required dependency: git");
    }
    Ok(())
}
