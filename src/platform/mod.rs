//! Operating-system collaborators
//!
//! Each side effect the dispatcher performs goes through one of the traits
//! below so the routing logic can be exercised with recording fakes. The
//! `System*` implementations drive the desktop via platform tools
//! (`xdg-open`, `xdotool`, `pactl`, `osascript`, PowerShell, ...).

mod browser;
mod controls;
mod desktop;

use std::path::PathBuf;

use async_trait::async_trait;

pub use browser::SystemBrowser;
pub use controls::SystemControls;
pub use desktop::{LocalFilesystem, SystemAutomation, executable_for};

use crate::{Error, Result};

/// Opens URLs in the user's browser
#[async_trait]
pub trait Browser: Send + Sync {
    /// Open a URL, optionally reusing the current tab
    async fn open_url(&self, url: &str, reuse_tab: bool) -> Result<()>;
}

/// Launches programs and types into windows
#[async_trait]
pub trait Automation: Send + Sync {
    /// Start a program without waiting for it to exit
    async fn launch(&self, executable: &str) -> Result<()>;

    /// Type text into the window whose title contains `window`
    async fn type_text(&self, window: &str, text: &str) -> Result<()>;
}

/// Output volume and screen brightness
#[async_trait]
pub trait Controls: Send + Sync {
    /// Set output volume (0-100)
    async fn set_volume(&self, level: u8) -> Result<()>;

    /// Set screen brightness (0-100)
    async fn set_brightness(&self, level: u8) -> Result<()>;
}

/// Directory creation
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Create a single directory, returning its path
    async fn create_directory(&self, name: &str) -> Result<PathBuf>;
}

/// Run a helper program to completion, mapping failures with `wrap`
async fn run_command(program: &str, args: &[&str], wrap: fn(String) -> Error) -> Result<()> {
    tracing::debug!(program, ?args, "running helper");

    let output = tokio::process::Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| wrap(format!("failed to run {program}: {e}")))?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(program, code, stderr = %stderr.trim(), "helper failed");
        return Err(wrap(format!("{program} exited with code {code}")));
    }

    Ok(())
}

/// First helper from `candidates` found on `PATH`
fn find_program<'a>(candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .find(|program| which::which(program).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_command_reports_missing_program() {
        let err = run_command("cs2p-definitely-missing", &[], Error::Automation)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Automation(msg) if msg.contains("cs2p-definitely-missing")));
    }

    #[test]
    fn test_find_program_skips_missing() {
        assert_eq!(find_program(&["cs2p-definitely-missing"]), None);
    }
}
