//! Program launching, keystroke automation and folder creation

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;

use super::{Automation, Filesystem, find_program, run_command};
use crate::{Error, Result};

/// Launches programs and types via `xdotool`, `osascript` or `SendKeys`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAutomation;

impl SystemAutomation {
    /// Create an automation driver
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Automation for SystemAutomation {
    async fn launch(&self, executable: &str) -> Result<()> {
        let executable = executable.trim();
        if executable.is_empty() {
            return Err(Error::Launch("no program name given".to_string()));
        }

        if which::which(executable).is_err() && cfg!(target_os = "macos") {
            // App bundles are not on PATH
            return run_command("open", &["-a", executable], Error::Launch).await;
        }

        // never through a shell
        let child = tokio::process::Command::new(executable)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Launch(format!("{executable}: {e}")))?;

        tracing::info!(executable, pid = ?child.id(), "launched program");
        Ok(())
    }

    async fn type_text(&self, window: &str, text: &str) -> Result<()> {
        tracing::debug!(window, chars = text.chars().count(), "typing text");

        if cfg!(target_os = "windows") {
            let script = format!(
                "$w = New-Object -ComObject WScript.Shell; \
                 if (-not $w.AppActivate('{}')) {{ exit 2 }}; \
                 Start-Sleep -Milliseconds 200; $w.SendKeys('{}')",
                powershell_quote(window),
                powershell_quote(&escape_send_keys(text)),
            );
            run_command("powershell", &["-NoProfile", "-Command", &script], Error::Automation).await
        } else if cfg!(target_os = "macos") {
            let activate = format!("tell application \"{}\" to activate", applescript_quote(window));
            let keystroke = format!(
                "tell application \"System Events\" to keystroke \"{}\"",
                applescript_quote(text)
            );
            run_command(
                "osascript",
                &["-e", &activate, "-e", &keystroke],
                Error::Automation,
            )
            .await
        } else {
            let xdotool = find_program(&["xdotool"])
                .ok_or_else(|| Error::Automation("xdotool not found on PATH".to_string()))?;
            run_command(
                xdotool,
                &[
                    "search", "--sync", "--onlyvisible", "--name", window, "windowactivate",
                    "--sync", "type", "--delay", "100", "--", text,
                ],
                Error::Automation,
            )
            .await
        }
    }
}

/// Executable for a known application name
///
/// Unknown names pass through unchanged; on Windows a missing extension
/// becomes `.exe`.
#[must_use]
pub fn executable_for(name: &str, editor: &str) -> String {
    let name = name.trim();

    let mapped = match name {
        "notepad" => editor,
        "calculator" if cfg!(target_os = "windows") => "calc",
        "calculator" if cfg!(target_os = "macos") => "Calculator",
        "calculator" => "gnome-calculator",
        "chrome" if cfg!(target_os = "macos") => "Google Chrome",
        "chrome" if cfg!(target_os = "linux") => "google-chrome",
        "spotify" if cfg!(target_os = "macos") => "Spotify",
        other => other,
    };

    if cfg!(target_os = "windows") && Path::new(mapped).extension().is_none() {
        format!("{mapped}.exe")
    } else {
        mapped.to_string()
    }
}

/// Creates folders under a base directory
#[derive(Debug, Clone)]
pub struct LocalFilesystem {
    base: PathBuf,
}

impl LocalFilesystem {
    /// Create folders relative to `base`
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Create folders relative to the working directory
    #[must_use]
    pub fn current_dir() -> Self {
        Self::new(".")
    }
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn create_directory(&self, name: &str) -> Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Filesystem("folder name is empty".to_string()));
        }

        let path = self.base.join(name);
        tokio::fs::create_dir(&path)
            .await
            .map_err(|e| Error::Filesystem(format!("{}: {e}", path.display())))?;

        tracing::info!(path = %path.display(), "created folder");
        Ok(path)
    }
}

/// Escape characters `SendKeys` treats as modifiers or groups
fn escape_send_keys(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '+' | '^' | '%' | '~' | '(' | ')' | '{' | '}' | '[' | ']' => {
                escaped.push('{');
                escaped.push(c);
                escaped.push('}');
            }
            '\n' => escaped.push_str("{ENTER}"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn powershell_quote(text: &str) -> String {
    text.replace('\'', "''")
}

fn applescript_quote(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
