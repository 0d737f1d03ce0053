//! Volume and brightness through platform helper programs

use async_trait::async_trait;

use super::{Controls, find_program, run_command};
use crate::{Error, Result};

/// Sets volume and brightness via `pactl`/`amixer`, `brightnessctl`,
/// `osascript`, `nircmd` or WMI
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemControls;

impl SystemControls {
    /// Create a controls driver
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Controls for SystemControls {
    async fn set_volume(&self, level: u8) -> Result<()> {
        let level = level.min(100);
        tracing::info!(level, "setting volume");

        if cfg!(target_os = "windows") {
            // nircmd takes 0-65535
            let scaled = (u32::from(level) * 65535 / 100).to_string();
            run_command("nircmd", &["setsysvolume", &scaled], Error::Automation).await
        } else if cfg!(target_os = "macos") {
            let script = format!("set volume output volume {level}");
            run_command("osascript", &["-e", &script], Error::Automation).await
        } else {
            let percent = format!("{level}%");
            match find_program(&["pactl", "amixer"]) {
                Some("pactl") => {
                    run_command(
                        "pactl",
                        &["set-sink-volume", "@DEFAULT_SINK@", &percent],
                        Error::Automation,
                    )
                    .await
                }
                Some(amixer) => {
                    run_command(amixer, &["-q", "sset", "Master", &percent], Error::Automation)
                        .await
                }
                None => Err(Error::Automation(
                    "neither pactl nor amixer found on PATH".to_string(),
                )),
            }
        }
    }

    async fn set_brightness(&self, level: u8) -> Result<()> {
        let level = level.min(100);
        tracing::info!(level, "setting brightness");

        if cfg!(target_os = "windows") {
            let script = format!(
                "(Get-WmiObject -Namespace root/WMI -Class WmiMonitorBrightnessMethods)\
                 .WmiSetBrightness(1, {level})"
            );
            run_command("powershell", &["-NoProfile", "-Command", &script], Error::Automation).await
        } else if cfg!(target_os = "macos") {
            let fraction = format!("{:.2}", f32::from(level) / 100.0);
            run_command("brightness", &[&fraction], Error::Automation).await
        } else {
            let brightnessctl = find_program(&["brightnessctl"]).ok_or_else(|| {
                Error::Automation("brightnessctl not found on PATH".to_string())
            })?;
            let percent = format!("{level}%");
            run_command(brightnessctl, &["set", &percent], Error::Automation).await
        }
    }
}
