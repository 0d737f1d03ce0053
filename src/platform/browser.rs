//! Default-browser launcher

use async_trait::async_trait;

use super::{Browser, run_command};
use crate::{Error, Result};

/// Opens URLs with the platform's URL handler
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl SystemBrowser {
    /// Create a browser launcher
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Browser for SystemBrowser {
    async fn open_url(&self, url: &str, reuse_tab: bool) -> Result<()> {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(Error::Browser(format!("refusing to open non-web URL: {url}")));
        }

        // URL handlers decide tab placement themselves
        tracing::info!(url, reuse_tab, "opening browser");

        let (program, args) = url_handler(std::env::consts::OS, url);
        run_command(program, &args, Error::Browser).await
    }
}

/// Program and arguments that hand `url` to the default browser on `os`
///
/// The URL is always a single argument and never passes through a shell.
fn url_handler<'a>(os: &str, url: &'a str) -> (&'static str, Vec<&'a str>) {
    match os {
        "windows" => ("rundll32", vec!["url.dll,FileProtocolHandler", url]),
        "macos" => ("open", vec![url]),
        _ => ("xdg-open", vec![url]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_non_web_urls() {
        let result = SystemBrowser::new().open_url("file:///etc/passwd", false).await;
        assert!(matches!(result, Err(Error::Browser(_))));
    }

    #[test]
    fn test_url_with_shell_metacharacters_stays_one_argument() {
        let url = "https://example.com/?a=1&b=2|x^y";

        let (program, args) = url_handler("windows", url);
        assert_eq!(program, "rundll32");
        assert_eq!(args, ["url.dll,FileProtocolHandler", url]);

        assert_eq!(url_handler("macos", url), ("open", vec![url]));
        assert_eq!(url_handler("linux", url), ("xdg-open", vec![url]));
    }
}
