//! Launch the signer's page in the system browser.

use std::process::Command;

use anyhow::{Context, Result, bail};

/// Open `url` with the platform's default handler.
///
/// Only `http` and `https` URLs are launched; anything else is refused so a
/// crafted `signatureUrl` cannot run a local handler.
///
/// # Errors
///
/// Returns an error for non-web URLs or when the launcher cannot be spawned.
pub fn open(url: &str) -> Result<()> {
    ensure_web_url(url)?;
    launcher(url)
        .spawn()
        .with_context(|| format!("failed to launch a browser for {url}"))?;
    tracing::debug!(url, "browser launched");
    Ok(())
}

/// Accept only a single-token `http(s)` URL.
///
/// Whitespace, control characters and quotes are refused because they change
/// how a launcher's command line is split.
pub fn ensure_web_url(url: &str) -> Result<()> {
    let lower = url.to_ascii_lowercase();
    if !(lower.starts_with("https://") || lower.starts_with("http://")) {
        bail!("refusing to open '{url}': only http(s) URLs are supported");
    }
    if url
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || c == '"')
    {
        bail!("refusing to open '{url}': URL contains whitespace, quotes or control characters");
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn launcher(url: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
}

// `cmd /C start` would re-parse the URL and treat `&` as a separator.
#[cfg(target_os = "windows")]
fn launcher(url: &str) -> Command {
    let mut cmd = Command::new("rundll32");
    cmd.args(["url.dll,FileProtocolHandler", url]);
    cmd
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn launcher(url: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_web_urls() {
        assert!(ensure_web_url("https://esign/sig_1").is_ok());
        assert!(ensure_web_url("HTTP://localhost:3000/sign").is_ok());
    }

    #[test]
    fn rejects_urls_that_split_on_a_command_line() {
        for url in [
            "https://esign/sig 1",
            "https://esign/sig_1\ncalc",
            "https://esign/\"sig_1\"",
            " https://esign/sig_1",
        ] {
            assert!(ensure_web_url(url).is_err(), "{url:?}");
        }
    }

    #[test]
    fn launcher_passes_url_as_one_argument_without_a_shell() {
        let url = "https://x/?a=1&calc|dir^";
        assert!(ensure_web_url(url).is_ok());

        let cmd = launcher(url);
        assert_ne!(cmd.get_program(), "cmd");
        let last = cmd.get_args().last().unwrap();
        assert_eq!(last, url);
    }

    #[test]
    fn rejects_other_schemes() {
        for url in ["file:///etc/passwd", "javascript:alert(1)", "", "esign/sig_1"] {
            assert!(ensure_web_url(url).is_err(), "{url}");
        }
    }
}
