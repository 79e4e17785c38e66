//! Native messaging host manifest
//!
//! Browsers only launch a native host that is registered through a manifest naming
//! the executable and the extensions allowed to connect to it.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Name the extension passes to `chrome.runtime.connectNative`
pub const HOST_NAME: &str = "com.footprint.host";

#[derive(Debug, Serialize)]
struct HostManifest {
    name: &'static str,
    description: &'static str,
    path: String,
    #[serde(rename = "type")]
    kind: &'static str,
    allowed_origins: Vec<String>,
}

/// Chrome extension ids are 32 characters from `a` to `p`
fn validate_extension_id(id: &str) -> Result<()> {
    if id.len() == 32 && id.bytes().all(|b| (b'a'..=b'p').contains(&b)) {
        Ok(())
    } else {
        anyhow::bail!("Invalid extension id '{id}': expected 32 characters in a-p")
    }
}

fn build_manifest(extension_id: &str, exe: &Path) -> Result<HostManifest> {
    validate_extension_id(extension_id)?;
    Ok(HostManifest {
        name: HOST_NAME,
        description: "Footprint browser activity tracker",
        path: exe.to_string_lossy().into_owned(),
        kind: "stdio",
        allowed_origins: vec![format!("chrome-extension://{extension_id}/")],
    })
}

/// Directory Chrome searches for per-user host manifests
fn manifest_dir() -> Option<PathBuf> {
    let config = dirs::config_dir()?;
    if cfg!(target_os = "macos") {
        Some(config.join("Google/Chrome/NativeMessagingHosts"))
    } else {
        Some(config.join("google-chrome/NativeMessagingHosts"))
    }
}

pub fn handle_manifest(extension_id: &str, path: Option<PathBuf>) -> Result<()> {
    let exe = match path {
        Some(path) => path,
        None => std::env::current_exe().context("Failed to get executable path")?,
    };
    let manifest = build_manifest(extension_id, &exe)?;
    println!("{}", serde_json::to_string_pretty(&manifest)?);

    if let Some(dir) = manifest_dir() {
        eprintln!(
            "\nSave this as {} to register the host.",
            dir.join(format!("{HOST_NAME}.json")).display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "abcdefghijklmnopabcdefghijklmnop";

    #[test]
    fn test_manifest_shape() {
        let manifest = build_manifest(ID, Path::new("/usr/local/bin/footprint")).unwrap();
        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(value["name"], HOST_NAME);
        assert_eq!(value["type"], "stdio");
        assert_eq!(value["path"], "/usr/local/bin/footprint");
        assert_eq!(
            value["allowed_origins"],
            serde_json::json!([format!("chrome-extension://{ID}/")])
        );
    }

    #[test]
    fn test_rejects_bad_extension_id() {
        assert!(validate_extension_id("short").is_err());
        assert!(validate_extension_id(&"z".repeat(32)).is_err());
        assert!(validate_extension_id(ID).is_ok());
    }
}
