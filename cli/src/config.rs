//! TOML job file for the rewrite command, plus the built-in settings
//! template rendered when only a server URL is given.

use std::fs;
use std::path::{Path, PathBuf};

use obbkit_core::{ObbError, Result};
use serde::Deserialize;

/// Everything a rewrite invocation needs. Command-line flags override
/// values read from the file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RewriteConfig {
    pub archive: Option<PathBuf>,
    pub password: Option<String>,
    pub entry: Option<String>,
    pub content_file: Option<PathBuf>,
    pub server_url: Option<String>,
    pub scratch: Option<PathBuf>,
}

pub fn parse_config(path: &Path) -> Result<RewriteConfig> {
    let text = fs::read_to_string(path)
        .map_err(|e| ObbError::IoContext(path.display().to_string(), e))?;
    toml::from_str(&text)
        .map_err(|e| ObbError::Unexpected(format!("Invalid job file {}: {}", path.display(), e)))
}

/// Condensed settings body written for offline or third-party-server play.
/// The core treats this as opaque bytes; only the CLI knows its shape.
pub fn render_settings(server_url: &str) -> String {
    format!(
        r#"######## WebView ########
[webview]
url = ""

######## Server #########
[server]
serverUrl = "{server_url}"
startPhp = "start.php"
dataSync = "sync.php"
infoPhp = "info.php"
songInfoPhp = "song_info.php"
resultPhp = "result.php"
savePhp = "save.php"
loadPhp = "load.php"

######## APP ###########
[application]
versionFile = "/Library/Caches/version2.cfg"
"#
    )
}
