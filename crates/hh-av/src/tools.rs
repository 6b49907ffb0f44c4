//! External tool detection and management.
//!
//! The [`ToolRegistry`] discovers and caches the location of ffmpeg and
//! provides lookup methods for the conversion actions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Known tool names that the registry manages.
const KNOWN_TOOLS: &[&str] = &["ffmpeg"];

/// Configuration for a single external tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Human-readable tool name (e.g. "ffmpeg").
    pub name: String,
    /// Resolved path to the executable.
    pub path: PathBuf,
}

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of `-version` output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool configurations.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolConfig>,
}

impl ToolRegistry {
    /// Discover tools by searching `PATH` (or using overrides from config).
    ///
    /// If [`hh_core::config::ToolsConfig`] supplies a custom path **and**
    /// that path exists, it is used directly. Otherwise [`which::which`] is
    /// used to locate the tool in `PATH`. Tools that are not found are
    /// omitted from the registry.
    pub fn discover(tools_config: &hh_core::config::ToolsConfig) -> Self {
        let mut tools = HashMap::new();

        for &name in KNOWN_TOOLS {
            let custom_path = match name {
                "ffmpeg" => tools_config.ffmpeg_path.as_deref(),
                _ => None,
            };

            let resolved = match custom_path {
                Some(p) if p.exists() => Some(p.to_path_buf()),
                Some(p) => {
                    tracing::warn!(
                        "Configured {name} path {} does not exist; searching PATH",
                        p.display()
                    );
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            if let Some(path) = resolved {
                tools.insert(
                    name.to_string(),
                    ToolConfig {
                        name: name.to_string(),
                        path,
                    },
                );
            }
        }

        Self { tools }
    }

    /// A registry that knows no tools at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register (or replace) a tool at an explicit path.
    pub fn with_tool(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.tools.insert(
            name.to_string(),
            ToolConfig {
                name: name.to_string(),
                path: path.into(),
            },
        );
        self
    }

    /// Return a reference to the [`ToolConfig`] for the given tool, or
    /// [`hh_core::Error::ToolMissing`] if the tool was not found.
    pub fn require(&self, name: &str) -> hh_core::Result<&ToolConfig> {
        self.tools
            .get(name)
            .ok_or_else(|| hh_core::Error::tool_missing(name))
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(cfg) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(&cfg.path),
                    path: Some(cfg.path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("-version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hh_core::config::ToolsConfig;

    #[test]
    fn discover_with_default_config() {
        let cfg = ToolsConfig::default();
        let registry = ToolRegistry::discover(&cfg);
        // We cannot guarantee ffmpeg is installed in CI,
        // but the call itself must not panic.
        let _ = registry.check_all();
    }

    #[test]
    fn require_missing_tool_returns_error() {
        let registry = ToolRegistry::empty();
        let result = registry.require("ffmpeg");
        assert!(matches!(
            result,
            Err(hh_core::Error::ToolMissing { ref tool }) if tool == "ffmpeg"
        ));
    }

    #[test]
    fn explicit_tool_is_returned() {
        let registry = ToolRegistry::empty().with_tool("ffmpeg", "/opt/ffmpeg/bin/ffmpeg");
        let cfg = registry.require("ffmpeg").unwrap();
        assert_eq!(cfg.path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
    }

    #[test]
    fn existing_configured_path_wins() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let cfg = ToolsConfig {
            ffmpeg_path: Some(file.path().to_path_buf()),
        };
        let registry = ToolRegistry::discover(&cfg);
        assert_eq!(registry.require("ffmpeg").unwrap().path, file.path());
    }

    #[test]
    fn check_all_reports_missing_tool() {
        let infos = ToolRegistry::empty().check_all();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].name, "ffmpeg");
        assert!(!infos[0].available);
        assert!(infos[0].path.is_none());
    }

    #[test]
    fn tool_info_serialization() {
        let info = ToolInfo {
            name: "ffmpeg".to_string(),
            available: true,
            version: Some("ffmpeg version 7.1".to_string()),
            path: Some(PathBuf::from("/usr/bin/ffmpeg")),
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("ffmpeg version 7.1"));
        let back: ToolInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "ffmpeg");
    }
}
