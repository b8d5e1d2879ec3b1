//! Installable resources and the file-name based typing rules

use fileinstall_fs::NormalizedPath;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canonical extension for configuration files written back to disk.
pub const CONFIG_FILE_EXTENSION: &str = ".cfg.json";

/// Extension of key/value configuration files.
pub const PROPERTIES_FILE_EXTENSION: &str = ".cfg";

/// Structured configuration content.
pub type Dictionary = Map<String, Value>;

/// The kind of resource as seen by the installation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// Opaque artifact handed over as raw bytes
    Bundle,
    /// Configuration handed over as a dictionary
    Config,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bundle => write!(f, "bundle"),
            Self::Config => write!(f, "config"),
        }
    }
}

/// Encoding of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.cfg.json`: a JSON object, `//` comment lines allowed
    Json,
    /// `.cfg`: `key=value` lines
    Properties,
}

impl ConfigFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => CONFIG_FILE_EXTENSION,
            Self::Properties => PROPERTIES_FILE_EXTENSION,
        }
    }
}

/// Classification of a monitored file by its name.
///
/// The set is closed: anything that is not a recognised configuration file
/// is an opaque bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Config(ConfigFormat),
    Bundle,
}

impl FileKind {
    /// Classify a path by its file name.
    pub fn from_path(path: &NormalizedPath) -> Self {
        // The longer suffix must win: "a.cfg.json" is JSON, not "a.cfg" + ".json"
        if path.has_suffix(CONFIG_FILE_EXTENSION) {
            Self::Config(ConfigFormat::Json)
        } else if path.has_suffix(PROPERTIES_FILE_EXTENSION) {
            Self::Config(ConfigFormat::Properties)
        } else {
            Self::Bundle
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        match self {
            Self::Config(_) => ResourceType::Config,
            Self::Bundle => ResourceType::Bundle,
        }
    }

    /// Resource identifier for a file at `relative_path`.
    ///
    /// Configurations are identified by their path without the format suffix,
    /// which is also the name write-back uses for new files. Bundles keep the
    /// full relative path.
    pub fn resource_id(&self, relative_path: &str) -> String {
        match self {
            Self::Config(format) => relative_path
                .strip_suffix(format.extension())
                .unwrap_or(relative_path)
                .to_string(),
            Self::Bundle => relative_path.to_string(),
        }
    }
}

/// Payload of an installable resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceContent {
    Bytes(Vec<u8>),
    Dictionary(Dictionary),
}

impl ResourceContent {
    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Self::Dictionary(dict) => Some(dict),
            Self::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Dictionary(_) => None,
        }
    }
}

/// A unit of content registered with the installation pipeline.
///
/// Once handed over, the pipeline owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallableResource {
    pub id: String,
    pub resource_type: ResourceType,
    /// Scheme of the monitor that produced this resource
    pub scheme: String,
    /// Absolute location of the backing file
    pub path: NormalizedPath,
    pub content: ResourceContent,
    /// `sha256:<hex>` of the file bytes
    pub digest: String,
    pub priority: Option<i32>,
}

impl InstallableResource {
    /// `scheme:path`, the address write-back requests refer to.
    pub fn url(&self) -> String {
        format!("{}:{}", self.scheme, self.path)
    }
}

/// Acknowledgement of a successful write-back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    /// `scheme:path` where the resource now lives
    pub url: String,
    /// Whether the resource now lives at a location managed by this handler
    pub moved: bool,
}

impl UpdateResult {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            moved: false,
        }
    }

    pub fn moved(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            moved: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("a.cfg.json", FileKind::Config(ConfigFormat::Json), "a")]
    #[case("sub/dir/b.cfg.json", FileKind::Config(ConfigFormat::Json), "sub/dir/b")]
    #[case("c.cfg", FileKind::Config(ConfigFormat::Properties), "c")]
    #[case("bundle.jar", FileKind::Bundle, "bundle.jar")]
    #[case("notes.json", FileKind::Bundle, "notes.json")]
    #[case("a.properties", FileKind::Bundle, "a.properties")]
    #[case("x.cfg.json.bak", FileKind::Bundle, "x.cfg.json.bak")]
    fn classifies_by_name(#[case] relative: &str, #[case] kind: FileKind, #[case] id: &str) {
        let detected = FileKind::from_path(&NormalizedPath::new(format!("/root/{relative}")));
        assert_eq!(detected, kind);
        assert_eq!(detected.resource_id(relative), id);
    }

    #[test]
    fn config_kind_maps_to_config_type() {
        assert_eq!(FileKind::Config(ConfigFormat::Properties).resource_type(), ResourceType::Config);
        assert_eq!(FileKind::Bundle.resource_type(), ResourceType::Bundle);
    }

    #[test]
    fn resource_url_joins_scheme_and_path() {
        let resource = InstallableResource {
            id: "a".into(),
            resource_type: ResourceType::Config,
            scheme: "fileinstall:ab12".into(),
            path: NormalizedPath::new("/tmp/watch/a.cfg.json"),
            content: ResourceContent::Dictionary(Dictionary::new()),
            digest: "sha256:00".into(),
            priority: None,
        };
        assert_eq!(resource.url(), "fileinstall:ab12:/tmp/watch/a.cfg.json");
    }
}
