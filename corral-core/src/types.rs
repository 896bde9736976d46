//! Core type definitions with strong typing and validation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::{Error, Result};

/// Identity of a resource controller
///
/// The string form is the directory name of the controller under the
/// hierarchy root. Ordering follows declaration order, which is the order
/// controllers are applied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerName {
    /// CPU scheduling
    Cpu,
    /// CPU accounting
    Cpuacct,
    /// Memory
    Memory,
    /// Process numbers
    Pids,
}

impl ControllerName {
    /// Every known controller, in application order
    pub const ALL: [Self; 4] = [Self::Cpu, Self::Cpuacct, Self::Memory, Self::Pids];

    /// Directory name of this controller
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Cpuacct => "cpuacct",
            Self::Memory => "memory",
            Self::Pids => "pids",
        }
    }
}

impl fmt::Display for ControllerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ControllerName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| Error::InvalidConfig {
                message: format!("unknown controller `{s}`"),
            })
    }
}

/// Relative path of one managed entity inside a controller tree
///
/// Joined onto each controller root, so it must never escape it: `..`
/// components are rejected and a leading `/` is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityPath(PathBuf);

impl EntityPath {
    /// Maximum length for entity paths
    pub const MAX_LENGTH: usize = 255;

    /// Create a new `EntityPath` with validation
    ///
    /// # Errors
    /// Returns error if the path is empty, too long, climbs out of the
    /// controller root, or contains invalid characters
    pub fn new(path: impl AsRef<str>) -> Result<Self> {
        let raw = path.as_ref();

        if raw.len() > Self::MAX_LENGTH {
            return Err(Error::InvalidConfig {
                message: format!("Entity path too long (max {} chars)", Self::MAX_LENGTH),
            });
        }

        let mut normalized = PathBuf::new();
        for component in Path::new(raw).components() {
            match component {
                Component::RootDir | Component::CurDir => {}
                Component::Normal(segment) => {
                    let segment = segment.to_str().unwrap_or_default();
                    Self::validate_segment(segment)?;
                    normalized.push(segment);
                }
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(Error::InvalidConfig {
                        message: format!("Entity path `{raw}` escapes the controller root"),
                    });
                }
            }
        }

        if normalized.as_os_str().is_empty() {
            return Err(Error::InvalidConfig {
                message: "Entity path cannot be empty".to_string(),
            });
        }

        Ok(Self(normalized))
    }

    fn validate_segment(segment: &str) -> Result<()> {
        if segment.is_empty()
            || !segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
        {
            return Err(Error::InvalidConfig {
                message: format!(
                    "Entity path segment `{segment}` can only contain alphanumeric, dash, underscore, dot, and colon"
                ),
            });
        }
        Ok(())
    }

    /// Get the entity path as a `Path`
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for EntityPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl FromStr for EntityPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for EntityPath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<EntityPath> for String {
    fn from(path: EntityPath) -> Self {
        path.0.to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_name_round_trip() {
        for name in ControllerName::ALL {
            assert_eq!(name.as_str().parse::<ControllerName>().unwrap(), name);
        }
        assert!("blkio".parse::<ControllerName>().is_err());
    }

    #[test]
    fn test_controller_name_order() {
        let mut names = vec![ControllerName::Pids, ControllerName::Cpu, ControllerName::Memory];
        names.sort();
        assert_eq!(
            names,
            vec![ControllerName::Cpu, ControllerName::Memory, ControllerName::Pids]
        );
    }

    #[test]
    fn test_entity_path_validation() {
        assert!(EntityPath::new("web-1").is_ok());
        assert!(EntityPath::new("corral/web_1.scope").is_ok());
        assert!(EntityPath::new("").is_err());
        assert!(EntityPath::new("/").is_err());
        assert!(EntityPath::new("../escape").is_err());
        assert!(EntityPath::new("a/../../b").is_err());
        assert!(EntityPath::new("with space").is_err());
        assert!(EntityPath::new("a".repeat(256)).is_err());
    }

    #[test]
    fn test_entity_path_normalization() {
        let path = EntityPath::new("/corral/./web-1/").unwrap();
        assert_eq!(path.as_path(), Path::new("corral/web-1"));
        assert_eq!(path.to_string(), "corral/web-1");
    }

    #[test]
    fn test_entity_path_serde() {
        let path = EntityPath::new("corral/db").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"corral/db\"");
        let deserialized: EntityPath = serde_json::from_str(&json).unwrap();
        assert_eq!(path, deserialized);
        assert!(serde_json::from_str::<EntityPath>("\"../x\"").is_err());
    }
}
