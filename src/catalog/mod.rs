use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse catalog at {path}: {source}")]
    JsonFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// One published version of a package as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionRecord {
    pub timestamp: String,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

/// A package together with every version the snapshot knows about.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    #[serde(default)]
    pub versions: BTreeMap<String, VersionRecord>,
}

impl PackageRecord {
    pub fn release_count(&self) -> usize {
        self.versions.len()
    }
}

/// A read-only, in-memory registry snapshot: the parsed form of the
/// `{"pkgs": [...]}` catalog document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(rename = "pkgs")]
    packages: Vec<PackageRecord>,
}

impl Catalog {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| CatalogError::JsonFile {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageRecord> {
        self.packages.iter()
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn release_count(&self) -> usize {
        self.packages.iter().map(PackageRecord::release_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::Catalog;

    #[test]
    fn parses_the_wire_document() {
        let catalog = Catalog::from_json(
            r#"{
                "pkgs": [
                    {
                        "name": "a",
                        "versions": {
                            "1.0.0": {
                                "timestamp": "2020-01-01T00:00:00Z",
                                "dependencies": {"b": ">= 1.0.0"}
                            }
                        }
                    },
                    {
                        "name": "b",
                        "versions": {
                            "1.0.0": {"timestamp": "2019-01-01T00:00:00Z"}
                        }
                    }
                ]
            }"#,
        )
        .expect("parse catalog");

        assert_eq!(catalog.package_count(), 2);
        assert_eq!(catalog.release_count(), 2);
        let a = catalog.packages().find(|pkg| pkg.name == "a").expect("a");
        let record = a.versions.get("1.0.0").expect("a 1.0.0");
        assert_eq!(record.timestamp, "2020-01-01T00:00:00Z");
        assert_eq!(
            record.dependencies.get("b").map(String::as_str),
            Some(">= 1.0.0")
        );
    }

    #[test]
    fn missing_dependencies_default_to_empty() {
        let catalog = Catalog::from_json(
            r#"{"pkgs": [{"name": "solo", "versions": {"0.1.0": {"timestamp": "2021-05-01T12:00:00Z"}}}]}"#,
        )
        .expect("parse catalog");
        let solo = catalog.packages().next().expect("solo package");
        let record = solo.versions.get("0.1.0").expect("solo 0.1.0");
        assert!(record.dependencies.is_empty());
    }

    #[test]
    fn malformed_documents_error() {
        assert!(Catalog::from_json("{").is_err());
        assert!(Catalog::from_json(r#"{"pkgs": [{"versions": {}}]}"#).is_err());
    }
}
