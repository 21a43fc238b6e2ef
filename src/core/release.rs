use std::fmt;

use serde::Serialize;

/// A concrete published release of a package. The timestamp is kept in its
/// RFC3339 wire form; consumers that need an instant parse it on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Release {
    pub name: String,
    pub version: String,
    pub timestamp: String,
}

impl Release {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.name, &self.version)
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// The composite `name-version` key a release is looked up by.
pub fn fingerprint(name: &str, version: &str) -> String {
    format!("{name}-{version}")
}
