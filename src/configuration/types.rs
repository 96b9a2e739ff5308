use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of vulnerability labs this platform can launch.
///
/// Each variant selects exactly one container image through [`LabCatalog`];
/// there is deliberately no way to run an arbitrary image name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabType {
    Xss,
    Csrf,
}

impl LabType {
    pub const ALL: [LabType; 2] = [LabType::Xss, LabType::Csrf];

    /// Lowercase wire/database representation (`"xss"`, `"csrf"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            LabType::Xss => "xss",
            LabType::Csrf => "csrf",
        }
    }
}

impl fmt::Display for LabType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected lab-type string, carried for error reporting.
#[derive(Debug)]
pub struct UnknownLabType(pub String);

impl fmt::Display for UnknownLabType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid lab type '{}'. Must be \"xss\" or \"csrf\"",
            self.0
        )
    }
}

impl std::error::Error for UnknownLabType {}

impl FromStr for LabType {
    type Err = UnknownLabType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xss" => Ok(LabType::Xss),
            "csrf" => Ok(LabType::Csrf),
            other => Err(UnknownLabType(other.to_string())),
        }
    }
}

/// Fixed mapping from lab type to container image name.
///
/// The mapping is configuration resolved at startup; request handlers only
/// ever pass a [`LabType`] through it, so user input can never name an
/// image directly.
#[derive(Debug, Clone)]
pub struct LabCatalog {
    xss_image: String,
    csrf_image: String,
}

impl LabCatalog {
    pub fn new(xss_image: String, csrf_image: String) -> Self {
        Self {
            xss_image,
            csrf_image,
        }
    }

    pub fn image_for(&self, lab_type: LabType) -> &str {
        match lab_type {
            LabType::Xss => &self.xss_image,
            LabType::Csrf => &self.csrf_image,
        }
    }

    /// All (lab type, image) pairs, used by the startup image preflight.
    pub fn entries(&self) -> Vec<(LabType, &str)> {
        LabType::ALL
            .iter()
            .map(|&t| (t, self.image_for(t)))
            .collect()
    }
}

impl Default for LabCatalog {
    fn default() -> Self {
        Self {
            xss_image: "xss_lab".to_string(),
            csrf_image: "csrf_lab".to_string(),
        }
    }
}
