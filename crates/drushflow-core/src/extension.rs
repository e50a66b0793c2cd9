//! Drupal extensions (modules, themes, install profiles) as reported by `drush pm-list`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DrushError;

/// One installed extension, keyed by machine name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extension {
    pub name: String,
    /// Module, theme or profile, as drush spells it.
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    /// Free-form release string such as `7.x-2.5`.
    pub version: String,
}

impl Extension {
    pub fn is_enabled(&self) -> bool {
        self.status.eq_ignore_ascii_case("enabled")
    }
}

#[derive(Debug, Deserialize)]
struct ListingEntry {
    #[serde(rename = "type")]
    kind: String,
    status: String,
    #[serde(default)]
    version: Option<String>,
}

/// Parses `drush pm-list --pipe --format=json` output into records keyed by name.
///
/// PHP encodes an empty listing as `[]`, which is accepted as no extensions.
pub fn parse_extensions(text: &str) -> Result<BTreeMap<String, Extension>, DrushError> {
    let document: Value = serde_json::from_str(text).map_err(|source| DrushError::Malformed {
        what: "extension listing",
        source,
    })?;

    let entries = match document {
        Value::Object(entries) => entries,
        Value::Array(items) if items.is_empty() => return Ok(BTreeMap::new()),
        _ => {
            return Err(DrushError::UnexpectedShape {
                what: "extension listing",
                expected: "object",
            })
        }
    };

    entries
        .into_iter()
        .map(|(name, value)| {
            let entry: ListingEntry =
                serde_json::from_value(value).map_err(|source| DrushError::Malformed {
                    what: "extension listing entry",
                    source,
                })?;
            let extension = Extension {
                name: name.clone(),
                kind: entry.kind,
                status: entry.status,
                version: entry.version.unwrap_or_default(),
            };
            Ok((name, extension))
        })
        .collect()
}
