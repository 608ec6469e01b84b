//! Parser configuration.
//!
//! A `ParserConfig` is consulted before a parse begins and is never mutated
//! while one is running. It can be built in code or read from a settings file:
//!
//! ```text
//! # comment
//! feature synthesize-ancestors false
//! property element-case upper
//! property raw-text-elements script style
//! ```

use std::collections::BTreeSet;
use std::str::FromStr;

use thiserror::Error;

use crate::rules::RAW_TEXT_ELEMENTS;

/// Case normalization applied to scanned names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NameCase {
    #[default]
    Lower,
    Upper,
    Preserve,
}

impl NameCase {
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Lower => name.to_ascii_lowercase(),
            Self::Upper => name.to_ascii_uppercase(),
            Self::Preserve => name.to_string(),
        }
    }
}

impl FromStr for NameCase {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "lower" => Ok(Self::Lower),
            "upper" => Ok(Self::Upper),
            "preserve" | "match" => Ok(Self::Preserve),
            _ => Err(ConfigError::InvalidValue {
                id: "name case".to_string(),
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct ParserConfig {
    /// Insert missing ancestors (`tbody` for a bare `tr`, `body` for flow
    /// content, ...). When off, elements are pushed under whatever is open.
    pub synthesize_ancestors: bool,
    /// Never synthesize `html`, `head` or `body`.
    pub document_fragment: bool,
    /// Lower-cased names of elements whose content is not scanned for markup.
    pub raw_text_elements: BTreeSet<String>,
    /// Forward recovery notices to the error sink.
    pub report_errors: bool,
    pub element_case: NameCase,
    pub attribute_case: NameCase,
    /// Report `<![CDATA[..]]>` as text instead of a bogus comment.
    pub cdata_sections: bool,
    /// Absorb `</html>` and `</body>`; both elements close at end of input.
    pub ignore_root_end_tags: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            synthesize_ancestors: true,
            document_fragment: false,
            raw_text_elements: RAW_TEXT_ELEMENTS.iter().map(|s| s.to_string()).collect(),
            report_errors: false,
            element_case: NameCase::Lower,
            attribute_case: NameCase::Lower,
            cdata_sections: false,
            ignore_root_end_tags: true,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("line {line}: expected `feature <id> <value>` or `property <id> <value>`")]
    Malformed { line: usize },
    #[error("unknown feature `{0}`")]
    UnknownFeature(String),
    #[error("unknown property `{0}`")]
    UnknownProperty(String),
    #[error("invalid value `{value}` for `{id}`")]
    InvalidValue { id: String, value: String },
}

impl ParserConfig {
    /// Whether `name` (any case) switches the scanner into raw-text mode.
    pub fn is_raw_text(&self, name: &str) -> bool {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            self.raw_text_elements.contains(&name.to_ascii_lowercase())
        } else {
            self.raw_text_elements.contains(name)
        }
    }

    pub fn set_feature(&mut self, id: &str, value: bool) -> Result<(), ConfigError> {
        let slot = match id {
            "synthesize-ancestors" | "balance-tags" => &mut self.synthesize_ancestors,
            "document-fragment" => &mut self.document_fragment,
            "report-errors" => &mut self.report_errors,
            "cdata-sections" => &mut self.cdata_sections,
            "ignore-root-end-tags" => &mut self.ignore_root_end_tags,
            _ => return Err(ConfigError::UnknownFeature(id.to_string())),
        };
        *slot = value;
        Ok(())
    }

    pub fn set_property(&mut self, id: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |e: ConfigError| match e {
            ConfigError::InvalidValue { value, .. } => ConfigError::InvalidValue {
                id: id.to_string(),
                value,
            },
            other => other,
        };
        match id {
            "element-case" => self.element_case = value.parse().map_err(invalid)?,
            "attribute-case" => self.attribute_case = value.parse().map_err(invalid)?,
            "raw-text-elements" => {
                self.raw_text_elements = value
                    .split([',', ' ', '\t'])
                    .filter(|name| !name.is_empty())
                    .map(str::to_ascii_lowercase)
                    .collect();
            }
            _ => return Err(ConfigError::UnknownProperty(id.to_string())),
        }
        Ok(())
    }

    /// Applies a settings file on top of `self`.
    ///
    /// Blank lines and lines starting with `#` are skipped. Values after the
    /// id run to the end of the line.
    pub fn apply_settings(&mut self, settings: &str) -> Result<(), ConfigError> {
        for (index, raw) in settings.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let malformed = || ConfigError::Malformed { line: index + 1 };
            let (kind, rest) = line.split_once(char::is_whitespace).ok_or_else(malformed)?;
            let (id, value) = rest
                .trim_start()
                .split_once(char::is_whitespace)
                .ok_or_else(malformed)?;
            let value = value.trim();
            match kind {
                "feature" => {
                    let flag = parse_bool(value).ok_or_else(|| ConfigError::InvalidValue {
                        id: id.to_string(),
                        value: value.to_string(),
                    })?;
                    self.set_feature(id, flag)?;
                }
                "property" => self.set_property(id, value)?,
                _ => return Err(malformed()),
            }
        }
        Ok(())
    }

    pub fn from_settings(settings: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_settings(settings)?;
        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "on" | "1" => Some(true),
        "false" | "off" | "0" => Some(false),
        _ => None,
    }
}
