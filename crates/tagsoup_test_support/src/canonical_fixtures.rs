//! TOML fixtures pairing HTML input with its expected canonical output.
//!
//! ```toml
//! format = "tagsoup-canonical-v1"
//!
//! [[cases]]
//! id = "auto-close-p"
//! input = "<p>one<p>two"
//! settings = "feature document-fragment true"   # optional
//! expected = """
//! (p
//! "one
//! )p
//! """
//! notices = ["auto-closed"]                      # optional
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

pub const CANONICAL_FORMAT_V1: &str = "tagsoup-canonical-v1";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CanonicalCase {
    pub id: String,
    pub input: String,
    /// Settings-file text applied on top of the default configuration.
    #[serde(default)]
    pub settings: Option<String>,
    pub expected: String,
    /// Expected notice labels, in order. `None` skips the check.
    #[serde(default)]
    pub notices: Option<Vec<String>>,
}

impl CanonicalCase {
    pub fn expected_lines(&self) -> Vec<String> {
        self.expected.lines().map(str::to_string).collect()
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureFile {
    format: String,
    cases: Vec<CanonicalCase>,
}

/// Parses fixture text, panicking with context on malformed input.
pub fn parse_fixtures(text: &str, origin: &str) -> Vec<CanonicalCase> {
    let file: FixtureFile = toml::from_str(text)
        .unwrap_or_else(|err| panic!("failed to parse canonical fixtures {origin}: {err}"));
    assert_eq!(
        file.format, CANONICAL_FORMAT_V1,
        "unsupported fixture format in {origin}"
    );
    let mut seen = std::collections::BTreeSet::new();
    for case in &file.cases {
        assert!(
            seen.insert(case.id.as_str()),
            "duplicate fixture id '{}' in {origin}",
            case.id
        );
    }
    file.cases
}

pub fn load_fixtures(path: &Path) -> Vec<CanonicalCase> {
    let text = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
    parse_fixtures(&text, &path.display().to_string())
}
