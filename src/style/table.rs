//! Font substitution table.
//!
//! The table is plain data so it can be versioned, shipped as JSON, and
//! tested exhaustively. Keys are normalized family names (see
//! [`normalize_family`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::FontClass;

/// Current table layout version.
pub const FONT_TABLE_VERSION: u32 = 1;

/// A substring rule used when a family is not listed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub class: FontClass,
}

impl KeywordRule {
    pub fn new(keyword: &str, class: FontClass) -> Self {
        Self {
            keyword: keyword.to_string(),
            class,
        }
    }
}

/// Renderable family used for each class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassFamilies {
    pub sans: String,
    pub serif: String,
    pub mono: String,
}

impl ClassFamilies {
    pub fn get(&self, class: FontClass) -> &str {
        match class {
            FontClass::Sans => &self.sans,
            FontClass::Serif => &self.serif,
            FontClass::Mono => &self.mono,
        }
    }
}

impl Default for ClassFamilies {
    fn default() -> Self {
        Self {
            sans: "Helvetica".to_string(),
            serif: "Times".to_string(),
            mono: "Courier".to_string(),
        }
    }
}

/// Family name → class configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontTable {
    pub version: u32,
    /// Families rendered without substitution (renderable or metric-compatible)
    pub exact: BTreeMap<String, FontClass>,
    /// Known families that must be substituted, with their lineage class
    pub lineage: BTreeMap<String, FontClass>,
    /// Ordered substring rules; the first match wins
    pub keywords: Vec<KeywordRule>,
    /// Class → renderable family
    pub families: ClassFamilies,
    /// Class used when nothing else applies
    pub default_class: FontClass,
}

impl FontTable {
    /// Parse a table from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let table: FontTable = serde_json::from_str(json)
            .map_err(|e| Error::Decode(format!("font table: {}", e)))?;
        if table.version > FONT_TABLE_VERSION {
            return Err(Error::Decode(format!(
                "font table version {} is newer than supported version {}",
                table.version, FONT_TABLE_VERSION
            )));
        }
        Ok(table)
    }

    /// Serialize the table as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
    }

    /// Class for a normalized family name and whether it needs substitution.
    pub fn classify(&self, normalized: &str) -> Option<(FontClass, bool)> {
        if let Some(class) = self.exact.get(normalized) {
            return Some((*class, false));
        }
        if let Some(class) = self.lineage.get(normalized) {
            return Some((*class, true));
        }
        self.keywords
            .iter()
            .find(|rule| normalized.contains(rule.keyword.as_str()))
            .map(|rule| (rule.class, true))
    }
}

impl Default for FontTable {
    fn default() -> Self {
        use FontClass::*;

        let exact = [
            ("helvetica", Sans),
            ("arial", Sans),
            ("arimo", Sans),
            ("helveticaneue", Sans),
            ("liberationsans", Sans),
            ("nimbussans", Sans),
            ("nimbussansl", Sans),
            ("times", Serif),
            ("timesroman", Serif),
            ("timesnewroman", Serif),
            ("tinos", Serif),
            ("liberationserif", Serif),
            ("nimbusroman", Serif),
            ("nimbusromanno9l", Serif),
            ("courier", Mono),
            ("couriernew", Mono),
            ("cousine", Mono),
            ("liberationmono", Mono),
            ("nimbusmono", Mono),
        ];

        let lineage = [
            ("georgia", Serif),
            ("garamond", Serif),
            ("ebgaramond", Serif),
            ("cambria", Serif),
            ("palatino", Serif),
            ("palatinolinotype", Serif),
            ("bookantiqua", Serif),
            ("baskerville", Serif),
            ("didot", Serif),
            ("calibri", Sans),
            ("verdana", Sans),
            ("tahoma", Sans),
            ("segoeui", Sans),
            ("trebuchet", Sans),
            ("trebuchetms", Sans),
            ("opensans", Sans),
            ("roboto", Sans),
            ("lato", Sans),
            ("futura", Sans),
            ("gillsans", Sans),
            ("dejavusans", Sans),
            ("consolas", Mono),
            ("monaco", Mono),
            ("menlo", Mono),
            ("lucidaconsole", Mono),
            ("sourcecodepro", Mono),
            ("dejavusansmono", Mono),
            ("firacode", Mono),
        ];

        // "sans" is checked before "serif" so "sansserif" lands in Sans.
        let keywords = vec![
            KeywordRule::new("mono", Mono),
            KeywordRule::new("courier", Mono),
            KeywordRule::new("code", Mono),
            KeywordRule::new("console", Mono),
            KeywordRule::new("typewriter", Mono),
            KeywordRule::new("sans", Sans),
            KeywordRule::new("serif", Serif),
            KeywordRule::new("times", Serif),
            KeywordRule::new("roman", Serif),
            KeywordRule::new("garamond", Serif),
            KeywordRule::new("arial", Sans),
            KeywordRule::new("helvetica", Sans),
            KeywordRule::new("gothic", Sans),
            KeywordRule::new("grotesk", Sans),
        ];

        Self {
            version: FONT_TABLE_VERSION,
            exact: exact.iter().map(|(k, c)| (k.to_string(), *c)).collect(),
            lineage: lineage.iter().map(|(k, c)| (k.to_string(), *c)).collect(),
            keywords,
            families: ClassFamilies::default(),
            default_class: Sans,
        }
    }
}

/// Normalize a declared family name for table lookup.
///
/// Strips a subset prefix (`ABCDEF+`), any style suffix after `-` or `,`,
/// whitespace and underscores, and trailing `MT`/`PS`/`PSMT` vendor tags.
pub fn normalize_family(name: &str) -> String {
    let name = strip_subset_prefix(name.trim());
    let base = name.split(['-', ',']).next().unwrap_or(name);

    let mut normalized: String = base
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect();

    for tag in ["psmt", "mt", "ps"] {
        if normalized.len() > tag.len() + 3 && normalized.ends_with(tag) {
            normalized.truncate(normalized.len() - tag.len());
            break;
        }
    }

    normalized
}

/// Remove a `ABCDEF+` subset tag from an embedded font name.
pub fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_family() {
        assert_eq!(normalize_family("Arial-BoldMT"), "arial");
        assert_eq!(normalize_family("TimesNewRomanPSMT"), "timesnewroman");
        assert_eq!(normalize_family("ABCDEF+Calibri-Bold"), "calibri");
        assert_eq!(normalize_family("Times New Roman,Bold"), "timesnewroman");
        assert_eq!(normalize_family("Helvetica Neue"), "helveticaneue");
        assert_eq!(normalize_family("Times-Roman"), "times");
        assert_eq!(normalize_family("NimbusMonoPS-Regular"), "nimbusmono");
        assert_eq!(normalize_family(""), "");
    }

    #[test]
    fn test_strip_subset_prefix() {
        assert_eq!(strip_subset_prefix("BAAAAA+Georgia"), "Georgia");
        assert_eq!(strip_subset_prefix("abc+Georgia"), "abc+Georgia");
        assert_eq!(strip_subset_prefix("Georgia"), "Georgia");
    }

    #[test]
    fn test_classify() {
        let table = FontTable::default();
        assert_eq!(table.classify("arial"), Some((FontClass::Sans, false)));
        assert_eq!(table.classify("georgia"), Some((FontClass::Serif, true)));
        assert_eq!(table.classify("consolas"), Some((FontClass::Mono, true)));
        assert_eq!(table.classify("notosansserif"), Some((FontClass::Sans, true)));
        assert_eq!(table.classify("ptserif"), Some((FontClass::Serif, true)));
        assert_eq!(table.classify("jetbrainsmono"), Some((FontClass::Mono, true)));
        assert_eq!(table.classify("wingdings"), None);
    }

    #[test]
    fn test_json_roundtrip() {
        let table = FontTable::default();
        let json = table.to_json().unwrap();
        assert!(json.contains("\"defaultClass\""));
        let back = FontTable::from_json(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_rejects_newer_version() {
        let mut table = FontTable::default();
        table.version = FONT_TABLE_VERSION + 1;
        let json = serde_json::to_string(&table).unwrap();
        assert!(matches!(FontTable::from_json(&json), Err(Error::Decode(_))));
    }
}
