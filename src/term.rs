//! Glossary terms. [`RawTerm`] is a record as it appears in the glossary
//! JSON; [`Term`] is the normalized form handed to the rendering layer.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A collection a term belongs to, e.g. `{"collection": "Attention"}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub collection: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A year written either as a number or as a string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Year {
    Number(serde_json::Number),
    Text(String),
}

impl Year {
    fn into_string(self) -> String {
        match self {
            Year::Number(n) => n.to_string(),
            Year::Text(s) => s,
        }
    }
}

/// A glossary record as read from JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTerm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub collections: Option<Vec<Collection>>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub source_title: Option<String>,
    #[serde(default)]
    pub introduced_year: Option<Year>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A normalized glossary term.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub name: Option<String>,

    /// Falls back to `name` when missing or empty.
    pub full_name: Option<String>,

    /// Empty when the raw record has none.
    pub description: Option<String>,
    pub collections: Vec<Collection>,
    pub source_url: Option<String>,
    pub source_title: Option<String>,

    /// Always a string; numeric years are stringified.
    pub introduced_year: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

/// Normalizes a raw record. A missing record yields `None`.
pub fn to_term(raw: Option<&RawTerm>) -> Option<Term> {
    let raw = raw?.clone();
    Some(Term {
        full_name: non_empty(raw.full_name).or_else(|| raw.name.clone()),
        description: Some(raw.description.unwrap_or_default()),
        collections: raw.collections.unwrap_or_default(),
        source_url: non_empty(raw.source_url),
        source_title: non_empty(raw.source_title),
        introduced_year: non_empty(raw.introduced_year.map(Year::into_string)),
        name: raw.name,
        url: raw.url,
        extra: raw.extra,
    })
}

/// Normalizes every present record, preserving order.
pub fn to_terms(raws: &[Option<RawTerm>]) -> Vec<Term> {
    raws.iter().filter_map(|raw| to_term(raw.as_ref())).collect()
}

/// Reads a glossary file, a JSON array of raw terms (`null` entries
/// allowed), and normalizes it.
pub fn load_glossary(path: &Path) -> Result<Vec<Term>> {
    let file = File::open(path).map_err(|err| Error::Open {
        path: path.to_owned(),
        err,
    })?;
    let raws: Vec<Option<RawTerm>> = serde_json::from_reader(BufReader::new(file))?;
    tracing::debug!("loaded {} glossary terms from {}", raws.len(), path.display());
    Ok(to_terms(&raws))
}

/// The result of a fallible glossary operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the glossary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the glossary file can't be opened.
    #[error("opening glossary `{}`", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when the glossary isn't a JSON array of terms.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw(value: Value) -> RawTerm {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_to_term_fallbacks() {
        let term = to_term(Some(&raw(json!({
            "name": "Attention",
            "full_name": null,
            "introduced_year": 2014,
            "id": 7,
        }))))
        .unwrap();

        assert_eq!(Some("Attention".to_owned()), term.full_name);
        assert_eq!(Some(String::new()), term.description);
        assert_eq!(Some("2014".to_owned()), term.introduced_year);
        assert!(term.collections.is_empty());
        assert_eq!(None, term.source_url);
        assert_eq!(Some(&json!(7)), term.extra.get("id"));
    }

    #[test]
    fn test_to_term_keeps_present_fields() {
        let term = to_term(Some(&raw(json!({
            "name": "GAN",
            "full_name": "Generative Adversarial Network",
            "description": "Two networks play a game.",
            "introduced_year": "2014",
            "collections": [{"collection": "Generative Models"}],
            "source_url": "https://arxiv.org/abs/1406.2661",
            "url": "https://example.com/gan",
        }))))
        .unwrap();

        assert_eq!(
            Some("Generative Adversarial Network".to_owned()),
            term.full_name
        );
        assert_eq!(Some("2014".to_owned()), term.introduced_year);
        assert_eq!("Generative Models", term.collections[0].collection);
        assert_eq!(
            Some("https://arxiv.org/abs/1406.2661".to_owned()),
            term.source_url
        );
        assert_eq!(Some("https://example.com/gan".to_owned()), term.url);
    }

    #[test]
    fn test_to_terms_skips_missing() {
        let raws = vec![None, Some(raw(json!({"name": "Dropout"})))];
        let terms = to_terms(&raws);
        assert_eq!(1, terms.len());
        assert_eq!(Some("Dropout".to_owned()), terms[0].name);
        assert_eq!(None, to_term(None));
    }

    #[test]
    fn test_load_glossary() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("glossary.json");
        std::fs::write(&path, r#"[{"name": "ReLU", "introduced_year": 2010}, null]"#)?;

        let terms = load_glossary(&path)?;
        assert_eq!(1, terms.len());
        assert_eq!(Some("2010".to_owned()), terms[0].introduced_year);

        assert!(matches!(
            load_glossary(&dir.path().join("missing.json")),
            Err(Error::Open { .. })
        ));
        Ok(())
    }
}
