//! Defines [`RawFrontMatter`], the partially-nullable metadata record read
//! from the YAML header of a content file, and [`extract`], which splits a
//! source file into frontmatter and body and applies the normalization rules
//! every record goes through (image lists, generated summaries, reading
//! time).

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::markdown::{self, ReadingTime};

/// Frontmatter as read from a content file, before it becomes a
/// [`crate::post::Post`]. Known keys are typed; everything else is kept
/// verbatim in [`RawFrontMatter::extra`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFrontMatter {
    /// The title of the entry. Missing or `null` titles become empty.
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,

    /// The entry's date. The corpus replaces this with its normalized
    /// ISO-8601 form, or `None` when absent or unparseable.
    #[serde(default, deserialize_with = "optional_scalar")]
    pub date: Option<String>,

    /// The date exactly as written, kept by the corpus when it normalizes
    /// [`RawFrontMatter::date`].
    #[serde(skip)]
    pub raw_date: Option<String>,

    /// The slug. The corpus derives it from the file path.
    #[serde(default, deserialize_with = "optional_scalar")]
    pub slug: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "optional_list")]
    pub tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "optional_scalar")]
    pub lastmod: Option<String>,

    /// Only the boolean `true` marks a draft; any other value is ignored.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "optional_bool")]
    pub draft: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "optional_scalar")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "optional_list")]
    pub images: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "optional_scalar")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "optional_list")]
    pub authors: Option<Vec<String>>,

    /// Selects the rendering template for the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    /// Marks content whose canonical copy lives on another site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,

    /// An off-site URL the entry links to instead of an internal route.
    /// Always serialized, as `null` when absent.
    #[serde(default)]
    pub external: Option<String>,

    /// The file name relative to the content-type directory.
    #[serde(default)]
    pub file_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<ReadingTime>,

    /// Any frontmatter keys not listed above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl RawFrontMatter {
    /// Parses a YAML frontmatter block. An empty block yields an empty
    /// record.
    pub fn from_yaml(yaml: &str) -> Result<RawFrontMatter> {
        if yaml.trim().is_empty() {
            return Ok(RawFrontMatter::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Whether the entry is excluded from public listings and feeds.
    pub fn is_draft(&self) -> bool {
        self.draft == Some(true)
    }

    /// The entry's authors, `["default"]` when none are listed.
    pub fn author_names(&self) -> Vec<String> {
        match &self.authors {
            Some(authors) if !authors.is_empty() => authors.clone(),
            _ => vec![String::from("default")],
        }
    }
}

// `title: ~` is as good as no title at all.
fn nullable_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_scalar(deserializer)?.unwrap_or_default())
}

// Dates and slugs are sometimes written unquoted (`date: 2024`), which YAML
// reads as a number. Scalars of any kind are accepted as strings.
fn optional_scalar<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value @ (Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_))) => Err(
            D::Error::custom(format!("expected a scalar, found {:?}", value)),
        ),
        Some(value) => Ok(scalar_string(value)),
    }
}

fn scalar_string(value: serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;

    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// `draft: "false"` and friends are not booleans and so not drafts.
fn optional_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        Some(serde_yaml::Value::Bool(b)) => Ok(Some(b)),
        _ => Ok(None),
    }
}

// A bare scalar is a one-item list; non-scalar items are dropped.
fn optional_list<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_yaml::Value;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Sequence(items)) => {
            Ok(Some(items.into_iter().filter_map(scalar_string).collect()))
        }
        Some(other) => Ok(scalar_string(other).map(|item| vec![item])),
    }
}

/// A content file split into its normalized frontmatter and Markdown body.
#[derive(Clone, Debug, PartialEq)]
pub struct Extracted {
    pub front_matter: RawFrontMatter,
    pub body: String,
}

/// Splits `source` into frontmatter and body and applies the normalization
/// rules, in order:
///
/// 1. `image` without `images` becomes `images: [image]`.
/// 2. A missing or empty `summary` is generated from the source (see
///    [`generate_summary`]).
/// 3. Reading time is computed from the body.
///
/// A file that doesn't begin with a `---` fence has empty frontmatter and is
/// all body.
pub fn extract(source: &str) -> Result<Extracted> {
    let (yaml, body) = split(source)?;
    let mut front_matter = RawFrontMatter::from_yaml(yaml)?;

    normalize_images(&mut front_matter);

    if front_matter.summary.as_deref().map_or(true, str::is_empty) {
        let summary = generate_summary(source);
        if !summary.is_empty() {
            front_matter.summary = Some(summary);
        }
    }

    front_matter.reading_time = Some(markdown::reading_time(body));
    Ok(Extracted {
        front_matter,
        body: body.to_owned(),
    })
}

/// Splits `source` into its YAML block and body.
pub fn split(source: &str) -> Result<(&str, &str)> {
    const FENCE: &str = "---";

    let Some(rest) = source.strip_prefix(FENCE) else {
        return Ok(("", source));
    };

    // The closing fence is the next line that starts with `---`.
    let yaml_stop = match rest.strip_prefix(FENCE) {
        Some(_) => 0,
        None => rest.find("\n---").ok_or(Error::MissingEndFence)? + 1,
    };
    let yaml = &rest[..yaml_stop];
    let after_fence = &rest[yaml_stop + FENCE.len()..];
    let body = match after_fence.find('\n') {
        Some(i) => &after_fence[i + 1..],
        None => "",
    };
    Ok((yaml, body))
}

fn normalize_images(front_matter: &mut RawFrontMatter) {
    if front_matter.images.is_none() {
        if let Some(image) = front_matter.image.as_ref().filter(|s| !s.is_empty()) {
            front_matter.images = Some(vec![image.clone()]);
        }
    }
}

/// The number of characters kept from the source before truncating.
pub const SUMMARY_LENGTH: usize = 320;

struct SummaryPatterns {
    link: Regex,
    image: Regex,
    emphasis: Regex,
    front_matter: Regex,
    whitespace: Regex,
}

fn summary_patterns() -> &'static SummaryPatterns {
    static PATTERNS: OnceLock<SummaryPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| SummaryPatterns {
        link: Regex::new(r"\[(.*?)\]\((.*?)\)").expect("valid regex"),
        image: Regex::new(r"!\[(.*?)\]\((.*?)\)").expect("valid regex"),
        emphasis: Regex::new(r"[_*]").expect("valid regex"),
        front_matter: Regex::new(r"(?s)---.*---[ \t]*\r?\n?").expect("valid regex"),
        whitespace: Regex::new(r"\s+").expect("valid regex"),
    })
}

/// Derives a plain-text summary from a whole source file (frontmatter
/// included):
///
/// * links `[text](url)` become `text`, images `![alt](url)` become `alt`;
/// * `_` and `*` are removed;
/// * the frontmatter block is removed;
/// * paragraph breaks become spaces;
/// * the first [`SUMMARY_LENGTH`] characters are kept, followed by `...`
///   when that limit was reached;
/// * whitespace is trimmed and collapsed.
///
/// Truncation counts characters, not graphemes.
pub fn generate_summary(source: &str) -> String {
    let patterns = summary_patterns();

    let summary = patterns.link.replace_all(source, "$1");
    let summary = patterns.image.replace_all(&summary, "$1");
    let summary = patterns.emphasis.replace_all(&summary, "");
    let summary = patterns.front_matter.replace(&summary, "");
    let summary = summary.replace("\n\n", " ");

    let mut truncated: String = summary.chars().take(SUMMARY_LENGTH).collect();
    if truncated.chars().count() >= SUMMARY_LENGTH {
        truncated.push_str("...");
    }

    patterns
        .whitespace
        .replace_all(truncated.trim(), " ")
        .into_owned()
}

/// The result of a fallible frontmatter operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem reading a content file's frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the opening `---` fence has no matching closing fence.
    #[error("missing closing `---`")]
    MissingEndFence,

    /// Returned when the frontmatter isn't valid YAML or doesn't fit
    /// [`RawFrontMatter`].
    #[error(transparent)]
    DeserializeYaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split() -> Result<()> {
        let (yaml, body) = split("---\ntitle: Hello\n---\n# Hi\n")?;
        assert_eq!("\ntitle: Hello\n", yaml);
        assert_eq!("# Hi\n", body);

        let (yaml, body) = split("no frontmatter here")?;
        assert_eq!("", yaml);
        assert_eq!("no frontmatter here", body);
        Ok(())
    }

    #[test]
    fn test_split_missing_end_fence() {
        assert!(matches!(
            split("---\ntitle: Hello\n"),
            Err(Error::MissingEndFence)
        ));
    }

    #[test]
    fn test_extra_fields_are_preserved() -> Result<()> {
        let front_matter = RawFrontMatter::from_yaml(
            "title: Hello\ndate: 2024-01-01\ncanonicalUrl: https://elsewhere.dev/x\nseries: intro\n",
        )?;
        assert_eq!("Hello", front_matter.title);
        assert_eq!(Some("2024-01-01".to_owned()), front_matter.date);
        assert_eq!(
            Some("https://elsewhere.dev/x".to_owned()),
            front_matter.canonical_url
        );
        assert_eq!(
            Some(&serde_yaml::Value::String("intro".to_owned())),
            front_matter.extra.get("series")
        );
        Ok(())
    }

    #[test]
    fn test_missing_title_is_empty() -> Result<()> {
        assert_eq!("", RawFrontMatter::from_yaml("title: ~\n")?.title);
        assert_eq!("", RawFrontMatter::from_yaml("draft: true\n")?.title);
        Ok(())
    }

    #[test]
    fn test_numeric_date_is_a_string() -> Result<()> {
        let front_matter = RawFrontMatter::from_yaml("date: 2024\n")?;
        assert_eq!(Some("2024".to_owned()), front_matter.date);
        Ok(())
    }

    #[test]
    fn test_loosely_typed_fields() -> Result<()> {
        let front_matter = RawFrontMatter::from_yaml(
            "draft: \"true\"\ntags: rust\nimages: [/a.png, {src: /b.png}]\nsummary: 42\n",
        )?;
        assert_eq!(None, front_matter.draft);
        assert!(!front_matter.is_draft());
        assert_eq!(Some(vec!["rust".to_owned()]), front_matter.tags);
        assert_eq!(Some(vec!["/a.png".to_owned()]), front_matter.images);
        assert_eq!(Some("42".to_owned()), front_matter.summary);

        assert!(RawFrontMatter::from_yaml("draft: true\n")?.is_draft());
        Ok(())
    }

    #[test]
    fn test_image_becomes_images() -> Result<()> {
        let extracted = extract("---\nimage: /static/a.png\nsummary: s\n---\nbody\n")?;
        assert_eq!(
            Some(vec!["/static/a.png".to_owned()]),
            extracted.front_matter.images
        );

        let extracted =
            extract("---\nimage: /static/a.png\nimages: [/static/b.png]\nsummary: s\n---\n")?;
        assert_eq!(
            Some(vec!["/static/b.png".to_owned()]),
            extracted.front_matter.images
        );
        Ok(())
    }

    #[test]
    fn test_explicit_summary_is_kept() -> Result<()> {
        let extracted = extract("---\nsummary: Short and sweet\n---\nA much longer body.\n")?;
        assert_eq!(
            Some("Short and sweet".to_owned()),
            extracted.front_matter.summary
        );
        Ok(())
    }

    #[test]
    fn test_generate_summary_strips_markdown() {
        let source = "---\ntitle: Links\n---\nSee [the docs](https://docs.rs) and ![a cat](cat.png).\n\n_Really_ **important**.\n";
        assert_eq!(
            "See the docs and !a cat. Really important.",
            generate_summary(source)
        );
    }

    #[test]
    fn test_generate_summary_truncates() {
        let body = "a".repeat(400);
        let source = format!("---\ntitle: Long\n---\n{}", body);
        let summary = generate_summary(&source);
        assert_eq!(323, summary.chars().count());
        assert_eq!(format!("{}...", "a".repeat(320)), summary);
    }

    #[test]
    fn test_generate_summary_collapses_whitespace() {
        let source = "---\ntitle: Spaces\n---\none   two\nthree\t\tfour\n";
        assert_eq!("one two three four", generate_summary(source));
    }

    #[test]
    fn test_generate_summary_empty_source() -> Result<()> {
        assert_eq!("", generate_summary(""));
        let extracted = extract("---\ntitle: Empty\n---\n")?;
        assert_eq!(None, extracted.front_matter.summary);
        Ok(())
    }

    #[test]
    fn test_author_names_default() -> Result<()> {
        assert_eq!(
            vec!["default".to_owned()],
            RawFrontMatter::default().author_names()
        );
        let front_matter = RawFrontMatter::from_yaml("authors: [ada]\n")?;
        assert_eq!(vec!["ada".to_owned()], front_matter.author_names());
        Ok(())
    }
}
