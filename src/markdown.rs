//! Markdown-derived metadata: the table of contents and reading time of a
//! content body. Both walk the [`pulldown_cmark`] event stream rather than
//! the raw text so that link targets, image URLs, and markup don't count as
//! prose.

use std::collections::HashMap;

use pulldown_cmark::{Event, Options, Parser, Tag};
use serde::{Deserialize, Serialize};

fn parser(markdown: &str) -> Parser<'_, '_> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    Parser::new_ext(markdown, options)
}

/// A table-of-contents entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// The heading's plain text.
    pub value: String,

    /// 1 for `#`, 2 for `##`, and so on.
    pub depth: u32,

    /// The in-page anchor, e.g. `#getting-started`.
    pub url: String,
}

/// Collects every heading in `markdown`, in document order. Anchors are
/// kebab-cased; repeated anchors get `-1`, `-2`, ... suffixes.
pub fn toc_headings(markdown: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut current: Option<(u32, String)> = None;

    for event in parser(markdown) {
        match event {
            Event::Start(Tag::Heading(level, _, _)) => {
                current = Some((level as u32, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, value)) = current.as_mut() {
                    value.push_str(&text);
                }
            }
            Event::End(Tag::Heading(..)) => {
                if let Some((depth, value)) = current.take() {
                    let anchor = unique_anchor(&mut seen, slug::slugify(&value));
                    headings.push(Heading {
                        value,
                        depth,
                        url: format!("#{}", anchor),
                    });
                }
            }
            _ => {}
        }
    }
    headings
}

fn unique_anchor(seen: &mut HashMap<String, usize>, anchor: String) -> String {
    let count = seen.entry(anchor.clone()).or_insert(0);
    let unique = match *count {
        0 => anchor,
        n => format!("{}-{}", anchor, n),
    };
    *count += 1;
    unique
}

/// Words read per minute.
pub const WORDS_PER_MINUTE: f64 = 200.0;

/// An estimate of how long a body takes to read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadingTime {
    /// e.g. `3 min read`.
    pub text: String,
    pub minutes: f64,

    /// Milliseconds.
    pub time: u64,
    pub words: usize,
}

impl ReadingTime {
    pub fn from_words(words: usize) -> ReadingTime {
        let minutes = words as f64 / WORDS_PER_MINUTE;
        let displayed = ((minutes * 100.0).round() / 100.0).ceil() as u64;
        ReadingTime {
            text: format!("{} min read", displayed),
            minutes,
            time: (minutes * 60_000.0).round() as u64,
            words,
        }
    }
}

/// Estimates the reading time of a Markdown body.
pub fn reading_time(markdown: &str) -> ReadingTime {
    let mut words = 0;
    for event in parser(markdown) {
        if let Event::Text(text) | Event::Code(text) = event {
            words += count_words(&text);
        }
    }
    ReadingTime::from_words(words)
}

/// Counts whitespace-separated words. CJK characters are written without
/// spaces, so each one counts as a word of its own.
pub fn count_words(text: &str) -> usize {
    let mut words = 0;
    let mut in_word = false;
    for c in text.chars() {
        if is_cjk(c) {
            words += 1;
            in_word = false;
        } else if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            words += 1;
            in_word = true;
        }
    }
    words
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF    // hiragana, katakana
        | 0x3400..=0x4DBF  // CJK extension A
        | 0x4E00..=0x9FFF  // CJK unified ideographs
        | 0xAC00..=0xD7AF  // hangul syllables
        | 0xF900..=0xFAFF  // CJK compatibility ideographs
    )
}
