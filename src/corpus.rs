//! The corpus aggregator: reads every content file of a content type (e.g.
//! `blog`, `notes`, `authors`) under a [`ContentRoot`] and turns it into
//! normalized frontmatter records.
//!
//! Records are normalized the same way whether they come from a full scan
//! ([`Corpus::get_all_front_matter`]) or a single lookup
//! ([`Corpus::get_file_by_slug`]): the slug is derived from the file path,
//! the date is re-projected through the corpus' [`DateNormalizer`], and a
//! missing title becomes empty.

use std::fs;
use std::path::{Path, PathBuf};

use crate::date::DateNormalizer;
use crate::files::{self, format_slug, is_markdown};
use crate::frontmatter::{self, extract, RawFrontMatter};
use crate::markdown::{toc_headings, Heading};
use crate::post::{to_posts_with_rejections, Post};
use crate::tag::{count_tags, TagCount};

/// The directory holding one subdirectory per content type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentRoot(PathBuf);

impl ContentRoot {
    pub fn new(path: impl Into<PathBuf>) -> ContentRoot {
        ContentRoot(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// The directory for `content_type`, e.g. `{root}/blog`.
    pub fn dir(&self, content_type: &str) -> PathBuf {
        self.0.join(content_type)
    }
}

/// A single content file, as returned by [`Corpus::get_file_by_slug`].
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub front_matter: RawFrontMatter,

    /// The headings of the body, in document order.
    pub toc: Vec<Heading>,

    /// The Markdown body, without frontmatter.
    pub body: String,
}

/// Reads content files from a [`ContentRoot`].
#[derive(Clone, Debug)]
pub struct Corpus {
    root: ContentRoot,
    dates: DateNormalizer,
}

impl Corpus {
    pub fn new(root: ContentRoot, dates: DateNormalizer) -> Corpus {
        Corpus { root, dates }
    }

    pub fn root(&self) -> &ContentRoot {
        &self.root
    }

    pub fn dates(&self) -> &DateNormalizer {
        &self.dates
    }

    /// Lists every file of `content_type`, relative to its directory and
    /// sorted. A missing directory yields an empty list.
    pub fn get_files(&self, content_type: &str) -> Result<Vec<String>> {
        let mut files = files::list_files(&self.root.dir(content_type))?;
        files.sort();
        Ok(files)
    }

    /// Reads and normalizes the frontmatter of every non-draft Markdown
    /// file of `content_type`, newest first. Records without a date sort
    /// last; ties keep file-name order.
    pub fn get_all_front_matter(&self, content_type: &str) -> Result<Vec<RawFrontMatter>> {
        let dir = self.root.dir(content_type);
        let mut all_front_matter = Vec::new();

        for file_name in self.get_files(content_type)? {
            if !is_markdown(&file_name) {
                continue;
            }
            let path = dir.join(&file_name);
            let mut front_matter = annotate(&path, || {
                Ok(extract(&read_source(&path)?)?.front_matter)
            })?;

            if front_matter.is_draft() {
                tracing::debug!("skipping draft {}/{}", content_type, file_name);
                continue;
            }

            front_matter.slug = Some(format_slug(&file_name).to_owned());
            front_matter.raw_date = front_matter.date.clone();
            front_matter.date = self.normalize_date(&file_name, front_matter.date.take());
            front_matter.external = front_matter.external.take().filter(|url| !url.is_empty());
            front_matter.file_name = file_name;
            tracing::debug!("loaded {}/{}", content_type, front_matter.file_name);
            all_front_matter.push(front_matter);
        }

        // `sort_by` is stable
        all_front_matter.sort_by(|a, b| {
            let a = a.date.as_deref().unwrap_or("");
            let b = b.date.as_deref().unwrap_or("");
            b.cmp(a)
        });
        Ok(all_front_matter)
    }

    /// Like [`Corpus::get_all_front_matter`], keeping only the records that
    /// make valid [`Post`]s. Dropped records are logged.
    pub fn get_posts(&self, content_type: &str) -> Result<Vec<Post>> {
        let (posts, rejections) = to_posts_with_rejections(&self.get_all_front_matter(content_type)?);
        for rejection in rejections {
            tracing::warn!(
                "excluding {}/{}: {}",
                content_type,
                rejection.file_name,
                rejection.reason
            );
        }
        Ok(posts)
    }

    /// Counts the kebab-cased tags of every non-draft Markdown file of
    /// `content_type`. Only the frontmatter block is read.
    pub fn get_all_tags(&self, content_type: &str) -> Result<TagCount> {
        let mut records = Vec::new();
        for file_name in self.get_files(content_type)? {
            if is_markdown(&file_name) {
                records.push(self.read_front_matter(content_type, &file_name)?);
            }
        }
        Ok(count_tags(&records))
    }

    /// Parses just the frontmatter block of one file, without any
    /// normalization.
    pub fn read_front_matter(&self, content_type: &str, file_name: &str) -> Result<RawFrontMatter> {
        let path = self.root.dir(content_type).join(file_name);
        annotate(&path, || {
            let source = read_source(&path)?;
            let (yaml, _) = frontmatter::split(&source)?;
            Ok(RawFrontMatter::from_yaml(yaml)?)
        })
    }

    /// Loads one file by slug, preferring `{slug}.mdx` over `{slug}.md`.
    /// Drafts are returned like any other file.
    pub fn get_file_by_slug(&self, content_type: &str, slug: &str) -> Result<Document> {
        let dir = self.root.dir(content_type);
        let file_name = ["mdx", "md"]
            .iter()
            .map(|ext| format!("{}.{}", slug, ext))
            .find(|file_name| dir.join(file_name).is_file())
            .ok_or_else(|| Error::NotFound {
                content_type: content_type.to_owned(),
                slug: slug.to_owned(),
            })?;

        let path = dir.join(&file_name);
        let extracted = annotate(&path, || Ok(extract(&read_source(&path)?)?))?;

        let mut front_matter = extracted.front_matter;
        front_matter.slug = Some(slug.to_owned());
        front_matter.raw_date = front_matter.date.clone();
        front_matter.date = self.normalize_date(&file_name, front_matter.date.take());
        front_matter.file_name = file_name;

        Ok(Document {
            toc: toc_headings(&extracted.body),
            front_matter,
            body: extracted.body,
        })
    }

    /// Resolves the authors of a record (`["default"]` when none are
    /// listed) to their `authors/{name}` files.
    pub fn author_details(&self, front_matter: &RawFrontMatter) -> Result<Vec<RawFrontMatter>> {
        front_matter
            .author_names()
            .iter()
            .map(|name| Ok(self.get_file_by_slug("authors", name)?.front_matter))
            .collect()
    }

    // Unparseable dates are logged and dropped, which keeps the record out
    // of post collections.
    fn normalize_date(&self, file_name: &str, date: Option<String>) -> Option<String> {
        let date = date?;
        match self.dates.normalize(&date) {
            Ok(normalized) => Some(normalized),
            Err(err) => {
                tracing::warn!("{}: {}", file_name, err);
                None
            }
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

fn annotate<T>(path: &Path, f: impl FnOnce() -> Result<T>) -> Result<T> {
    f().map_err(|err| Error::Annotated(format!("reading `{}`", path.display()), Box::new(err)))
}

/// The result of a fallible corpus operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem reading the corpus.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a content directory can't be walked.
    #[error(transparent)]
    Files(#[from] files::Error),

    /// Returned for I/O errors reading content files.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Returned when a file's frontmatter can't be parsed.
    #[error(transparent)]
    FrontMatter(#[from] frontmatter::Error),

    /// Returned when no file matches a slug.
    #[error("no `{content_type}` file with slug `{slug}`")]
    NotFound { content_type: String, slug: String },

    /// Adds the file being processed to an error.
    #[error("{0}")]
    Annotated(String, #[source] Box<Error>),
}
