//! Exports the [`build_site`] function which stitches together the high-level
//! steps of a build: loading a [`Snapshot`] of the corpus, writing the RSS
//! feeds ([`crate::feed`]) and writing the sitemap ([`crate::sitemap`]).
//!
//! Every artifact of a build is derived from the same snapshot, so the feeds
//! and the sitemap always agree about which posts exist.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::corpus::{self, Corpus};
use crate::feed::{self, generate_rss, DEFAULT_FEED_PATH};
use crate::frontmatter::RawFrontMatter;
use crate::post::{to_posts_with_rejections, Post};
use crate::sitemap::{content_entries, render_sitemap, static_entries, tag_entries};
use crate::tag::{count_tags, posts_with_tag, TagCount};

/// The content type feeds are built from.
pub const BLOG: &str = "blog";

/// The normalized records of each loaded content type, read once per build.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    records: BTreeMap<String, Vec<RawFrontMatter>>,
}

impl Snapshot {
    /// Loads every content type in `content_types` through `corpus`.
    pub fn load<S: AsRef<str>>(corpus: &Corpus, content_types: &[S]) -> Result<Snapshot> {
        let mut records = BTreeMap::new();
        for content_type in content_types {
            let content_type = content_type.as_ref();
            if records.contains_key(content_type) {
                continue;
            }
            let loaded = corpus.get_all_front_matter(content_type)?;
            tracing::info!("loaded {} {} entries", loaded.len(), content_type);
            records.insert(content_type.to_owned(), loaded);
        }
        Ok(Snapshot { records })
    }

    /// The records of `content_type`, newest first. Empty if it wasn't
    /// loaded.
    pub fn records(&self, content_type: &str) -> &[RawFrontMatter] {
        self.records
            .get(content_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The valid posts of `content_type`, newest first. Records missing a
    /// slug or a date are logged and left out.
    pub fn posts(&self, content_type: &str) -> Vec<Post> {
        let (posts, rejections) = to_posts_with_rejections(self.records(content_type));
        for rejection in rejections {
            tracing::warn!(
                "excluding {}/{}: {}",
                content_type,
                rejection.file_name,
                rejection.reason
            );
        }
        posts
    }

    /// The tag index of `content_type`.
    pub fn tags(&self, content_type: &str) -> TagCount {
        count_tags(self.records(content_type))
    }
}

/// Loads the snapshot a full build needs: the blog plus every sitemap
/// content type.
pub fn load_snapshot(config: &Config) -> Result<Snapshot> {
    let mut content_types = vec![BLOG.to_owned()];
    content_types.extend(config.sitemap_content_types.iter().cloned());
    Snapshot::load(&config.corpus(), &content_types)
}

/// The tags that get a feed: those carried by at least one blog post.
fn feed_tags(tags: &TagCount, posts: &[Post]) -> Vec<(String, Vec<Post>)> {
    tags.keys()
        .map(|tag| (tag.clone(), posts_with_tag(posts, tag)))
        .filter(|(_, tagged)| !tagged.is_empty())
        .collect()
}

/// Writes `feed.xml` for the whole blog and `tags/{tag}/feed.xml` for each
/// tag. Returns the paths written. With no blog posts nothing is written.
pub fn build_feeds(config: &Config, snapshot: &Snapshot) -> Result<Vec<PathBuf>> {
    let posts = snapshot.posts(BLOG);
    if posts.is_empty() {
        tracing::warn!("no blog posts; skipping feeds");
        return Ok(Vec::new());
    }

    let mut written = Vec::new();
    let xml = generate_rss(&config.site, &posts, DEFAULT_FEED_PATH)?;
    written.push(write_artifact(&config.output_directory, DEFAULT_FEED_PATH, &xml)?);

    for (tag, tagged) in feed_tags(&snapshot.tags(BLOG), &posts) {
        let feed_path = format!("tags/{}/{}", tag, DEFAULT_FEED_PATH);
        let xml = generate_rss(&config.site, &tagged, &feed_path)?;
        written.push(write_artifact(&config.output_directory, &feed_path, &xml)?);
    }
    Ok(written)
}

/// Writes `sitemap.xml`. `build_time` stands in for entries without a date.
pub fn build_sitemap(
    config: &Config,
    snapshot: &Snapshot,
    build_time: DateTime<Utc>,
) -> Result<PathBuf> {
    let mut entries = static_entries(&config.static_routes, build_time);
    for content_type in &config.sitemap_content_types {
        entries.extend(content_entries(
            content_type,
            snapshot.records(content_type),
            config.dates.local,
            build_time,
        ));
    }

    let posts = snapshot.posts(BLOG);
    let tags = feed_tags(&snapshot.tags(BLOG), &posts);
    entries.extend(tag_entries(tags.iter().map(|(tag, _)| tag.as_str()), build_time));

    let xml = render_sitemap(&config.site, &entries);
    write_artifact(&config.output_directory, "sitemap.xml", &xml)
}

/// Builds every artifact from a single snapshot of the corpus.
pub fn build_site(config: &Config) -> Result<()> {
    let snapshot = load_snapshot(config)?;
    build_feeds(config, &snapshot)?;
    build_sitemap(config, &snapshot, Utc::now())?;
    Ok(())
}

fn write_artifact(output_directory: &Path, relative_path: &str, contents: &str) -> Result<PathBuf> {
    let path = output_directory.join(relative_path);
    let write = |path: &Path| -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, contents)
    };
    write(&path).map_err(|err| Error::Write {
        path: path.clone(),
        err,
    })?;
    tracing::info!("wrote {}", path.display());
    Ok(path)
}

/// The result of a fallible build operation.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for errors reading the corpus.
    #[error(transparent)]
    Corpus(#[from] corpus::Error),

    /// Returned for errors generating a feed.
    #[error(transparent)]
    Feed(#[from] feed::Error),

    /// Returned for I/O problems writing an artifact.
    #[error("writing `{}`", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },
}
