//! Defines [`Post`], the validated form of a [`RawFrontMatter`] record, and
//! the normalizer that produces it. A raw record becomes a post only when it
//! has both a slug and a date; everything else is dropped from post
//! collections. [`to_posts_with_rejections`] reports what was dropped and
//! why.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::frontmatter::RawFrontMatter;
use crate::markdown::ReadingTime;

/// A publishable entry: a frontmatter record with a slug and a normalized
/// date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// The path of the source file relative to its content-type directory,
    /// less the extension, e.g. `2024/hello`.
    pub slug: String,

    /// The normalized date, `YYYY-MM-DDTHH:MM:SS.sssZ`.
    pub date: String,

    pub title: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Serialized as `null` when absent.
    #[serde(default)]
    pub external: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<ReadingTime>,

    #[serde(default)]
    pub file_name: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Post {
    /// The site-relative path of a blog post, e.g. `/blog/2024/hello`.
    pub fn path(&self) -> String {
        format!("/blog/{}", self.slug)
    }

    /// Whether the post links off-site instead of to its own page.
    pub fn is_external(&self) -> bool {
        self.external.as_deref().is_some_and(|url| !url.is_empty())
    }
}

/// Why a raw record didn't become a [`Post`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    MissingSlug,
    MissingDate,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RejectReason::MissingSlug => write!(f, "missing slug"),
            RejectReason::MissingDate => write!(f, "missing date"),
        }
    }
}

/// A record excluded from a post collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub file_name: String,
    pub slug: Option<String>,
    pub reason: RejectReason,
}

fn validate(raw: &RawFrontMatter) -> std::result::Result<Post, RejectReason> {
    let slug = raw.slug.clone().ok_or(RejectReason::MissingSlug)?;
    let date = raw.date.clone().ok_or(RejectReason::MissingDate)?;
    Ok(Post {
        slug,
        date,
        title: raw.title.clone(),
        tags: raw.tags.clone().unwrap_or_default(),
        summary: raw.summary.clone(),
        external: raw.external.clone(),
        images: raw.images.clone(),
        image: raw.image.clone(),
        authors: raw.authors.clone(),
        layout: raw.layout.clone(),
        lastmod: raw.lastmod.clone(),
        canonical_url: raw.canonical_url.clone(),
        draft: raw.draft,
        reading_time: raw.reading_time.clone(),
        file_name: raw.file_name.clone(),
        extra: raw.extra.clone(),
    })
}

/// Converts a raw record into a [`Post`], or `None` when it lacks a slug or
/// a date.
pub fn to_post(raw: &RawFrontMatter) -> Option<Post> {
    validate(raw).ok()
}

/// Converts every valid record, preserving order and silently dropping the
/// rest.
pub fn to_posts(raws: &[RawFrontMatter]) -> Vec<Post> {
    raws.iter().filter_map(to_post).collect()
}

/// Like [`to_posts`], but also returns the records that were dropped.
pub fn to_posts_with_rejections(raws: &[RawFrontMatter]) -> (Vec<Post>, Vec<Rejection>) {
    let mut posts = Vec::with_capacity(raws.len());
    let mut rejections = Vec::new();
    for raw in raws {
        match validate(raw) {
            Ok(post) => posts.push(post),
            Err(reason) => rejections.push(Rejection {
                file_name: raw.file_name.clone(),
                slug: raw.slug.clone(),
                reason,
            }),
        }
    }
    (posts, rejections)
}

/// The posts on either side of a post in a newest-first list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Neighbors<'a> {
    /// The next-older post.
    pub prev: Option<&'a Post>,

    /// The next-newer post.
    pub next: Option<&'a Post>,
}

/// Finds the neighbors of the post with `slug` in `posts`, which must be
/// sorted newest first. Returns `None` if no post has that slug.
pub fn neighbors<'a>(posts: &'a [Post], slug: &str) -> Option<Neighbors<'a>> {
    let index = posts.iter().position(|post| post.slug == slug)?;
    Some(Neighbors {
        prev: posts.get(index + 1),
        next: index.checked_sub(1).and_then(|i| posts.get(i)),
    })
}
