//! The library code for the `tailblaze` content pipeline. The architecture
//! can be generally broken down into two distinct steps:
//!
//! 1. Reading content files from disk into normalized frontmatter records
//!    ([`crate::corpus`])
//! 2. Deriving artifacts from those records ([`crate::build`])
//!
//! The first step is the more involved. Each Markdown file of a content type
//! is split into frontmatter and body ([`crate::frontmatter`]), its summary
//! and reading time are derived, its slug is taken from its path, and its
//! date is normalized to a reference timezone ([`crate::date`]). Records
//! with both a slug and a date become [`crate::post::Post`]s.
//!
//! The second step loads the corpus once and emits the RSS feeds
//! ([`crate::feed`]) and the sitemap ([`crate::sitemap`]) from that single
//! snapshot. Tag indices ([`crate::tag`]) and pagination
//! ([`crate::pagination`]) are exposed for the rendering layer.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod corpus;
pub mod date;
pub mod feed;
pub mod files;
pub mod frontmatter;
pub mod markdown;
pub mod pagination;
pub mod post;
pub mod sitemap;
pub mod tag;
pub mod term;
