//! Sitemap entries and their XML rendering. Routes come from three places:
//! the configured static routes, the content files of each sitemap content
//! type, and the per-tag feed routes.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::config::SiteMetadata;
use crate::date::{parse_instant, to_iso_string, LocalZone};
use crate::feed::escape;
use crate::frontmatter::RawFrontMatter;

/// How often a route is expected to change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeFreq {
    Daily,
    Weekly,
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChangeFreq::Daily => write!(f, "daily"),
            ChangeFreq::Weekly => write!(f, "weekly"),
        }
    }
}

/// One `<url>` of the sitemap.
#[derive(Clone, Debug, PartialEq)]
pub struct SitemapEntry {
    /// The site-relative route; the home page is the empty route.
    pub route: String,
    pub lastmod: DateTime<Utc>,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

impl SitemapEntry {
    /// Creates an entry, deriving its priority and change frequency from the
    /// route: the home page and the blog index are `1.0`/daily, blog posts
    /// `0.8`/weekly, everything else `0.7`/weekly.
    pub fn new(route: &str, lastmod: DateTime<Utc>) -> SitemapEntry {
        let route = normalize_route(route);
        let (priority, changefreq) = match route.as_str() {
            "" | "/blog" => (1.0, ChangeFreq::Daily),
            r if r.starts_with("/blog/") => (0.8, ChangeFreq::Weekly),
            _ => (0.7, ChangeFreq::Weekly),
        };
        SitemapEntry {
            route,
            lastmod,
            changefreq,
            priority,
        }
    }
}

/// Maps `/` and `/index` to the empty home route.
pub fn normalize_route(route: &str) -> String {
    match route {
        "/" | "/index" => String::new(),
        _ => route.to_owned(),
    }
}

/// Entries for routes without a backing content file.
pub fn static_entries(routes: &[String], build_time: DateTime<Utc>) -> Vec<SitemapEntry> {
    routes
        .iter()
        .map(|route| SitemapEntry::new(route, build_time))
        .collect()
}

/// Entries for the records of one content type, at `/{content_type}/{slug}`.
/// Drafts, records published elsewhere (with a `canonicalUrl`) and records
/// without a slug are left out.
pub fn content_entries(
    content_type: &str,
    records: &[RawFrontMatter],
    local: LocalZone,
    build_time: DateTime<Utc>,
) -> Vec<SitemapEntry> {
    records
        .iter()
        .filter(|record| !record.is_draft())
        .filter(|record| record.canonical_url.as_deref().map_or(true, str::is_empty))
        .filter_map(|record| {
            let slug = record.slug.as_deref()?;
            Some(SitemapEntry::new(
                &format!("/{}/{}", content_type, slug),
                lastmod(record, local, build_time),
            ))
        })
        .collect()
}

/// Entries for tag routes, `/tags/{tag}`.
pub fn tag_entries<'a>(
    tags: impl IntoIterator<Item = &'a str>,
    build_time: DateTime<Utc>,
) -> Vec<SitemapEntry> {
    tags.into_iter()
        .map(|tag| SitemapEntry::new(&format!("/tags/{}", tag), build_time))
        .collect()
}

// Both dates are parsed as written, without timezone re-projection. Records
// not read through a corpus have no `raw_date` and use `date`.
fn lastmod(record: &RawFrontMatter, local: LocalZone, build_time: DateTime<Utc>) -> DateTime<Utc> {
    let date = record.raw_date.as_deref().or(record.date.as_deref());
    [record.lastmod.as_deref(), date]
        .into_iter()
        .flatten()
        .find_map(|value| match parse_instant(value, local) {
            Ok(instant) => Some(instant),
            Err(err) => {
                tracing::warn!("{}: ignoring sitemap date: {}", record.file_name, err);
                None
            }
        })
        .unwrap_or(build_time)
}

/// Renders the sitemap XML.
pub fn render_sitemap(site: &SiteMetadata, entries: &[SitemapEntry]) -> String {
    let base_url = site.base_url();

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\"\n");
    out.push_str("        xmlns:news=\"http://www.google.com/schemas/sitemap-news/0.9\"\n");
    out.push_str("        xmlns:xhtml=\"http://www.w3.org/1999/xhtml\"\n");
    out.push_str("        xmlns:image=\"http://www.google.com/schemas/sitemap-image/1.1\"\n");
    out.push_str("        xmlns:video=\"http://www.google.com/schemas/sitemap-video/1.1\">\n");
    for entry in entries {
        out.push_str("  <url>\n");
        out.push_str(&format!(
            "    <loc>{}</loc>\n",
            escape(&format!("{}{}", base_url, entry.route))
        ));
        out.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            to_iso_string(&entry.lastmod)
        ));
        out.push_str(&format!("    <changefreq>{}</changefreq>\n", entry.changefreq));
        out.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
        out.push_str("  </url>\n");
    }
    out.push_str("</urlset>\n");
    out
}
