//! Support for creating RSS 2.0 feeds from a list of posts.

use crate::config::SiteMetadata;
use crate::date::{self, parse_instant, to_utc_string, LocalZone};
use crate::post::Post;

/// The site-relative path of the main feed.
pub const DEFAULT_FEED_PATH: &str = "feed.xml";

/// Escapes the XML special characters `&`, `<`, `>`, `'` and `"`.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

// Post dates are already normalized ISO-8601 instants; they are only
// re-rendered here.
fn rfc2822(date: &str) -> Result<String> {
    Ok(to_utc_string(&parse_instant(date, LocalZone::default())?))
}

/// Renders an RSS 2.0 feed for `posts`, which should be sorted newest first:
/// the channel's `lastBuildDate` is the date of the first post. `feed_path`
/// is the feed's own site-relative path, used for the `atom:link` self
/// reference. An empty post list is an error.
pub fn generate_rss(site: &SiteMetadata, posts: &[Post], feed_path: &str) -> Result<String> {
    let newest = posts.first().ok_or(Error::EmptyFeed)?;
    let base_url = site.base_url();
    let contact = escape(&format!("{} ({})", site.email, site.author));

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n");
    out.push_str("  <channel>\n");
    out.push_str(&format!("    <title>{}</title>\n", escape(&site.title)));
    out.push_str(&format!("    <link>{}/blog</link>\n", escape(base_url)));
    out.push_str(&format!(
        "    <description>{}</description>\n",
        escape(&site.description)
    ));
    out.push_str(&format!("    <language>{}</language>\n", escape(&site.language)));
    out.push_str(&format!("    <managingEditor>{}</managingEditor>\n", contact));
    out.push_str(&format!("    <webMaster>{}</webMaster>\n", contact));
    out.push_str(&format!(
        "    <lastBuildDate>{}</lastBuildDate>\n",
        rfc2822(&newest.date)?
    ));
    out.push_str(&format!(
        "    <atom:link href=\"{}/{}\" rel=\"self\" type=\"application/rss+xml\"/>\n",
        escape(base_url),
        escape(feed_path.trim_start_matches('/'))
    ));

    for post in posts {
        let link = escape(&format!("{}/blog/{}", base_url, post.slug));
        out.push_str("    <item>\n");
        out.push_str(&format!("      <guid>{}</guid>\n", link));
        out.push_str(&format!("      <title>{}</title>\n", escape(&post.title)));
        out.push_str(&format!("      <link>{}</link>\n", link));
        if let Some(summary) = post.summary.as_deref().filter(|s| !s.is_empty()) {
            out.push_str(&format!(
                "      <description>{}</description>\n",
                escape(summary)
            ));
        }
        out.push_str(&format!("      <pubDate>{}</pubDate>\n", rfc2822(&post.date)?));
        out.push_str(&format!("      <author>{}</author>\n", contact));
        for tag in &post.tags {
            out.push_str(&format!("      <category>{}</category>\n", escape(tag)));
        }
        out.push_str("    </item>\n");
    }

    out.push_str("  </channel>\n");
    out.push_str("</rss>\n");
    Ok(out)
}

/// The result of a fallible feed operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when there are no posts to build a feed from.
    #[error("cannot build a feed without posts")]
    EmptyFeed,

    /// Returned when a post's date can't be parsed.
    #[error(transparent)]
    Date(#[from] date::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frontmatter::RawFrontMatter;
    use crate::post::to_post;
    use pretty_assertions::assert_eq;

    fn site() -> SiteMetadata {
        SiteMetadata {
            title: "Notes & Thoughts".to_owned(),
            author: "Ada".to_owned(),
            description: "A blog".to_owned(),
            language: "en-us".to_owned(),
            site_url: url::Url::parse("https://example.dev/").unwrap(),
            email: "ada@example.dev".to_owned(),
            locale: "en-US".to_owned(),
        }
    }

    fn post(slug: &str, title: &str, date: &str, tags: &[&str]) -> Post {
        to_post(&RawFrontMatter {
            slug: Some(slug.to_owned()),
            title: title.to_owned(),
            date: Some(date.to_owned()),
            summary: Some(format!("About {}", title)),
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            ..RawFrontMatter::default()
        })
        .unwrap()
    }

    fn text<'a>(doc: &'a roxmltree::Document, tag: &str) -> Vec<&'a str> {
        doc.descendants()
            .filter(|n| n.has_tag_name(tag))
            .filter_map(|n| n.text())
            .collect()
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;",
            escape("<a href=\"x\">Tom & Jerry's</a>")
        );
    }

    #[test]
    fn test_generate_rss_is_well_formed() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let posts = vec![
            post("second", "Less <than> & \"quoted\"", "2024-03-15T07:00:00.000Z", &["R&D"]),
            post("first", "First", "2024-01-01T07:00:00.000Z", &[]),
        ];
        let xml = generate_rss(&site(), &posts, DEFAULT_FEED_PATH)?;
        let doc = roxmltree::Document::parse(&xml)?;

        assert_eq!(
            vec!["Notes & Thoughts", "Less <than> & \"quoted\"", "First"],
            text(&doc, "title")
        );
        assert_eq!(
            vec![
                "https://example.dev/blog",
                "https://example.dev/blog/second",
                "https://example.dev/blog/first",
            ],
            text(&doc, "link")
        );
        assert_eq!(vec!["R&D"], text(&doc, "category"));
        assert_eq!(vec!["Fri, 15 Mar 2024 07:00:00 GMT"], text(&doc, "lastBuildDate"));
        assert_eq!(
            vec!["Fri, 15 Mar 2024 07:00:00 GMT", "Mon, 01 Jan 2024 07:00:00 GMT"],
            text(&doc, "pubDate")
        );
        assert_eq!(
            vec!["ada@example.dev (Ada)", "ada@example.dev (Ada)"],
            text(&doc, "author")
        );

        let self_link = doc
            .descendants()
            .find(|n| n.has_tag_name(("http://www.w3.org/2005/Atom", "link")))
            .and_then(|n| n.attribute("href"));
        assert_eq!(Some("https://example.dev/feed.xml"), self_link);
        Ok(())
    }

    #[test]
    fn test_generate_rss_tag_feed_path() -> Result<()> {
        let posts = vec![post("a", "A", "2024-01-01T00:00:00.000Z", &["rust"])];
        let xml = generate_rss(&site(), &posts, "tags/rust/feed.xml")?;
        assert!(xml.contains("href=\"https://example.dev/tags/rust/feed.xml\""));
        Ok(())
    }

    #[test]
    fn test_generate_rss_empty() {
        assert!(matches!(
            generate_rss(&site(), &[], DEFAULT_FEED_PATH),
            Err(Error::EmptyFeed)
        ));
    }
}
