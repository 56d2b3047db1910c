//! Tag normalization and the tag index. Tags are compared in kebab case so
//! that e.g. `Machine Learning` and `machine-learning` are the same tag and
//! can be dropped into a URL.

use std::collections::BTreeMap;

use crate::frontmatter::RawFrontMatter;
use crate::post::Post;

/// Maps each kebab-cased tag to the number of non-draft entries carrying it.
/// Ordered by tag so iteration is deterministic.
pub type TagCount = BTreeMap<String, usize>;

/// Converts a tag to its kebab-cased, URL-safe form. Non-ASCII letters are
/// transliterated (`Café` becomes `cafe`).
pub fn kebab_case(tag: &str) -> String {
    slug::slugify(tag)
}

/// Counts the tags of every non-draft record.
pub fn count_tags(records: &[RawFrontMatter]) -> TagCount {
    let mut counts = TagCount::new();
    for record in records.iter().filter(|record| !record.is_draft()) {
        for tag in record.tags.iter().flatten() {
            *counts.entry(kebab_case(tag)).or_insert(0) += 1;
        }
    }
    counts
}

/// Whether `post` carries `tag`, compared in kebab case.
pub fn has_tag(post: &Post, tag: &str) -> bool {
    let tag = kebab_case(tag);
    post.tags.iter().any(|t| kebab_case(t) == tag)
}

/// The posts carrying `tag`, in their original order.
pub fn posts_with_tag(posts: &[Post], tag: &str) -> Vec<Post> {
    posts.iter().filter(|post| has_tag(post, tag)).cloned().collect()
}
