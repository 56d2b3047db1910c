//! Lists the files of a content-type directory.

use std::path::Path;

use walkdir::WalkDir;

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "mdx"];

/// Recursively lists every regular file under `root`, as paths relative to
/// `root` joined with `/` on every platform. A missing `root` is an empty
/// corpus, not an error. Entries are sorted by file name within each
/// directory so repeated walks agree.
pub fn list_files(root: &Path) -> Result<Vec<String>> {
    if !root.exists() {
        tracing::debug!("content directory {} does not exist", root.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for result in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = result?;
        if !entry.file_type().is_file() {
            continue;
        }
        // every entry lives under `root`
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        files.push(to_forward_slashes(relative));
    }
    Ok(files)
}

fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether `file_name` is a Markdown or MDX source.
pub fn is_markdown(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext))
}

/// Strips a trailing `.md`/`.mdx` extension, turning a relative file name
/// into a slug: `2024/hello.mdx` becomes `2024/hello`.
pub fn format_slug(file_name: &str) -> &str {
    file_name
        .strip_suffix(".mdx")
        .or_else(|| file_name.strip_suffix(".md"))
        .unwrap_or(file_name)
}

/// The result of a fallible file-listing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem walking a content directory.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for I/O errors encountered while walking.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
}
