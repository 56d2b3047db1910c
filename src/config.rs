//! Loads the project file (`tailblaze.yaml`) into a [`Config`]. The project
//! file holds the site metadata used by feeds and the sitemap, the timezone
//! dates are normalized to, and the content and output locations. Paths in
//! the project file are relative to the directory containing it.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Deserialize;
use url::Url;

use crate::corpus::{ContentRoot, Corpus};
use crate::date::{DateNormalizer, LocalZone, DEFAULT_TIMEZONE};
use crate::pagination::{page_path, page_routes, paginate};

/// The name of the project file.
pub const PROJECT_FILE: &str = "tailblaze.yaml";

/// Site-wide metadata.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SiteMetadata {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_language")]
    pub language: String,

    /// The public root of the site, e.g. `https://example.dev`.
    pub site_url: Url,
    pub email: String,
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl SiteMetadata {
    /// The site URL without a trailing slash, ready to have a path appended.
    pub fn base_url(&self) -> &str {
        self.site_url.as_str().trim_end_matches('/')
    }
}

fn default_language() -> String {
    String::from("en-us")
}

fn default_locale() -> String {
    String::from("en-US")
}

#[derive(Deserialize)]
struct Project {
    site: SiteMetadata,

    #[serde(default = "default_timezone")]
    timezone: Tz,

    #[serde(default)]
    local_timezone: Option<Tz>,

    #[serde(default = "default_content_directory")]
    content_directory: PathBuf,

    #[serde(default = "default_output_directory")]
    output_directory: PathBuf,

    #[serde(default = "default_posts_per_page")]
    posts_per_page: usize,

    #[serde(default = "default_notes_per_page")]
    notes_per_page: usize,

    #[serde(default = "default_static_routes")]
    static_routes: Vec<String>,

    #[serde(default = "default_sitemap_content_types")]
    sitemap_content_types: Vec<String>,
}

fn default_timezone() -> Tz {
    DEFAULT_TIMEZONE
}

fn default_content_directory() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("public")
}

fn default_posts_per_page() -> usize {
    12
}

fn default_notes_per_page() -> usize {
    18
}

fn default_static_routes() -> Vec<String> {
    [
        "/", "/about", "/blog", "/contact", "/lessons", "/notes", "/projects", "/videos",
    ]
    .iter()
    .map(|route| route.to_string())
    .collect()
}

fn default_sitemap_content_types() -> Vec<String> {
    vec![String::from("blog"), String::from("notes")]
}

/// The resolved configuration for a build.
#[derive(Clone, Debug)]
pub struct Config {
    pub site: SiteMetadata,

    /// How frontmatter dates are normalized.
    pub dates: DateNormalizer,

    /// Holds one directory per content type (`blog`, `notes`, `authors`, ...).
    pub content_root: ContentRoot,

    /// Where `feed.xml`, `tags/{tag}/feed.xml` and `sitemap.xml` are written.
    pub output_directory: PathBuf,

    /// Page size of the `blog` list and of tag lists.
    pub posts_per_page: usize,

    /// Page size of the `notes` list.
    pub notes_per_page: usize,

    /// Non-content routes listed in the sitemap, e.g. `/about`.
    pub static_routes: Vec<String>,

    /// The content types whose files become sitemap routes.
    pub sitemap_content_types: Vec<String>,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for a project file and
    /// loads the first one found.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let path = dir.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path).map_err(|err| {
                    Error::Annotated(
                        format!("loading configuration `{}`", path.display()),
                        Box::new(err),
                    )
                });
            }
            current = dir.parent();
        }
        Err(Error::NotFound(dir.to_owned()))
    }

    /// Loads a specific project file.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file)?;
        let project_root = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Config::from_project(project, project_root))
    }

    /// Parses project-file contents, resolving paths against `project_root`.
    pub fn from_yaml(yaml: &str, project_root: &Path) -> Result<Config> {
        let project: Project = serde_yaml::from_str(yaml)?;
        Ok(Config::from_project(project, project_root))
    }

    fn from_project(project: Project, project_root: &Path) -> Config {
        Config {
            site: project.site,
            dates: DateNormalizer::new(project.timezone, LocalZone::from(project.local_timezone)),
            content_root: ContentRoot::new(project_root.join(project.content_directory)),
            output_directory: project_root.join(project.output_directory),
            posts_per_page: project.posts_per_page,
            notes_per_page: project.notes_per_page,
            static_routes: project.static_routes,
            sitemap_content_types: project.sitemap_content_types,
        }
    }

    /// The page size of list section `section`.
    pub fn per_page(&self, section: &str) -> usize {
        match section {
            "notes" => self.notes_per_page,
            _ => self.posts_per_page,
        }
    }

    /// The routes of the list pages of `section` when it holds
    /// `total_items` entries, e.g. `/blog/`, `/blog/page/2`.
    pub fn list_routes(&self, section: &str, total_items: usize) -> Vec<String> {
        let pagination = paginate(total_items, self.per_page(section), 1);
        page_routes(pagination.total_pages)
            .map(|page| page_path(section, page))
            .collect()
    }

    /// A [`Corpus`] over the configured content root.
    pub fn corpus(&self) -> Corpus {
        Corpus::new(self.content_root.clone(), self.dates)
    }
}

/// The result of a fallible configuration operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when no project file exists in a directory or its ancestors.
    #[error("could not find `tailblaze.yaml` in `{}` or any parent directory", .0.display())]
    NotFound(PathBuf),

    /// Returned when the project file can't be opened.
    #[error("opening `{}`", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// Returned when the project file isn't valid.
    #[error(transparent)]
    DeserializeYaml(#[from] serde_yaml::Error),

    /// Adds context to an error.
    #[error("{0}")]
    Annotated(String, #[source] Box<Error>),
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    const MINIMAL: &str = "
site:
  title: Field Notes
  author: Ada
  site_url: https://example.dev/
  email: ada@example.dev
";

    #[test]
    fn test_defaults() -> Result<()> {
        let config = Config::from_yaml(MINIMAL, Path::new("/srv/site"))?;
        assert_eq!("https://example.dev", config.site.base_url());
        assert_eq!("en-us", config.site.language);
        assert_eq!(DEFAULT_TIMEZONE, config.dates.reference);
        assert_eq!(LocalZone::Host, config.dates.local);
        assert_eq!(Path::new("/srv/site/data"), config.content_root.path());
        assert_eq!(PathBuf::from("/srv/site/public"), config.output_directory);
        assert_eq!(12, config.posts_per_page);
        assert_eq!(18, config.notes_per_page);
        assert_eq!(8, config.static_routes.len());
        assert_eq!(vec!["blog", "notes"], config.sitemap_content_types);
        Ok(())
    }

    #[test]
    fn test_list_routes() -> Result<()> {
        let yaml = format!("{}posts_per_page: 10\n", MINIMAL);
        let config = Config::from_yaml(&yaml, Path::new("."))?;
        assert_eq!(10, config.per_page("blog"));
        assert_eq!(18, config.per_page("notes"));
        assert_eq!(
            vec!["/blog/", "/blog/page/2", "/blog/page/3"],
            config.list_routes("blog", 25)
        );
        assert_eq!(vec!["/notes/"], config.list_routes("notes", 18));
        assert!(config.list_routes("blog", 0).is_empty());
        Ok(())
    }

    #[test]
    fn test_timezones() -> Result<()> {
        let yaml = format!("{}timezone: Europe/Berlin\nlocal_timezone: UTC\n", MINIMAL);
        let config = Config::from_yaml(&yaml, Path::new("."))?;
        assert_eq!(chrono_tz::Europe::Berlin, config.dates.reference);
        assert_eq!(LocalZone::Zone(chrono_tz::UTC), config.dates.local);

        let yaml = format!("{}timezone: Mars/Olympus_Mons\n", MINIMAL);
        assert!(matches!(
            Config::from_yaml(&yaml, Path::new(".")),
            Err(Error::DeserializeYaml(_))
        ));
        Ok(())
    }

    #[test]
    fn test_from_directory_walks_up() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join(PROJECT_FILE), MINIMAL)?;
        let nested = dir.path().join("data/blog/2024");
        std::fs::create_dir_all(&nested)?;

        let config = Config::from_directory(&nested)?;
        assert_eq!("Field Notes", config.site.title);
        assert_eq!(dir.path().join("data"), config.content_root.path());
        Ok(())
    }

    #[test]
    fn test_from_directory_not_found() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        // A temp dir's ancestors are not expected to hold a project file.
        if !dir.path().ancestors().any(|d| d.join(PROJECT_FILE).is_file()) {
            assert!(matches!(
                Config::from_directory(dir.path()),
                Err(Error::NotFound(_))
            ));
        }
        Ok(())
    }
}
