//! Project scaffolding and housekeeping: `init`, `new` and `clean`.

use crate::{
    config::SiteConfig,
    log,
    page::{PageResolver, to_slash},
    sitemap,
};
use anyhow::{Context, Result};
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

/// Default layout written by `init`.
const DEFAULT_LAYOUT: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{title}}</title>
</head>
<body>
<nav><a href="index.page">{{site}}</a></nav>
<main>
{{content}}
</main>
</body>
</html>
"#;

const DEFAULT_INDEX: &str = "\
+++
title = \"Home\"
+++
<h1>Hello, world</h1>
";

/// Write a config file, a layout and an index page, keeping existing ones.
pub fn init_site(config: &SiteConfig) -> Result<()> {
    let root = config.get_root();
    fs::create_dir_all(root).with_context(|| format!("Failed to create {}", root.display()))?;

    let default_config =
        toml::to_string_pretty(&SiteConfig::default()).context("Failed to serialize config")?;
    let index = root.join("index").with_extension(&config.build.source_ext);

    for (path, content) in [
        (config.config_path.as_path(), default_config.as_str()),
        (config.build.layout.as_path(), DEFAULT_LAYOUT),
        (index.as_path(), DEFAULT_INDEX),
    ] {
        let rel = path.strip_prefix(root).unwrap_or(path);
        if write_new(path, content)? {
            log!("init"; "created {}", rel.display());
        } else {
            log!("init"; "{} already exists, kept", rel.display());
        }
    }
    Ok(())
}

/// Create page skeletons for `files`, then regenerate the sitemap.
///
/// Existing files are reported and left untouched.
pub fn new_pages(files: &[PathBuf], config: &SiteConfig, resolver: &dyn PageResolver) -> Result<()> {
    let root = config.get_root();

    for file in files {
        let rel = page_file_name(file, &config.build.source_ext, &config.build.output_ext);
        let path = root.join(&rel);
        let title = format_title(&rel);
        let content = format!(
            "+++\ntitle = {}\n+++\n<div>hello world</div>\n",
            toml::Value::String(title)
        );

        if write_new(&path, &content)? {
            log!("new"; "created {}", to_slash(&rel));
        } else {
            log!("new"; "{} already exists", to_slash(&rel));
        }
    }

    sitemap::regenerate(config, resolver)?;
    Ok(())
}

/// Remove the output directory. An absent directory is not an error.
pub fn clean(config: &SiteConfig) -> Result<()> {
    let output = &config.build.output;
    match fs::remove_dir_all(output) {
        Ok(()) => {
            log!("clean"; "removed {}", output.display());
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("Failed to remove {}", output.display())),
    }
}

/// Derive a page title from a file name.
///
/// The first `.`, `_` or `-` becomes a space, whitespace is collapsed and
/// the first letter is upper-cased: `hello-world` → `Hello world`.
pub fn format_title(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = stem.replacen(['.', '_', '-'], " ", 1);
    let collapsed = stem.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut chars = collapsed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Untitled".to_owned(),
    }
}

/// Normalize a requested page name to a source file name.
///
/// `posts/hello` and `posts/hello.html` both become `posts/hello.page`.
fn page_file_name(file: &Path, source_ext: &str, output_ext: &str) -> PathBuf {
    match file.extension() {
        Some(ext) if ext == source_ext || ext == output_ext => file.with_extension(source_ext),
        _ => {
            let mut name = file.as_os_str().to_owned();
            name.push(".");
            name.push(source_ext);
            PathBuf::from(name)
        }
    }
}

/// Write `content` to a new file, creating parent directories.
///
/// Returns `false` without writing when the file already exists.
fn write_new(path: &Path, content: &str) -> Result<bool> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(err) => return Err(err).with_context(|| format!("Failed to create {}", path.display())),
    };
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        build::{BuildOptions, build_site},
        page::FilePageResolver,
        sitemap::load_previous,
    };
    use tempfile::TempDir;

    fn setup() -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.config_path = dir.path().join("quire.toml");
        config.resolve_paths(dir.path());
        (dir, config)
    }

    #[test]
    fn test_format_title() {
        assert_eq!(format_title(Path::new("hello-world.page")), "Hello world");
        assert_eq!(format_title(Path::new("posts/my_first-post.page")), "My first-post");
        assert_eq!(format_title(Path::new("a  b.page")), "A b");
        assert_eq!(format_title(Path::new("über.page")), "Über");
        assert_eq!(format_title(Path::new("_.page")), "Untitled");
    }

    #[test]
    fn test_page_file_name() {
        let name = |p: &str| page_file_name(Path::new(p), "page", "html");
        assert_eq!(name("posts/hello"), PathBuf::from("posts/hello.page"));
        assert_eq!(name("posts/hello.html"), PathBuf::from("posts/hello.page"));
        assert_eq!(name("hello.page"), PathBuf::from("hello.page"));
    }

    #[test]
    fn test_new_pages_creates_and_updates_sitemap() {
        let (dir, config) = setup();
        let resolver = FilePageResolver::new(&config);

        new_pages(&[PathBuf::from("posts/hello-world")], &config, &resolver).unwrap();

        let content = fs::read_to_string(dir.path().join("posts/hello-world.page")).unwrap();
        assert!(content.contains(r#"title = "Hello world""#));

        let sitemap = load_previous(&config.build.sitemap);
        assert_eq!(sitemap.page("posts/hello_world").unwrap().data.title, "Hello world");
    }

    #[test]
    fn test_new_pages_keeps_existing_file() {
        let (dir, config) = setup();
        let path = dir.path().join("about.page");
        fs::write(&path, "+++\ntitle = \"Mine\"\n+++\n<p>keep</p>").unwrap();
        let resolver = FilePageResolver::new(&config);

        new_pages(&[PathBuf::from("about.page"), PathBuf::from("other")], &config, &resolver)
            .unwrap();

        assert!(fs::read_to_string(&path).unwrap().contains("<p>keep</p>"));
        assert!(dir.path().join("other.page").is_file());
    }

    #[test]
    fn test_init_site_then_build() {
        let (dir, config) = setup();
        init_site(&config).unwrap();

        assert!(dir.path().join("quire.toml").is_file());
        assert!(dir.path().join("layout.html").is_file());
        assert!(dir.path().join("index.page").is_file());
        assert!(SiteConfig::from_path(&dir.path().join("quire.toml")).is_ok());

        let resolver = FilePageResolver::new(&config);
        build_site(&config, &resolver, &BuildOptions::default()).unwrap();

        let html = fs::read_to_string(config.build.output.join("index.html")).unwrap();
        assert!(html.contains("<title>Home - personal website</title>"));
        assert!(html.contains(r#"<a href="./index.html">personal website</a>"#));
    }

    #[test]
    fn test_init_site_keeps_existing_files() {
        let (dir, config) = setup();
        fs::write(dir.path().join("index.page"), "custom").unwrap();

        init_site(&config).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("index.page")).unwrap(), "custom");
    }

    #[test]
    fn test_clean() {
        let (_dir, config) = setup();
        fs::create_dir_all(config.build.output.join("posts")).unwrap();
        fs::write(config.build.output.join("posts/a.html"), "").unwrap();

        clean(&config).unwrap();
        assert!(!config.build.output.exists());

        // Already absent
        clean(&config).unwrap();
    }
}
