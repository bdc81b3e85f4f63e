//! Line-of-code counting over a cloned tree.

use std::io;
use std::path::Path;

use walkdir::{DirEntry, WalkDir};

/// Source extensions that count toward LOC. Compared lowercased.
const CODE_EXTENSIONS: &[&str] = &[
    "js", "ts", "jsx", "tsx", "py", "go", "java", "rb", "php", "c", "cpp", "h", "rs", "html",
    "css", "scss",
];

/// Directories pruned at any depth.
const SKIP_DIRS: &[&str] = &["node_modules", ".git", "dist", "build"];

/// Line prefixes that disqualify a line as code.
const COMMENT_PREFIXES: &[&str] = &["//", "#", "/*", "*", "<!--"];

fn is_pruned_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| SKIP_DIRS.contains(&name))
            .unwrap_or(false)
}

/// All files under `root` with the excluded directories pruned. Shared with
/// theme extraction so both walk the same tree.
pub fn walk_files(root: &Path) -> impl Iterator<Item = walkdir::Result<DirEntry>> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_pruned_dir(entry))
        .filter(|entry| {
            entry
                .as_ref()
                .map(|e| e.file_type().is_file())
                .unwrap_or(true)
        })
}

/// Count non-blank, non-comment lines across the recognized source
/// extensions.
pub fn count_loc(root: &Path) -> io::Result<i64> {
    let mut loc: i64 = 0;
    for entry in walk_files(root) {
        let entry = entry.map_err(io::Error::from)?;
        let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !CODE_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            continue;
        }
        let bytes = std::fs::read(entry.path())?;
        let content = String::from_utf8_lossy(&bytes);
        loc += content.lines().filter(|line| is_code_line(line)).count() as i64;
    }
    Ok(loc)
}

fn is_code_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && !COMMENT_PREFIXES
            .iter()
            .any(|prefix| trimmed.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn counts_code_and_skips_blank_and_comment_lines() {
        let repo = TempDir::new().unwrap();
        fs::write(
            repo.path().join("app.ts"),
            "// header comment\n\nconst x = 1;\nconst y = 2;\n/* block */\n* continuation\n",
        )
        .unwrap();
        assert_eq!(count_loc(repo.path()).unwrap(), 2);
    }

    #[test]
    fn hash_comments_are_skipped_in_scripts() {
        let repo = TempDir::new().unwrap();
        fs::write(
            repo.path().join("tool.py"),
            "#!/usr/bin/env python\n# setup\nprint('hi')\n",
        )
        .unwrap();
        assert_eq!(count_loc(repo.path()).unwrap(), 1);
    }

    #[test]
    fn html_comments_are_skipped() {
        let repo = TempDir::new().unwrap();
        fs::write(
            repo.path().join("index.html"),
            "<!-- banner -->\n<div>hello</div>\n",
        )
        .unwrap();
        assert_eq!(count_loc(repo.path()).unwrap(), 1);
    }

    #[test]
    fn unrecognized_extensions_are_ignored() {
        let repo = TempDir::new().unwrap();
        fs::write(repo.path().join("notes.md"), "real text\nmore text\n").unwrap();
        fs::write(repo.path().join("data.json"), "{\"a\": 1}\n").unwrap();
        assert_eq!(count_loc(repo.path()).unwrap(), 0);
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let repo = TempDir::new().unwrap();
        fs::write(repo.path().join("Legacy.JS"), "var a = 1;\n").unwrap();
        assert_eq!(count_loc(repo.path()).unwrap(), 1);
    }

    #[test]
    fn excluded_directories_are_pruned_at_any_depth() {
        let repo = TempDir::new().unwrap();
        let nested = repo.path().join("packages").join("web");
        fs::create_dir_all(nested.join("node_modules").join("lodash")).unwrap();
        fs::create_dir_all(nested.join("src")).unwrap();
        fs::create_dir_all(repo.path().join("dist")).unwrap();
        fs::write(
            nested.join("node_modules").join("lodash").join("index.js"),
            "module.exports = {};\n",
        )
        .unwrap();
        fs::write(repo.path().join("dist").join("bundle.js"), "var b;\n").unwrap();
        fs::write(nested.join("src").join("main.ts"), "export const n = 1;\n").unwrap();
        assert_eq!(count_loc(repo.path()).unwrap(), 1);
    }

    #[test]
    fn counts_across_multiple_files() {
        let repo = TempDir::new().unwrap();
        fs::write(repo.path().join("a.rs"), "fn main() {}\n").unwrap();
        fs::write(repo.path().join("b.go"), "package main\nfunc f() {}\n").unwrap();
        assert_eq!(count_loc(repo.path()).unwrap(), 3);
    }
}
