//! Theme color extraction from stylesheet files.

use std::io;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::loc::walk_files;

static HEX_COLOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[0-9a-fA-F]{6}").unwrap());

/// Palette used when no stylesheet colors are found.
pub const DEFAULT_THEME: [&str; 2] = ["#3b82f6", "#1e293b"];

const COLORS_PER_FILE: usize = 2;

/// First two six-digit hex colors from each `.css` file, flattened in walk
/// order. Falls back to [`DEFAULT_THEME`] when the tree has none.
pub fn extract_theme_colors(root: &Path) -> io::Result<Vec<String>> {
    let mut colors = Vec::new();
    for entry in walk_files(root) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_name().to_string_lossy().ends_with(".css") {
            continue;
        }
        let bytes = std::fs::read(entry.path())?;
        let content = String::from_utf8_lossy(&bytes);
        for found in HEX_COLOR_REGEX.find_iter(&content).take(COLORS_PER_FILE) {
            colors.push(found.as_str().to_string());
        }
    }

    if colors.is_empty() {
        colors = DEFAULT_THEME.iter().map(|c| c.to_string()).collect();
    }
    Ok(colors)
}
