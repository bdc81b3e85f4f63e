//! Core-feature extraction from README files.

use std::path::Path;

use super::manifest::Manifest;

const SECTION_LIMIT: usize = 5;
const FALLBACK_LIMIT: usize = 3;

/// Up to five core features for a template, in declared order.
///
/// Sources, in order: bullet lines under a README "Features" heading
/// (English or Chinese), the first bullets anywhere in the README, the
/// manifest description, then `["Unknown"]`.
pub async fn extract_core_features(repo: &Path) -> Vec<String> {
    let mut features = match tokio::fs::read_to_string(repo.join("README.md")).await {
        Ok(content) => parse_readme_features(&content),
        Err(_) => Vec::new(),
    };

    if features.is_empty() {
        let manifest = Manifest::load(repo).await;
        if let Some(description) = manifest.description.filter(|d| !d.is_empty()) {
            features.push(description);
        }
    }

    if features.is_empty() {
        features.push("Unknown".to_string());
    }

    features
}

/// Walk the README line by line. Every `##` heading recomputes whether we
/// are inside a features section, so the section can be re-entered. Bullets
/// inside the section are collected up to the limit; a single-`#` heading
/// inside the section ends the scan. When the section pass finds nothing,
/// the first bullets anywhere in the document are used instead.
pub fn parse_readme_features(readme: &str) -> Vec<String> {
    let mut features = Vec::new();
    let mut in_features_section = false;

    for line in readme.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("##") {
            let heading = trimmed.trim_start_matches('#').trim().to_lowercase();
            in_features_section = heading.contains("features")
                || heading.contains("功能")
                || heading.contains("特性");
            continue;
        }

        if in_features_section && (trimmed.starts_with("- ") || trimmed.starts_with("* ")) {
            let feature = trimmed[2..].trim();
            if !feature.is_empty() && features.len() < SECTION_LIMIT {
                features.push(feature.to_string());
            }
        }

        if in_features_section && trimmed.starts_with('#') {
            break;
        }
    }

    if features.is_empty() {
        for line in readme.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("- ") || trimmed.starts_with("* ") {
                let feature = trimmed[2..].trim();
                if !feature.is_empty() && features.len() < FALLBACK_LIMIT {
                    features.push(feature.to_string());
                }
            }
        }
    }

    features
}
