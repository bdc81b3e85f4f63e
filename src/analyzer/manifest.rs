//! `package.json` probing: framework rules and dependency lists.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

/// Framework detection rules in priority order. The first dependency key
/// present in either section wins.
const FRAMEWORK_RULES: &[(&str, &str)] = &[
    ("next", "Next.js"),
    ("nuxt", "Nuxt.js"),
    ("sveltekit", "SvelteKit"),
    ("react", "React"),
    ("vue", "Vue"),
    ("@angular/core", "Angular"),
    ("express", "Express"),
    ("ember", "Ember"),
];

/// Parsed `package.json`. A missing or malformed file yields the empty
/// manifest so downstream detection falls through to its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub description: Option<String>,
    pub dependencies: serde_json::Map<String, Value>,
    #[serde(rename = "devDependencies")]
    pub dev_dependencies: serde_json::Map<String, Value>,
    pub scripts: serde_json::Map<String, Value>,
}

/// Dependency names split by section, plus the potentially-outdated subset:
/// core dependencies pinned to a pre-1.0 or pre-release version.
#[derive(Debug, Clone, Default)]
pub struct DependencyReport {
    pub dependencies: Vec<String>,
    pub dev_dependencies: Vec<String>,
    pub potentially_outdated: Vec<String>,
}

impl Manifest {
    /// Read `<repo>/package.json`.
    pub async fn load(repo: &Path) -> Self {
        match tokio::fs::read_to_string(repo.join("package.json")).await {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Whether a dependency key appears in either section.
    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependencies.contains_key(name) || self.dev_dependencies.contains_key(name)
    }

    /// Script bodies concatenated and lowercased, for service detection.
    pub fn script_text(&self) -> String {
        self.scripts
            .values()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    pub fn dependency_report(&self) -> DependencyReport {
        let dependencies: Vec<String> = self.dependencies.keys().cloned().collect();
        let dev_dependencies: Vec<String> = self.dev_dependencies.keys().cloned().collect();
        let potentially_outdated = dependencies
            .iter()
            .filter(|name| {
                self.dependencies
                    .get(name.as_str())
                    .and_then(Value::as_str)
                    .is_some_and(|version| version.starts_with("0.") || version.contains("beta"))
            })
            .cloned()
            .collect();

        DependencyReport {
            dependencies,
            dev_dependencies,
            potentially_outdated,
        }
    }
}

/// Detect the web framework: manifest dependency keys in priority order,
/// then directory-layout fallbacks for repos whose manifest does not name
/// one. Defaults to "Unknown".
pub async fn detect_framework(manifest: &Manifest, repo: &Path) -> String {
    for (key, label) in FRAMEWORK_RULES {
        if manifest.has_dependency(key) {
            return (*label).to_string();
        }
    }

    if path_exists(&repo.join("src").join("app")).await {
        return "Next.js".to_string();
    }
    if path_exists(&repo.join("angular.json")).await {
        return "Angular".to_string();
    }
    if path_exists(&repo.join("nuxt.config.js")).await
        || path_exists(&repo.join("nuxt.config.ts")).await
    {
        return "Nuxt.js".to_string();
    }

    "Unknown".to_string()
}

pub(crate) async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_manifest(repo: &TempDir, content: &str) {
        fs::write(repo.path().join("package.json"), content).unwrap();
    }

    #[tokio::test]
    async fn missing_manifest_loads_as_empty() {
        let repo = TempDir::new().unwrap();
        let manifest = Manifest::load(repo.path()).await;
        assert!(manifest.dependencies.is_empty());
        assert!(manifest.dev_dependencies.is_empty());
        assert_eq!(manifest.description, None);
    }

    #[tokio::test]
    async fn malformed_manifest_loads_as_empty() {
        let repo = TempDir::new().unwrap();
        write_manifest(&repo, "{not json");
        let manifest = Manifest::load(repo.path()).await;
        assert!(manifest.dependencies.is_empty());
    }

    #[tokio::test]
    async fn next_wins_over_react() {
        let repo = TempDir::new().unwrap();
        write_manifest(
            &repo,
            r#"{"dependencies": {"react": "18.0.0", "next": "14.0.0"}}"#,
        );
        let manifest = Manifest::load(repo.path()).await;
        assert_eq!(detect_framework(&manifest, repo.path()).await, "Next.js");
    }

    #[tokio::test]
    async fn dev_dependencies_count_for_framework_detection() {
        let repo = TempDir::new().unwrap();
        write_manifest(&repo, r#"{"devDependencies": {"vue": "3.4.0"}}"#);
        let manifest = Manifest::load(repo.path()).await;
        assert_eq!(detect_framework(&manifest, repo.path()).await, "Vue");
    }

    #[tokio::test]
    async fn angular_detected_by_scoped_package() {
        let repo = TempDir::new().unwrap();
        write_manifest(&repo, r#"{"dependencies": {"@angular/core": "17.0.0"}}"#);
        let manifest = Manifest::load(repo.path()).await;
        assert_eq!(detect_framework(&manifest, repo.path()).await, "Angular");
    }

    #[tokio::test]
    async fn src_app_directory_falls_back_to_next() {
        let repo = TempDir::new().unwrap();
        fs::create_dir_all(repo.path().join("src").join("app")).unwrap();
        let manifest = Manifest::load(repo.path()).await;
        assert_eq!(detect_framework(&manifest, repo.path()).await, "Next.js");
    }

    #[tokio::test]
    async fn angular_json_falls_back_to_angular() {
        let repo = TempDir::new().unwrap();
        fs::write(repo.path().join("angular.json"), "{}").unwrap();
        let manifest = Manifest::load(repo.path()).await;
        assert_eq!(detect_framework(&manifest, repo.path()).await, "Angular");
    }

    #[tokio::test]
    async fn nuxt_config_ts_falls_back_to_nuxt() {
        let repo = TempDir::new().unwrap();
        fs::write(repo.path().join("nuxt.config.ts"), "export default {}").unwrap();
        let manifest = Manifest::load(repo.path()).await;
        assert_eq!(detect_framework(&manifest, repo.path()).await, "Nuxt.js");
    }

    #[tokio::test]
    async fn no_signals_defaults_to_unknown() {
        let repo = TempDir::new().unwrap();
        let manifest = Manifest::load(repo.path()).await;
        assert_eq!(detect_framework(&manifest, repo.path()).await, "Unknown");
    }

    #[test]
    fn outdated_flags_zero_versions_and_beta_tags() {
        let manifest: Manifest = serde_json::from_str(
            r#"{
                "dependencies": {
                    "left-pad": "0.2.1",
                    "shiny": "2.0.0-beta.3",
                    "stable": "3.1.4"
                },
                "devDependencies": {"old-tool": "0.0.1"}
            }"#,
        )
        .unwrap();
        let report = manifest.dependency_report();
        assert_eq!(report.potentially_outdated, vec!["left-pad", "shiny"]);
        // Dev dependencies are listed but never flagged as outdated.
        assert_eq!(report.dev_dependencies, vec!["old-tool"]);
    }

    #[test]
    fn script_text_joins_and_lowercases() {
        let manifest: Manifest = serde_json::from_str(
            r#"{"scripts": {"start": "node server.js", "cache": "Redis-server --port 6380"}}"#,
        )
        .unwrap();
        let text = manifest.script_text();
        assert!(text.contains("redis-server"));
        assert!(text.contains("node server.js"));
    }
}
