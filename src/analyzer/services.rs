//! Database and required-service detection cascades.
//!
//! Detection reads, in order: `docker-compose.yml`, the package manifest,
//! the Dockerfile, Kubernetes manifests, and env files. Compose matching is
//! case-sensitive; Dockerfile, Kubernetes, and env matching are not. Rule
//! order within each source decides ties.

use std::io;
use std::path::Path;

use super::manifest::{Manifest, path_exists};

/// Compose-file patterns for the database cascade.
const COMPOSE_DATABASES: &[(&str, &str)] = &[
    ("postgres", "PostgreSQL"),
    ("mysql", "MySQL"),
    ("mongodb", "MongoDB"),
    ("redis", "Redis"),
    ("mariadb", "MariaDB"),
];

/// Manifest dependency keys for the database cascade. Each rule lists the
/// package names that imply the engine.
const MANIFEST_DATABASES: &[(&[&str], &str)] = &[
    (&["pg"], "PostgreSQL"),
    (&["mysql", "mysql2"], "MySQL"),
    (&["mongodb", "mongoose"], "MongoDB"),
    (&["redis"], "Redis"),
    (&["sqlite3"], "SQLite"),
];

/// Env-file content patterns for the database cascade.
const ENV_DATABASES: &[(&str, &str)] = &[
    ("postgres", "PostgreSQL"),
    ("mysql", "MySQL"),
    ("mongo", "MongoDB"),
    ("redis", "Redis"),
    ("sqlite", "SQLite"),
];

/// Env files probed for database hints, in order.
const DATABASE_ENV_FILES: &[&str] = &[".env", ".env.example", ".env.sample", "example.env"];

/// Env-example candidates, probed in order.
const ENV_EXAMPLE_FILES: &[&str] = &[".env.example", ".env.sample", "example.env"];

const COMPOSE_SERVICES: &[(&str, &str)] = &[
    ("postgres", "PostgreSQL"),
    ("mysql", "MySQL"),
    ("mongodb", "MongoDB"),
    ("redis", "Redis"),
    ("nginx", "Nginx"),
    ("elasticsearch", "Elasticsearch"),
    ("rabbitmq", "RabbitMQ"),
];

const SCRIPT_SERVICES: &[(&str, &str)] = &[
    ("redis", "Redis"),
    ("nginx", "Nginx"),
    ("rabbitmq", "RabbitMQ"),
];

const DOCKERFILE_SERVICES: &[(&str, &str)] = &[("nginx", "Nginx"), ("redis", "Redis")];

const K8S_SERVICES: &[(&str, &str)] = &[("postgres", "PostgreSQL"), ("redis", "Redis")];

/// Read `docker-compose.yml`, treating absence as empty content. Other
/// read failures propagate.
pub async fn read_compose(repo: &Path) -> io::Result<String> {
    match tokio::fs::read_to_string(repo.join("docker-compose.yml")).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e),
    }
}

/// Database engine for the template: compose patterns, then manifest
/// dependencies, then env-file contents. "None" when nothing matches.
pub async fn detect_database(compose: &str, manifest: &Manifest, repo: &Path) -> String {
    for (pattern, label) in COMPOSE_DATABASES {
        if compose.contains(pattern) {
            return (*label).to_string();
        }
    }

    for (keys, label) in MANIFEST_DATABASES {
        if keys.iter().any(|key| manifest.has_dependency(key)) {
            return (*label).to_string();
        }
    }

    for name in DATABASE_ENV_FILES {
        let Ok(content) = tokio::fs::read_to_string(repo.join(name)).await else {
            continue;
        };
        let lowered = content.to_lowercase();
        for (pattern, label) in ENV_DATABASES {
            if lowered.contains(pattern) {
                return (*label).to_string();
            }
        }
    }

    "None".to_string()
}

/// Required external services, accumulated across compose, manifest
/// scripts, the Dockerfile, and Kubernetes manifests, deduplicated in
/// first-seen order. `["None"]` when nothing matches.
pub async fn detect_required_services(repo: &Path) -> io::Result<Vec<String>> {
    let mut matches: Vec<String> = Vec::new();

    let compose = read_compose(repo).await?;
    for (pattern, label) in COMPOSE_SERVICES {
        if compose.contains(pattern) {
            matches.push((*label).to_string());
        }
    }

    let manifest = Manifest::load(repo).await;
    let scripts = manifest.script_text();
    for (pattern, label) in SCRIPT_SERVICES {
        if scripts.contains(pattern) {
            matches.push((*label).to_string());
        }
    }

    if let Ok(dockerfile) = tokio::fs::read_to_string(repo.join("Dockerfile")).await {
        let lowered = dockerfile.to_lowercase();
        for (pattern, label) in DOCKERFILE_SERVICES {
            if lowered.contains(pattern) {
                matches.push((*label).to_string());
            }
        }
    }

    if let Some(k8s) = read_k8s_manifest(repo).await {
        let lowered = k8s.to_lowercase();
        for (pattern, label) in K8S_SERVICES {
            if lowered.contains(pattern) {
                matches.push((*label).to_string());
            }
        }
    }

    let mut services: Vec<String> = Vec::new();
    for service in matches {
        if !services.contains(&service) {
            services.push(service);
        }
    }
    if services.is_empty() {
        services.push("None".to_string());
    }
    Ok(services)
}

/// Whether the repository ships an environment-variable example file.
pub async fn has_env_example(repo: &Path) -> bool {
    for name in ENV_EXAMPLE_FILES {
        if path_exists(&repo.join(name)).await {
            return true;
        }
    }
    false
}

/// Content of the first top-level entry whose name contains `k8s` and ends
/// in `.yaml`, if any.
async fn read_k8s_manifest(repo: &Path) -> Option<String> {
    let mut entries = tokio::fs::read_dir(repo).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.contains("k8s") && name.ends_with(".yaml") {
            return tokio::fs::read_to_string(entry.path()).await.ok();
        }
    }
    None
}
