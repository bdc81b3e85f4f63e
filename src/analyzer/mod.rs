//! Static analysis over a cloned repository tree.
//!
//! Everything here works on the local clone only; no network access. Each
//! detector degrades to a sensible default when its input files are absent,
//! so a sparse repository still produces a complete report.
//!
//! | Module     | Responsibility                                          |
//! |------------|---------------------------------------------------------|
//! | `manifest` | `package.json` parsing, framework rules, dependency lists |
//! | `services` | Database and required-service detection cascades        |
//! | `readme`   | Core-feature extraction from README headings            |
//! | `loc`      | Line-of-code counting with comment/blank filtering      |
//! | `theme`    | Hex color extraction from stylesheets                   |

pub mod loc;
pub mod manifest;
pub mod readme;
pub mod services;
pub mod theme;

pub use loc::count_loc;
pub use manifest::Manifest;
pub use readme::extract_core_features;
pub use services::detect_required_services;
pub use theme::extract_theme_colors;

use std::io;
use std::path::Path;

use crate::models::{StackReport, TechStack};

/// Full stack analysis for a cloned repository: framework, database,
/// required services, dependency lists, and the env-example flag.
pub async fn analyze_stack(repo: &Path) -> io::Result<StackReport> {
    let manifest = Manifest::load(repo).await;
    let compose = services::read_compose(repo).await?;

    let framework = manifest::detect_framework(&manifest, repo).await;
    let database = services::detect_database(&compose, &manifest, repo).await;
    let required_services = services::detect_required_services(repo).await?;
    let has_env_example = services::has_env_example(repo).await;
    let deps = manifest.dependency_report();

    Ok(StackReport {
        tech_stack: TechStack {
            framework,
            database,
            required_services,
            dependencies: deps.dependencies,
            dev_dependencies: deps.dev_dependencies,
            potentially_outdated: deps.potentially_outdated,
        },
        has_env_example,
    })
}
