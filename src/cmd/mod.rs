//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module    | Commands handled      |
//! |-----------|-----------------------|
//! | `catalog` | `Init`, `Add`, `List` |
//! | `scan`    | `Scan`                |
//! | `serve`   | `Serve`               |

pub mod catalog;
pub mod scan;
pub mod serve;

pub use catalog::{cmd_add, cmd_init, cmd_list};
pub use scan::cmd_scan;
pub use serve::cmd_serve;
