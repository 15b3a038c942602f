//! Preview sandbox.
//!
//! Mounts the project tree into a directory, installs dependencies, and
//! starts the project's dev server, watching its output for the ready
//! URL. The heavy lifting is delegated to the local npm/node toolchain;
//! this module only supervises the processes and reports their lifecycle:
//!
//! ```text
//! Idle ──mount──> Installing ──exit 0──> Starting ──url seen──> Ready(url)
//!                     │                      │
//!                     └──────── nonzero / died / timeout ──> Failed
//! ```

mod config;
mod runner;

pub use config::PreviewConfig;
pub use runner::{OutputSource, PreviewEvent, PreviewSandbox, PreviewStatus};
