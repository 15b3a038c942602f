//! CLI command implementations.
//!
//! | Module    | Commands handled |
//! |-----------|------------------|
//! | `create`  | `Create`         |
//! | `preview` | `Preview`        |
//! | `serve`   | `Serve`          |

mod create;
mod preview;
mod serve;

pub use create::cmd_create;
pub use preview::cmd_preview;
pub use serve::cmd_serve;
