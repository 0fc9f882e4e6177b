/// Current crate version, surfaced by the CLI and the status card
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");
