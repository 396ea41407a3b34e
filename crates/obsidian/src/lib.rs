pub mod render;
pub mod vault;

pub use vault::{build_vault, VaultPaths};
