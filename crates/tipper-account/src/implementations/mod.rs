//! Secret provider backends.

mod env;
mod file;

pub use env::EnvSecretProvider;
pub use file::FileSecretProvider;
