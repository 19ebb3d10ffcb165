#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod doctor;
pub mod error;
pub mod generate;
pub mod manifest;
pub mod markup;
pub mod output;
pub mod pass;
pub mod profile;
pub mod publish;
pub mod render;
pub mod template;
pub mod toolchain;
pub mod util;

#[cfg(test)]
mod test_support;

pub use cli::run_from_env;
pub use error::{MatrixError, Result};
