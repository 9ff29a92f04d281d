pub mod codegen;
pub mod config;
pub mod deptree;
pub mod driver;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod prescan;
pub mod resolver;
pub mod translator;

pub use config::Config;
pub use error::{Error, Result};
