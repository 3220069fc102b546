pub mod config;
pub mod dir_types;
pub mod dir_utils;
pub mod directory;
pub mod errors;
