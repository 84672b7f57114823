pub mod export;
pub mod file;
