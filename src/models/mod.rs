pub mod bar;
pub mod config;
pub mod manifest;
pub mod ticker;
