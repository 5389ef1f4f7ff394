pub mod discovery;
pub mod manifest;
pub mod matcher;
pub mod scanner;
pub mod splitter;
