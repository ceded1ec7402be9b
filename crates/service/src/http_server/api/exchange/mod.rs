pub mod create;
pub mod manifest;
