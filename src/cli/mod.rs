pub mod auth;
pub mod config_cmd;
pub mod files;
pub mod notes;
pub mod output;
