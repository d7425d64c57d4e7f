pub mod chat;
pub mod config_cmd;
pub mod runtime;
pub mod search;
pub mod tools;
