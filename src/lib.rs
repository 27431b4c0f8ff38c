pub mod calculation;
pub mod cli;
pub mod config;
pub mod core;
pub mod exit;
pub mod generators;
pub mod logs;
pub mod reporters;
pub mod ui;
