pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod namer;
pub mod output;
pub mod reconcile;
pub mod report;
pub mod resolve;
pub mod tables;
