pub mod application;
pub mod backend;
pub mod buildinfo;
pub mod collector;
pub mod commands;
pub mod error;
pub mod http;
pub mod package;
pub mod runtime;
