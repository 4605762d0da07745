pub mod check;
pub mod config;
pub mod hacks;
pub mod init;
pub mod map;
pub mod session;
pub mod synonym;
pub mod triggers;
