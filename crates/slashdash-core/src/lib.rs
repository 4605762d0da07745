pub mod catalog;
pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod hacks;
pub mod history;
pub mod injector;
pub mod io;
pub mod mapper;
pub mod paths;
pub mod pipeline;
pub mod protocol;
pub mod suggestion;
pub mod synonyms;
pub mod tracker;
pub mod trigger;
pub mod types;
pub mod weights;

pub use error::{Result, SlashdashError};
