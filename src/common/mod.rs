pub mod client;
pub mod error;
pub mod logger;
pub mod page;
pub mod urls;
