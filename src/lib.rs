pub mod bot;
pub mod catalog;
pub mod config;
pub mod error;
pub mod limiter;
pub mod message;
pub mod search;

pub use bot::Bot;
pub use catalog::{CatalogSource, CatalogStore, JsonCatalogSource};
pub use limiter::{ChannelDirectory, RateLimiter};
pub use message::OutboundChannel;
pub use search::SearchEngine;
