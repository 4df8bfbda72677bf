pub mod config;
pub mod fetch_head;
pub mod fetcher;
pub mod item;
pub mod logging;
pub mod objects;
pub mod pipeline;
pub mod rate_limit;
pub mod retry;
pub mod stats;
pub mod store;
