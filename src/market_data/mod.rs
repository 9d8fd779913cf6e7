pub mod adapters;
pub mod feed_parser;
pub mod poller;
pub mod types;
