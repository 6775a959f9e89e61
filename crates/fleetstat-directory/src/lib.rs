pub mod client;

pub use client::HttpDirectoryClient;
