//! Sanity Content Lake backend for the gallery stores
//!
//! One `SanityClient` implements both `ContentStore` and `AssetStore` from
//! `stuntreel-core` over the project's query, mutation, and asset-upload
//! endpoints.

pub mod api;
pub mod client;
pub mod config;
pub mod queries;

pub use client::SanityClient;
pub use config::SanityConfig;
