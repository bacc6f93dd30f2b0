//! GitHub organization teams as a [`teamsync_core::GroupProvider`].

pub mod client;
pub mod config;
pub mod models;

pub use client::GithubClient;
pub use config::GithubConfig;
