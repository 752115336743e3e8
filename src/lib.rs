//! Publish podcasts on IPFS.
//!
//! A channel is a directory holding `channel.json`, an append-only `episodes.json` and a feed
//! template. Episodes are appended with [`Channel::add_episode`]; [`Channel::publish`] renders
//! the feed and points the channel's IPNS name at it.

pub mod channel;
pub mod config;
pub mod episodes;
pub mod feed;
pub mod media;
pub mod metadata;
pub mod store;

pub(crate) mod utils;

pub use channel::{Channel, NewChannel, NewEpisode, Publication};
pub use config::Settings;
pub use store::{ContentStore, IpfsCli, KeyStore};
