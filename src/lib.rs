//! Scraping engine for video detail pages and their release listings.
//!
//! A [`SiteAdapter`] describes one site as data; a [`Spider`] runs the two
//! scrapes against it over any [`Transport`].

pub mod adapter;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod rows;
pub mod sources;
pub mod transport;
pub mod types;
pub mod util;

pub use adapter::{AdapterSpec, SiteAdapter};
pub use config::Config;
pub use error::{AdapterError, ScrapeError};
pub use pipeline::Spider;
pub use transport::{HttpTransport, Request, Response, Transport};
pub use types::{SubscribeScrape, VideoActor, VideoDetail};
