//! # ztrend engine
//!
//! Finds tokens that are trending: showing up with unusual weight "right now"
//! compared to their own history.
//!
//! ## Architecture
//!
//! ```text
//! Caller objects
//!     │
//!     ├──> Type Registry (tag → interpreter + weight function)
//!     │      └─> Document { timestamp, tokens }
//!     │
//!     ├──> Window Index
//!     │      └─> every window [start, start + size) containing the timestamp,
//!     │          starts spaced `granularity` apart
//!     │
//!     ├──> Historical Token Store
//!     │      ├─> per-token, per-window weighted scores
//!     │      └─> finalization backfills zero-score windows
//!     │
//!     └──> Scoring
//!            ├─> current weight per token across the batch
//!            └─> z = (current − mean(baseline)) / stdev(baseline)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use ztrend_engine::{Document, DocumentSource, Trending, TrendingConfig};
//!
//! struct Post {
//!     at: i64,
//!     tags: Vec<String>,
//! }
//!
//! impl DocumentSource for Post {
//!     fn type_tag(&self) -> &str {
//!         "post"
//!     }
//! }
//!
//! let mut trending = Trending::new(TrendingConfig::new(900, 120, false)).unwrap();
//! trending.register_type(
//!     "post",
//!     |post: &Post| (post.at, post.tags.clone()),
//!     |_: &Document<'_, Post, String>, _: &String| 1.0,
//! );
//!
//! let post = |at: i64, tag: &str| Post { at, tags: vec![tag.to_string()] };
//! trending
//!     .add_historical_documents(&[post(0, "rust"), post(0, "rust"), post(600, "rust")])
//!     .unwrap();
//!
//! for (tag, z) in trending.get_trending(&[post(1200, "rust")]).unwrap() {
//!     println!("{tag}: {z:.2}");
//! }
//! ```

mod config;
mod document;
mod error;
pub mod stats;
mod token;
mod trending;
mod window;

pub use config::{TrendingConfig, UnknownTokenPolicy};
pub use document::{
    Document, DocumentSource, Interpreter, SupportedDocumentType, TypeRegistry, WeightFunction,
};
pub use error::{Result, TrendingError};
pub use token::{Token, TokenStore, TokenValue};
pub use trending::Trending;
pub use window::{Window, WindowIndex};
