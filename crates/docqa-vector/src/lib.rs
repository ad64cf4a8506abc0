//! Exact vector index with on-disk persistence and the pipeline that builds
//! it from a PDF corpus.
//!
//! Modules:
//! - `writer`/`search`: the in-memory [`FlatIndex`]
//! - `table`/`schema`: save and load of the index directory
//! - `cache`: load-or-build decision over the index directory
//! - `index_build`: batching, retry and persistence

pub mod batches;
pub mod cache;
pub mod index_build;
pub mod retry;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use cache::{CacheState, IndexCache};
pub use index_build::{BuildOptions, BuildPhase, BuildReport, BuildStats, IndexBuilder, IndexOrigin};
pub use retry::RetryPolicy;
pub use schema::DistanceMetric;
pub use writer::FlatIndex;
