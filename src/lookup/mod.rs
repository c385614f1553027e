//! Read-through lookup pipeline: bounded cache, then the local table from
//! configuration, then the remote directory.

pub mod adapter;
pub mod cache;
pub mod local;
pub mod remote;

pub use adapter::{LookupAdapter, Reconfigured};
pub use cache::BoundedCache;
pub use local::LocalTable;
pub use remote::{FetchError, RemoteFetcher, RemoteSettings, UrlTemplate};
