//! HTTP shell of the Mediathek indexer bridge: the Newznab endpoint, the
//! download-resolution endpoint and the operational endpoints.

pub mod api;
pub mod metrics;
pub mod state;

pub use api::create_router;
pub use state::AppState;
