pub mod download;
pub mod handlers;
pub mod middleware;
pub mod newznab;
pub mod routes;

pub use routes::create_router;
