pub mod handlers;
pub mod middleware;
pub mod publish;
pub mod routes;

pub use routes::create_router;
