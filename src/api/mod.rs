pub mod analytics;
pub mod handlers;
pub mod routes;
pub mod suggest;

pub use handlers::{AppState, ErrorResponse};
pub use routes::create_api_router;
