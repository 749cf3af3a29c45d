//! Captive portal HTTP surface

mod middleware;
mod router;
mod server;
mod upload;

pub use middleware::SLOW_REQUEST;
pub use router::{AppState, create_router};
pub use server::Portal;
