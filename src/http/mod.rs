//! HTTP layer
//!
//! Routing, multipart bodies and response building on top of hyper.

pub mod handlers;
pub mod multipart;
pub mod request;
pub mod response;
pub mod routes;

pub use handlers::handle_request;
pub use response::ResponseBody;
pub use routes::{Route, parse_route};
