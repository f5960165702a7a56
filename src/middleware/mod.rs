pub mod auth;
pub mod error_handler;
pub mod request_id;

pub use auth::{hash_api_key, verify_api_key, ApiKeyAuth, ApiKeyRecord};
pub use error_handler::{json_error_handler, path_error_handler, query_error_handler};
pub use request_id::{CorrelationId, RequestId};
