pub mod error;
pub mod money;
pub mod tenant;

pub use error::{AppError, Result};
pub use tenant::{Role, TenantContext};
