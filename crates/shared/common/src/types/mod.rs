//! Shared response types.

mod pagination;
mod response;

pub use pagination::{Paginated, PaginationParams};
pub use response::ResponseData;
