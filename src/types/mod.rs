//! Response and pagination types shared by the handlers.

mod pagination;
mod response;

pub use pagination::{Paginated, PaginationMeta, UserList};
pub use response::{Created, MessageResponse, NoContent};
