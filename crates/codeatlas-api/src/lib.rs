//! Query Facade (C8): the narrow read-only surface the HTTP layer consumes,
//! plus its DTOs and error-kind mapping.

pub mod dto;
pub mod errors;
pub mod facade;

pub use dto::{CallChainDto, Category, PagedDto, Timed};
pub use errors::ApiError;
pub use facade::{QueryFacade, TraversalMode};
