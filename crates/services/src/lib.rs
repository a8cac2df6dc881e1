pub mod cart;
pub mod catalog;
pub mod session;

pub use cart::{CartService, CartServiceError, ResolvedCart};
pub use catalog::{CatalogError, CatalogService, ProductDraft};
pub use session::{SessionError, SessionGrant, SessionPolicy};
