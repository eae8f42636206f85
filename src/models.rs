pub mod catalog;
pub mod identity;
pub mod inventory;
pub mod mapping;
pub mod new_product;
pub mod receipt;
pub mod upload;
