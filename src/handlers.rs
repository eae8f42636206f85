pub mod identity;
pub mod inventory;
pub mod new_products;
pub mod receipts;
pub mod suppliers;
pub mod uploads;
