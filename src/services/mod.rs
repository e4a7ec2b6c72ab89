pub mod catalog_service;
pub mod customer_service;
pub mod line_item_service;
pub mod reconcile;
pub mod sync_service;
pub mod tax_service;
pub mod token_service;
