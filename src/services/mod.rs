pub mod catalog;
pub mod insights;
pub mod rating;
pub mod store;
