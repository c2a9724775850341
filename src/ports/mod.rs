pub mod rating_store;
