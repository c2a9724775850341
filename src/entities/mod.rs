pub mod artist;
pub mod catalog_update;
pub mod rating;
pub mod track;
pub mod track_artist;
