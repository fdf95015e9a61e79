pub mod contacts;
pub mod distance;
pub mod geocoding;
pub mod media;
pub mod translation;
