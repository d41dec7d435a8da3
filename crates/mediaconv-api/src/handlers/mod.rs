pub mod download;
pub mod media;
pub mod root;
pub mod upload;
