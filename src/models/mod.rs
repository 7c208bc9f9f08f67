pub mod error;
pub mod position;
pub mod updates;
