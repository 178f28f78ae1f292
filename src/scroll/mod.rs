pub mod driver;
pub mod header;
pub mod progress;
