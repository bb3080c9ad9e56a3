pub mod clock;
pub mod ticker;
pub mod timestamp;
