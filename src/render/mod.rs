pub mod canvas;
pub mod clock;
pub mod context;
pub mod error;
pub mod font;
