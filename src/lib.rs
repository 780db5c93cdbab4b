pub mod cell;
pub mod config;
pub mod error;
pub mod frame;
pub mod monitor;
pub mod station;
pub mod wire;

pub use cell::SharedCell;
pub use error::Error;
pub use frame::FrameBuffer;
