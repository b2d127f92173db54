mod buffer;
pub mod chunk;
mod filter;
mod handlers;
pub mod inflate;
pub mod info;
pub mod interlace;
mod push;
mod rows;
mod transform;

pub use push::{Mode, Pause, Processed, ProgressiveHandler, PushDecoder};
