//! Command implementations for bms-cli

pub mod decode;
pub mod detect;
pub mod flags;
pub mod summary;

pub use decode::decode;
pub use detect::{detect, DetectArgs};
pub use flags::flags;
pub use summary::summary;
