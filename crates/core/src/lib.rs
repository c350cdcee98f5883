#![forbid(unsafe_code)]

pub mod analytics;
pub mod codec;
pub mod model;
pub mod time;

pub use codec::{CodecError, RecordCodec, SessionCodec};
pub use time::Clock;
