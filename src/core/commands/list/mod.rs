// src/core/commands/list/mod.rs

pub mod blpop;
pub mod llen;
pub mod lpop;
pub mod lrange;
pub mod push;

pub use blpop::BLPop;
pub use llen::LLen;
pub use lpop::LPop;
pub use lrange::LRange;
pub use push::{LPush, RPush};
