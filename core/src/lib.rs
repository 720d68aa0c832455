extern crate self as dpos_core;

pub mod log;
pub mod panic;
pub mod time;
