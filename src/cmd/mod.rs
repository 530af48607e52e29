//! Command frame builders and response structs for the Si4464 command set

pub mod cmd_common;
pub mod cmd_prop;
