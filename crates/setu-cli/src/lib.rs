//! Library components of the `setu` command-line tool.

#![deny(unsafe_code)]

pub mod batch_io;
pub mod logging;
pub mod session;
