//! sqlcli Core Types
//!
//! This crate provides the vocabulary shared by the parser, the gateway and
//! the statement loop:
//! - Run modes (interactive, non-interactive script, initialization file)
//! - The closed `Operation` union produced by the parser
//! - Typed session configuration options
//! - Result values, rows and table results
//! - The cooperative cancellation token

mod cancel;
mod config;
mod mode;
mod operation;
mod result;
mod value;

pub use cancel::*;
pub use config::*;
pub use mode::*;
pub use operation::*;
pub use result::*;
pub use value::*;
