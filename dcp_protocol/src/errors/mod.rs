mod dcp_error;

pub use dcp_error::*;
