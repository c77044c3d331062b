//! Wire types for the DCP direct-control protocol.
//!
//! DCP is a legacy fixed-header binary protocol spoken by robot-teaching
//! clients over raw TCP. This crate owns everything that touches the wire:
//! the 56-byte frame header, the numeric command and error code spaces, the
//! packed status bit-vector carried in every response, direct-variable
//! typing, and the little-endian payload packing rules. It performs no I/O;
//! the server crate drives it from its connection loops.

pub mod command;
pub mod errors;
pub mod frame;
pub mod status;
pub mod value;
pub mod variables;

pub use command::CommandCode;
pub use errors::{DcpError, DcpErrorCode};
pub use frame::{Frame, Header};
pub use status::StatusBits;
pub use value::{DcpValue, PayloadReader};
pub use variables::{DirectValue, DirectVarType};

/// Default joint count for the supported arm models. Configurations may
/// override this; payload layouts scale with it.
pub const DEFAULT_DOF: usize = 6;

/// Task-space poses are always six doubles (x, y, z, u, v, w) regardless of
/// joint count.
pub const TASK_DOF: usize = 6;
