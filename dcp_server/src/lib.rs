//! The DCP server: accepts legacy teaching clients over raw TCP and bridges
//! them onto the backend robot controller.
//!
//! The crate is a library; the runnable binary lives in the `sim` workspace
//! member, which wires a simulated backend into [`server::DcpServer`]. A
//! production deployment replaces that with a bridge task servicing the
//! [`backend::BackendRequest`] channel against the real controller services.

pub mod backend;
pub mod config;
pub mod dispatch;
pub mod server;
pub mod session;
pub mod status;
pub mod waypoint;

pub use backend::Backend;
pub use config::DcpServerConfig;
pub use server::DcpServer;
