//! Application Layer - Ports and abstractions
//!
//! Contains the abstract traits and types that define the transport interface.
//! Other crates depend on these abstractions, not concrete implementations.

pub mod error;
pub mod state;
pub mod traits;

pub use error::TransportError;
pub use state::{ConnectionState, wait_for_connection};
pub use traits::{BoxTransport, Transport};
