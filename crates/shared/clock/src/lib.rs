//! twinfeed Clock Infrastructure
//!
//! Time sources for tick timestamps:
//!
//! - [`SystemClock`]: wall-clock UTC time for real runs
//! - [`FixedClock`]: frozen or stepping time for tests
//!
//! The orchestrator reads the clock once per tick and stamps every
//! envelope of that tick with the same instant.

mod clock;
mod fixed;
mod system;

pub use clock::Clock;
pub use fixed::FixedClock;
pub use system::SystemClock;
