//! Rendering of the service/socket unit pair that runs one game server.
//!
//! The socket unit owns a FIFO wired to the server's standard input, so
//! console commands can be injected with a plain write to the FIFO while the
//! service itself stays a simple foreground process.

pub mod command;
mod error;
pub mod names;
pub mod unit;
pub mod writer;

pub use command::StartupCommand;
pub use error::UnitError;
pub use names::UnitNames;
pub use unit::{ServiceUnit, SocketUnit, UnitPair};
pub use writer::{remove_units, write_units};
