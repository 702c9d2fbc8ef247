//! Game launch boundary
//!
//! Builds a [`LaunchRequest`] from the signed-in session and the user's
//! preferences, hands it to a [`GameLauncher`] and reports what the game
//! process does through a [`LaunchHandle`].

pub mod command;
pub mod errors;
pub mod events;
pub mod handle;
pub mod launcher;
pub mod request;

pub use command::CommandLauncher;
pub use errors::{LaunchError, Result};
pub use events::LaunchEvent;
pub use handle::{LaunchHandle, LaunchOutcome};
pub use launcher::GameLauncher;
pub use request::{LaunchRequest, WindowSize};
