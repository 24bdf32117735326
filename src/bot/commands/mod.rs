//! Slash command implementations organized by category.

/// Fun commands backed by public REST APIs plus the dice roll
pub mod fun;
/// Utility commands - echo, weather, help, and the welcome-image test
pub mod utility;

// Export commands
pub use fun::*;
pub use utility::*;
