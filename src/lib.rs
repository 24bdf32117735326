//! `CommanderBot` - a Discord companion bot
//!
//! This crate provides a small Discord bot: slash commands backed by public
//! REST APIs (weather, cocktails, jokes, memes, quotes, activities, eightball
//! readings), a welcome-image generator for new members, and server-activity
//! logging (message edits/deletes, joins/leaves, voice movement) to a
//! configured log channel.

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    // Security and correctness
    unsafe_code,
    unsafe_op_in_unsafe_fn,

    // Code quality - things that are almost always bugs
    unreachable_code,
    unreachable_patterns,
    unused_must_use,

    // Documentation - broken links are bugs
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    missing_docs,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::dbg_macro,
    clippy::semicolon_if_nothing_returned,
    future_incompatible,
    rust_2018_idioms,
)]
#![allow(
    clippy::module_name_repetitions,  // Common pattern in Rust
)]

/// REST adapters for the third-party APIs behind the fun/utility commands
pub mod adapters;
/// Discord bot interface - commands, event handlers, and bot context
pub mod bot;
/// Configuration loading from environment variables
pub mod config;
/// Display-object type for embeds plus shared formatting helpers
pub mod embeds;
/// Unified error types and result handling
pub mod errors;
/// Best-effort usage-analytics notifier
pub mod notifier;
/// Welcome-image compositor
pub mod welcome;
