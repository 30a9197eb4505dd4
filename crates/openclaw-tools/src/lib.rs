//! openclaw-tools: the tool-access policy engine.
//!
//! Provides:
//! - The built-in tool catalog with sections and profile memberships
//! - Tool name normalization and aliasing
//! - Group expansion (`group:<section>`, `group:openclaw`, `group:plugin:<id>`)
//! - Built-in and named profile resolution (minimal/coding/messaging/full)
//! - The layered allow/deny policy pipeline with operator diagnostics
//!
//! The engine is pure: it holds no state beyond the immutable catalog and
//! depends only on its inputs. Diagnostics are emitted through an injected
//! warn sink, never through `tracing::warn`, so the caller owns the surface.

pub mod catalog;
pub mod groups;
pub mod layers;
pub mod normalize;
pub mod pipeline;
pub mod policy;
pub mod profiles;
