//! Service layer for the watcher.
//!
//! This module contains the business logic for:
//! - Keyword matching (`Keywords`)
//! - Identity keys (`build_key`)
//! - MOPS API access (`MopsClient`)
//! - Push notifications (`Notifier`)

pub mod identity;
pub mod keywords;
pub mod mops;
pub mod notifier;

pub use identity::{IdentityFields, build_key};
pub use keywords::Keywords;
pub use mops::{DisclosureSource, MopsClient};
pub use notifier::{ChannelKind, ChannelOutcome, Digest, Notifier, NotifyChannel, NotifyReport};
