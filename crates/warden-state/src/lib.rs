//! # warden-state
//!
//! Typed, namespaced session state for the Warden enforcement kernel.
//!
//! Every piece of session state lives in its own *domain*: an independent JSON
//! record identified by a domain name (`research`, `requirements`,
//! `circuit_breaker`, ...). The [`StateStore`] loads, updates, and resets domains
//! through an injected [`StateBackend`], so the rest of the kernel never touches
//! files directly.
//!
//! ## Key invariants
//!
//! - **Corruption is never fatal**: an unreadable or invalid record loads as the
//!   domain default.
//! - **Write-through**: `put`, `update`, and `reset` persist before returning.
//! - **Per-domain criticality**: storage failures on telemetry domains are logged
//!   and swallowed; failures on domains enforcement depends on are returned.

pub mod attempts;
pub mod breaker;
pub mod error;
pub mod halt;
pub mod layout;
pub mod patterns;
pub mod requirements;
pub mod research;
pub mod store;

pub use attempts::{EditAttemptCounter, EDIT_ATTEMPT_CEILING};
pub use breaker::{CircuitBreaker, DEFAULT_BREAKER_THRESHOLD};
pub use error::StoreError;
pub use halt::HaltState;
pub use layout::ProjectLayout;
pub use patterns::{PatternEvent, PatternLog, PATTERN_EVENT_CAPACITY};
pub use requirements::RequirementSet;
pub use research::{ParseCategoryError, ResearchCategory, ResearchStatus};
pub use store::{Domain, FileBackend, MemoryBackend, StateBackend, StateStore, UpdateGuard};
