//! OAuth login state
//!
//! Short-lived CSRF state correlating an authorization request with its
//! callback. Each state is consumable exactly once.

mod state;
mod store;

pub use state::{OAuthPendingState, ProviderType};
pub use store::{DEFAULT_STATE_TTL_SECS, MAX_STATE_TTL_SECS, OAuthStateStore, clamp_state_ttl};
