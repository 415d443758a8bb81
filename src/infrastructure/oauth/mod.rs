//! OAuth state store implementations
//!
//! In-memory (moka) and Redis backends, selected at runtime.

mod factory;
mod in_memory;
mod redis;

pub use factory::{OAuthStateBackend, OAuthStateStoreConfig, create_oauth_state_store};
pub use in_memory::InMemoryOAuthStateStore;
pub use self::redis::RedisOAuthStateStore;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::domain::{DomainError, RandomSource};

const STATE_BYTES: usize = 32;

/// Fresh unguessable state token
fn generate_state(random: &dyn RandomSource) -> Result<String, DomainError> {
    let mut bytes = [0u8; STATE_BYTES];
    random.fill(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
