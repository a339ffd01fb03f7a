//! recipe-core: shared types, configuration, prompt builder, in-memory session store,
//! and the per-day trace log used by the recipe assistant gateway.

mod error;
mod prompt;
mod session;
mod shared;
mod trace;

pub use error::{ConfigError, PersistenceError};
pub use prompt::{build_prompt, ChatTurn, Prompt, Role, SYSTEM_INSTRUCTION};
pub use session::SessionStore;
pub use shared::{
    new_session_id, AzureSettings, CoreConfig, Exchange, ProviderSettings, TraceRecord,
    DEFAULT_API_VERSION, ENV_API_KEY, ENV_API_VERSION, ENV_DEPLOYMENT_NAME, ENV_INSTANCE_NAME,
    ENV_PORT,
};
pub use trace::TraceLogger;
