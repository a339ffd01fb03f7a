//! Model adapters for the recipe assistant.
//!
//! [`ChatModel`] is the seam the gateway calls; [`ModelRouter`] talks to Azure OpenAI
//! and [`MockModel`] answers offline.

mod error;
mod model_router;

pub use error::ProviderError;
pub use model_router::{ChatModel, MockModel, ModelRouter};
