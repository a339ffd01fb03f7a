//! Prompt builder: pairs the fixed recipe-assistant instruction with the user's message.

use serde::{Deserialize, Serialize};

/// Persona and answer layout for every request. Changing it requires a redeploy.
pub const SYSTEM_INSTRUCTION: &str = "You are a friendly, knowledgeable cooking assistant who helps people find and prepare recipes. \
When the user asks for a recipe, answer with these sections in order:\n\
1. Recipe name\n\
2. Ingredients: a bulleted list with quantities\n\
3. Steps: numbered preparation instructions\n\
4. Times: preparation time and cooking time\n\
5. Servings: how many people it serves\n\
6. Difficulty: easy, medium, or hard\n\
If the user asks a general cooking question, answer it clearly and concisely. \
Suggest substitutions when an ingredient may be hard to find, and mention common allergens when relevant.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One turn in the provider request, serialized as `{role, content}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

/// Two-turn prompt: the static system instruction and the caller's raw message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Turns in the order the provider expects them.
    pub fn messages(&self) -> Vec<ChatTurn> {
        vec![
            ChatTurn {
                role: Role::System,
                content: self.system.clone(),
            },
            ChatTurn {
                role: Role::User,
                content: self.user.clone(),
            },
        ]
    }
}

/// Builds the prompt for one chat request. The user message is passed through verbatim.
pub fn build_prompt(user_message: &str) -> Prompt {
    Prompt {
        system: SYSTEM_INSTRUCTION.to_string(),
        user: user_message.to_string(),
    }
}
