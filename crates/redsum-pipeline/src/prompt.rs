use redsum_llm::Message;
use redsum_types::{GenerationSettings, Stage};
use thiserror::Error;

use crate::estimator::TokenEstimator;
use crate::templates::{
    BRIEF_INSTRUCTIONS, COLLECTING_INSTRUCTIONS, CONTENT_DELIMITER, REDUCING_INSTRUCTIONS,
    THREAD_HEADER_TEMPLATE,
};

/// Per-message overhead the chat format adds on top of the content.
pub const MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// Output room a prompt must leave, capped by the requested output length.
pub const MIN_OUTPUT_RESERVE: usize = 256;

/// How much of the framing around the content survived.
///
/// Levels are tried in declaration order; the content itself is never cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Full,
    NoHeader,
    NoQuery,
    ContentOnly,
}

impl Framing {
    const LEVELS: [Framing; 4] = [
        Framing::Full,
        Framing::NoHeader,
        Framing::NoQuery,
        Framing::ContentOnly,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadHeader {
    pub title: String,
    pub subreddit: String,
}

impl ThreadHeader {
    fn render(&self) -> String {
        THREAD_HEADER_TEMPLATE
            .replace("<title>", &self.title)
            .replace("<subreddit>", &self.subreddit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub system: Option<String>,
    pub user: String,
    pub prompt_tokens: usize,
    pub max_output_tokens: usize,
    pub framing: Framing,
}

impl BuiltPrompt {
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system {
            messages.push(Message::system(system.as_str()));
        }
        messages.push(Message::human(self.user.as_str()));
        messages
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("prompt needs {tokens} tokens but the context window allows {limit}")]
pub struct DoesNotFit {
    pub tokens: usize,
    pub limit: usize,
}

/// Assembles prompts that fit the model's context window.
pub struct PromptBuilder<'a> {
    estimator: &'a dyn TokenEstimator,
    settings: &'a GenerationSettings,
    header: &'a ThreadHeader,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(
        estimator: &'a dyn TokenEstimator,
        settings: &'a GenerationSettings,
        header: &'a ThreadHeader,
    ) -> Self {
        Self {
            estimator,
            settings,
            header,
        }
    }

    /// Build the prompt for one chunk, dropping framing until it fits.
    pub fn build(&self, stage: Stage, content: &str) -> Result<BuiltPrompt, DoesNotFit> {
        let context = self.settings.max_context_length();
        let reserve = self.settings.max_token_length().min(MIN_OUTPUT_RESERVE);
        let mut smallest = 0;

        for framing in Framing::LEVELS {
            let (system, user) = self.render(stage, framing, content);
            let prompt_tokens = self.count(system.as_deref(), &user);

            if prompt_tokens + reserve <= context {
                if framing != Framing::Full {
                    tracing::debug!(?framing, prompt_tokens, context, "Trimmed prompt framing to fit");
                }
                return Ok(BuiltPrompt {
                    system,
                    user,
                    prompt_tokens,
                    max_output_tokens: self.settings.max_token_length().min(context - prompt_tokens),
                    framing,
                });
            }
            smallest = prompt_tokens + reserve;
        }

        Err(DoesNotFit {
            tokens: smallest,
            limit: context,
        })
    }

    fn render(&self, stage: Stage, framing: Framing, content: &str) -> (Option<String>, String) {
        let instructions = match stage {
            Stage::Reducing => REDUCING_INSTRUCTIONS,
            _ => COLLECTING_INSTRUCTIONS,
        };
        let system = Some(self.settings.system_role())
            .filter(|role| !role.trim().is_empty())
            .map(str::to_string);

        match framing {
            Framing::Full => (
                system,
                format!(
                    "{}\n\n{}\n\n{}\n\n{}\n{}",
                    self.settings.query(),
                    self.header.render(),
                    instructions,
                    CONTENT_DELIMITER,
                    content
                ),
            ),
            Framing::NoHeader => (
                system,
                format!(
                    "{}\n\n{}\n\n{}\n{}",
                    self.settings.query(),
                    instructions,
                    CONTENT_DELIMITER,
                    content
                ),
            ),
            Framing::NoQuery => (
                system,
                format!("{}\n\n{}\n{}", BRIEF_INSTRUCTIONS, CONTENT_DELIMITER, content),
            ),
            Framing::ContentOnly => (None, content.to_string()),
        }
    }

    fn count(&self, system: Option<&str>, user: &str) -> usize {
        let model = self.settings.selected_model();
        let system_tokens = system
            .map(|s| self.estimator.estimate(s, model) + MESSAGE_OVERHEAD_TOKENS)
            .unwrap_or(0);
        system_tokens + self.estimator.estimate(user, model) + MESSAGE_OVERHEAD_TOKENS
    }
}
