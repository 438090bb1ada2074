use serde::{Deserialize, Serialize};

/// Per-model defaults offered to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub name: String,
    pub id: String,
    pub default_chunk_token_length: usize,
    pub default_number_of_summaries: usize,
    pub max_token_length: usize,
    pub max_context_length: usize,
}

/// Context window used for models missing from the catalog.
pub const FALLBACK_CONTEXT_LENGTH: usize = 4000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelCatalog {
    models: Vec<ModelProfile>,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelProfile>) -> Self {
        Self { models }
    }

    /// Look a model up by id, falling back to its display name.
    pub fn find(&self, model: &str) -> Option<&ModelProfile> {
        self.models
            .iter()
            .find(|m| m.id == model)
            .or_else(|| self.models.iter().find(|m| m.name.eq_ignore_ascii_case(model)))
    }

    pub fn context_length_for(&self, model: &str) -> usize {
        self.find(model)
            .map(|m| m.max_context_length)
            .unwrap_or(FALLBACK_CONTEXT_LENGTH)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelProfile> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ModelCatalog {
        ModelCatalog::new(vec![ModelProfile {
            name: "GPT-4o mini".to_string(),
            id: "gpt-4o-mini".to_string(),
            default_chunk_token_length: 4000,
            default_number_of_summaries: 3,
            max_token_length: 1500,
            max_context_length: 128_000,
        }])
    }

    #[test]
    fn test_find_by_id_and_name() {
        let catalog = catalog();
        assert!(catalog.find("gpt-4o-mini").is_some());
        assert!(catalog.find("gpt-4o mini").is_some());
        assert!(catalog.find("claude").is_none());
    }

    #[test]
    fn test_unknown_model_uses_fallback_context() {
        let catalog = catalog();
        assert_eq!(catalog.context_length_for("gpt-4o-mini"), 128_000);
        assert_eq!(catalog.context_length_for("mystery"), FALLBACK_CONTEXT_LENGTH);
    }
}
