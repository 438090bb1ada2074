use axum::{extract::State, Json};
use redsum_types::ModelProfile;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub default_model: String,
    pub models: Vec<ModelProfile>,
}

pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        default_model: state.config.summarizer.default_model.clone(),
        models: state.config.models.iter().cloned().collect(),
    })
}
