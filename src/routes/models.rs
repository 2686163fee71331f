//! Models endpoint
//!
//! Lists the single model identifier the gateway exposes. Every request is
//! served by the same downstream agent regardless of the model a client asks
//! for.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{FamilyError, GatewayError, ProtocolFamily},
    AppState,
};

/// Model information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
}

/// Models list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub object: String,
    pub data: Vec<Model>,
}

fn exposed_model(state: &AppState) -> Model {
    Model {
        id: state.config.model_name.clone(),
        object: "model".to_string(),
        created: state.started_at.timestamp(),
        owned_by: "agent-gateway".to_string(),
    }
}

/// List available models
pub async fn list_models(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ModelsResponse>) {
    let response = ModelsResponse {
        object: "list".to_string(),
        data: vec![exposed_model(&state)],
    };

    (StatusCode::OK, Json(response))
}

/// Get a single model by ID
pub async fn get_model(
    State(state): State<Arc<AppState>>,
    Path(model_id): Path<String>,
) -> Result<(StatusCode, Json<Model>), FamilyError> {
    if model_id != state.config.model_name {
        return Err(GatewayError::Validation {
            status: StatusCode::NOT_FOUND,
            message: format!("The model '{}' does not exist", model_id),
        }
        .for_family(ProtocolFamily::OpenAi));
    }

    Ok((StatusCode::OK, Json(exposed_model(&state))))
}
