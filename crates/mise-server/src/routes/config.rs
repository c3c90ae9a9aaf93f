use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/config — effective `.mise/config.yaml` plus validation warnings.
pub async fn get_config(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let config = mise_core::config::Config::load(&root)?;
        let warnings: Vec<String> = config
            .validate()
            .into_iter()
            .map(|w| w.message)
            .collect();
        Ok::<_, mise_core::MiseError>(serde_json::json!({
            "config": config,
            "output_root": config.output_root(&root),
            "warnings": warnings,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
