use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/manifest — the artifact ledger for the workspace.
///
/// A missing or unreadable ledger reads as empty; `recovered` reports the
/// latter.
pub async fn get_manifest(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let config = mise_core::config::Config::load(&root)?;
        let loaded = mise_core::manifest::load(&config.output_root(&root));
        Ok::<_, mise_core::MiseError>(serde_json::json!({
            "artifacts": loaded.manifest.artifacts,
            "recovered": loaded.recovered_from.is_some(),
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(result))
}
