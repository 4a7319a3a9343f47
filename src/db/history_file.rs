use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, error};

use crate::errors::AppError;
use crate::models::ChatRecord;

/// Reads the JSON array snapshot at `path`. A missing file is an empty history.
pub async fn load_history(path: &Path) -> Result<Vec<ChatRecord>, AppError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No chat history at {}", path.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            error!("Failed to read chat history {}: {e}", path.display());
            return Err(AppError::history_io(path.display().to_string(), e));
        }
    };

    serde_json::from_slice(&bytes).map_err(|e| {
        error!("Chat history {} is not valid JSON: {e}", path.display());
        AppError::history_io(path.display().to_string(), e)
    })
}

/// Writes `records` as a JSON array, via a sibling temp file so a crash
/// mid-write leaves the previous snapshot intact.
pub async fn save_history(path: &Path, records: &[ChatRecord]) -> Result<(), AppError> {
    let json = serde_json::to_vec(records)
        .map_err(|e| AppError::history_io(path.display().to_string(), e))?;

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &json)
        .await
        .map_err(|e| AppError::history_io(tmp.display().to_string(), e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| AppError::history_io(path.display().to_string(), e))?;

    debug!("Saved {} chats to {}", records.len(), path.display());
    Ok(())
}
