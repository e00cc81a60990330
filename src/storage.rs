use crate::errors::AppError;
use crate::models::LedgerData;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

pub async fn load_data(path: &Path) -> LedgerData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<LedgerData>(&bytes) {
            Ok(data) => {
                info!(
                    sessions = data.results.len(),
                    clubs_with_commission = data.commissions.len(),
                    "loaded ledger from {}",
                    path.display()
                );
                data
            }
            Err(err) => {
                error!("failed to parse ledger file: {err}");
                LedgerData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => LedgerData::default(),
        Err(err) => {
            error!("failed to read ledger file: {err}");
            LedgerData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &LedgerData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}
