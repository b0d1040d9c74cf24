//! `POST /sync-account`: pulls transactions for one connected account.

use axum::{body::Bytes, extract::State, Json};

use domain::models::account::{SyncAccountRequest, SyncAccountResponse};
use domain::services::SyncError;

use crate::app::AppState;
use crate::error::{parse_function_body, FunctionError};
use crate::middleware::metrics::record_account_sync;

pub async fn sync_account(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SyncAccountResponse>, FunctionError> {
    let request: SyncAccountRequest = parse_function_body(&body)?;
    let account_id = request
        .account_id
        .ok_or_else(|| FunctionError::bad_request(SyncError::MissingAccountId.to_string()))?;

    // Errors before the run starts are request errors; a run that fails
    // midway still reports how many transactions it stored.
    match state.account_sync.sync(account_id, request.sync_type).await {
        Ok(outcome) => {
            record_account_sync(outcome.succeeded());
            Ok(Json(outcome.into()))
        }
        Err(e) => {
            record_account_sync(false);
            Err(FunctionError::bad_request(e.to_string()))
        }
    }
}
