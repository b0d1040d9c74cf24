//! `POST /ai-financial-advisor`: scripted advice from the client's expenses.

use axum::{body::Bytes, Json};
use tracing::debug;

use domain::models::{AdvisorRequest, AdvisorResponse};
use domain::services::generate_advice;

use crate::error::{parse_function_body, FunctionError};

pub async fn financial_advice(body: Bytes) -> Result<Json<AdvisorResponse>, FunctionError> {
    let request: AdvisorRequest = parse_function_body(&body)?;
    debug!(
        expenses = request.expenses.len(),
        goals = request.goals.len(),
        "Generating financial advice"
    );
    Ok(Json(AdvisorResponse {
        advice: generate_advice(&request),
    }))
}
