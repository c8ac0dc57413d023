//! Entries API endpoints
use api_types::entry::{EntryForm, EntryRow, EntryUpdate, HistoryPoint};
use axum::{
    Form, Json,
    extract::{
        Path, State,
        rejection::{FormRejection, JsonRejection},
    },
};

use crate::{ServerError, server::ServerState};

fn required(value: Option<String>, name: &str) -> Result<String, ServerError> {
    value.ok_or_else(|| ServerError::Generic(format!("Error: Missing field {name}")))
}

pub async fn submit(
    State(state): State<ServerState>,
    form: Result<Form<EntryForm>, FormRejection>,
) -> Result<&'static str, ServerError> {
    let Form(form) = form.map_err(|_| ServerError::Generic("Invalid format".to_string()))?;
    let date = required(form.date, "date")?;
    let amount = required(form.amount, "amount")?;
    let description = required(form.description, "description")?;
    let category = required(form.category, "category")?;

    state
        .engine
        .add_entry(&date, &amount, &description, &category)
        .await?;

    Ok("OK")
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    payload: Result<Json<EntryUpdate>, JsonRejection>,
) -> Result<&'static str, ServerError> {
    let Json(payload) = payload.map_err(|_| ServerError::Generic("Invalid format".to_string()))?;
    let amount = payload.amount.map(|a| a.into_text()).unwrap_or_default();
    let date = required(payload.date, "date")?;
    let description = required(payload.description, "description")?;
    let category = required(payload.category, "category")?;

    state
        .engine
        .update_entry(id, &date, &amount, &description, &category)
        .await?;

    Ok("OK")
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<&'static str, ServerError> {
    state.engine.delete_entry(id).await?;
    Ok("OK")
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<EntryRow>>, ServerError> {
    let rows = state
        .engine
        .entries()
        .await?
        .into_iter()
        .map(|e| (e.id, e.date, e.amount, e.description, e.category))
        .collect();
    Ok(Json(rows))
}

pub async fn history(
    State(state): State<ServerState>,
) -> Result<Json<Vec<HistoryPoint>>, ServerError> {
    let points = state
        .engine
        .history()
        .await?
        .into_iter()
        .map(|p| HistoryPoint {
            date: p.date,
            amount: p.amount,
            category: p.category,
        })
        .collect();
    Ok(Json(points))
}
