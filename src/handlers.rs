use crate::aggregate::aggregate;
use crate::backup::{backup_filename, build_backup, parse_backup};
use crate::dates::parse_reference_date;
use crate::errors::AppError;
use crate::models::{
    CommissionInput, CommissionRate, CreatedResponse, MessageResponse, PeriodQuery, PeriodResponse,
    RestoreResponse, SessionInput,
};
use crate::navigator::{advance, Direction};
use crate::period::{resolve, PeriodKind, PeriodSettings, PeriodWindow};
use crate::rollup_cache::{should_skip_render, Fingerprint};
use crate::state::AppState;
use crate::storage::persist_data;
use crate::ui::{render_index, render_summary_cards};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

/// A period request after validation: the kind, the reference date, and the
/// window both as local wall time and as UTC instants.
struct ResolvedPeriod {
    kind: PeriodKind,
    reference: NaiveDate,
    local: PeriodWindow,
    utc: PeriodWindow<DateTime<Utc>>,
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let today = Local::now().date_naive();
    let (label, rollups) = match resolve(PeriodKind::Day, today, &PeriodSettings::default()) {
        Ok(window) => {
            let data = state.data.lock().await;
            let records = data.records_in_window(&window.localize(&Local));
            (window_label(&window), aggregate(&records, data.commission_rates()))
        }
        Err(err) => {
            warn!("failed to resolve today's window: {err}");
            (String::new(), Vec::new())
        }
    };

    let mut view = state.summary_view.lock().await;
    let (summary_html, skipped) = view.render_with(&rollups, render_summary_cards);
    debug!(skipped, clubs = rollups.len(), "index summary");
    Html(render_index(&label, summary_html))
}

pub async fn create_result(
    State(state): State<AppState>,
    Json(payload): Json<SessionInput>,
) -> Result<Json<CreatedResponse>, AppError> {
    let session = payload.validate(&Local)?;

    let mut data = state.data.lock().await;
    let club = session.club_name.clone();
    let id = data.insert(session, Utc::now());
    persist_data(&state.data_path, &data).await?;

    info!(id, club = %club, "session recorded");
    Ok(Json(CreatedResponse {
        id,
        message: "Result added successfully".to_string(),
    }))
}

pub async fn list_results(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let period = resolve_query(&query)?;
    let records = {
        let data = state.data.lock().await;
        match &period {
            Some(period) => data.records_in_window(&period.utc),
            None => data.all_records(),
        }
    };
    Ok(conditional_json(&headers, records))
}

pub async fn update_result(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<SessionInput>,
) -> Result<Json<MessageResponse>, AppError> {
    let session = payload.validate(&Local)?;

    let mut data = state.data.lock().await;
    if !data.update(id, session) {
        return Err(AppError::not_found("Result not found"));
    }
    persist_data(&state.data_path, &data).await?;

    info!(id, "session updated");
    Ok(Json(MessageResponse::new("Result updated successfully")))
}

pub async fn delete_result(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut data = state.data.lock().await;
    if !data.remove(id) {
        return Err(AppError::not_found("Result not found"));
    }
    persist_data(&state.data_path, &data).await?;

    info!(id, "session deleted");
    Ok(Json(MessageResponse::new("Result deleted successfully")))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let period = resolve_query(&query)?;
    let rollups = {
        let data = state.data.lock().await;
        let records = match &period {
            Some(period) => data.records_in_window(&period.utc),
            None => data.all_records(),
        };
        aggregate(&records, data.commission_rates())
    };
    Ok(conditional_json(&headers, rollups))
}

pub async fn get_period(Query(query): Query<PeriodQuery>) -> Result<Json<PeriodResponse>, AppError> {
    let raw = query
        .period
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(PeriodKind::Day.as_str());
    let period = resolve_period(raw, &query)?;
    let previous = advance(period.kind, period.reference, Direction::Previous)?;
    let next = advance(period.kind, period.reference, Direction::Next)?;

    Ok(Json(PeriodResponse {
        period: period.kind.to_string(),
        date: period.reference.to_string(),
        start: period.utc.start,
        end: period.utc.end,
        local_start: wall_time(period.local.start),
        local_end: wall_time(period.local.end),
        previous: previous.to_string(),
        next: next.to_string(),
    }))
}

pub async fn list_commissions(State(state): State<AppState>) -> Json<Vec<CommissionRate>> {
    let data = state.data.lock().await;
    Json(data.commission_list())
}

pub async fn upsert_commission(
    State(state): State<AppState>,
    Path(club): Path<String>,
    Json(payload): Json<CommissionInput>,
) -> Result<Json<CommissionRate>, AppError> {
    let percentage = payload
        .commission_percentage
        .ok_or_else(|| AppError::bad_request("commission_percentage is required"))?;

    let mut data = state.data.lock().await;
    let rate = data.upsert_commission(&club, percentage)?;
    persist_data(&state.data_path, &data).await?;

    info!(club = %rate.club_name, percentage, "commission saved");
    Ok(Json(rate))
}

pub async fn delete_commission(
    State(state): State<AppState>,
    Path(club): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut data = state.data.lock().await;
    if !data.remove_commission(&club) {
        return Err(AppError::not_found("Commission not found"));
    }
    persist_data(&state.data_path, &data).await?;

    info!(club = %club, "commission removed");
    Ok(Json(MessageResponse::new("Commission removed successfully")))
}

pub async fn backup(State(state): State<AppState>) -> Response {
    let now = Utc::now();
    let document = {
        let data = state.data.lock().await;
        build_backup(&data, now)
    };
    info!(sessions = document.data.len(), "backup exported");

    let disposition = format!("attachment; filename=\"{}\"", backup_filename(now));
    ([(header::CONTENT_DISPOSITION, disposition)], Json(document)).into_response()
}

pub async fn restore(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RestoreResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?
    {
        if field.name() == Some("backup") {
            let bytes = field
                .bytes()
                .await
                .map_err(|err| AppError::bad_request(err.to_string()))?;
            upload = Some(bytes);
            break;
        }
    }
    let Some(bytes) = upload else {
        return Err(AppError::bad_request("No backup file provided"));
    };

    let payload = parse_backup(&bytes)?;
    let mut data = state.data.lock().await;
    let outcome = data.restore(payload.rows, payload.commissions, &Local, Utc::now());
    persist_data(&state.data_path, &data).await?;

    let skipped = outcome.skipped + payload.unreadable_rows;
    info!(restored = outcome.restored, skipped, "ledger restored from backup");
    Ok(Json(RestoreResponse {
        message: "Database restored successfully".to_string(),
        restored_records: outcome.restored,
        skipped_records: skipped,
    }))
}

/// `None` when the request carries no `period`, meaning "no filter".
fn resolve_query(query: &PeriodQuery) -> Result<Option<ResolvedPeriod>, AppError> {
    match query.period.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(raw) => resolve_period(raw, query).map(Some),
        None => Ok(None),
    }
}

fn resolve_period(raw_period: &str, query: &PeriodQuery) -> Result<ResolvedPeriod, AppError> {
    let kind: PeriodKind = raw_period.parse()?;
    let settings = PeriodSettings::from_query(query.day_start_time.as_deref(), query.week_start_day.as_deref())?;
    let reference = match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => parse_reference_date(raw, &Local)?,
        None => Local::now().date_naive(),
    };
    let local = resolve(kind, reference, &settings)?;

    Ok(ResolvedPeriod {
        kind,
        reference,
        local,
        utc: local.localize(&Local),
    })
}

/// Serves `items` as JSON tagged with their fingerprint, or 304 when the
/// client already holds that fingerprint.
fn conditional_json<T: Fingerprint + Serialize>(headers: &HeaderMap, items: Vec<T>) -> Response {
    let last = if_none_match(headers);
    let decision = should_skip_render(&items, last.as_deref());
    let etag = format!("\"{}\"", decision.fingerprint);

    if decision.skip {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }
    ([(header::ETAG, etag)], Json(items)).into_response()
}

fn if_none_match(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::IF_NONE_MATCH)?.to_str().ok()?;
    let tag = raw.trim().trim_start_matches("W/").trim_matches('"');
    Some(tag.to_string())
}

fn wall_time(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M").to_string()
}

fn window_label(window: &PeriodWindow) -> String {
    format!("{} → {}", window.start.format("%Y-%m-%d %H:%M"), window.end.format("%Y-%m-%d %H:%M"))
}
