use crate::{error::AppError, extract::CurrentUser, AppState};
use analytics::{
    CoinPerformance, EmotionPerformance, HourPerformance, InsightsReport, StrategyPerformance,
    SummaryReport,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use core_types::{timestamp, BotTradeImport, DateRange, NewTrade, Trade, TradeFilter, TradePatch};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummaryQuery {
    #[serde(deserialize_with = "timestamp::deserialize_optional")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp::deserialize_optional")]
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub message: String,
    pub trades: Vec<Trade>,
}

fn trade_not_found(trade_id: Uuid) -> AppError {
    AppError::NotFound(format!("Trade {} not found", trade_id))
}

/// # GET /api/health
pub async fn health() -> &'static str {
    "OK"
}

/// # GET /api/trades
pub async fn list_trades(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    filter: Result<Query<TradeFilter>, QueryRejection>,
) -> Result<Json<Vec<Trade>>, AppError> {
    let Query(filter) = filter?;
    let trades = state.store.list_trades(user_id, &filter).await?;
    Ok(Json(trades))
}

/// # POST /api/trades
pub async fn create_trade(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<NewTrade>, JsonRejection>,
) -> Result<(StatusCode, Json<Trade>), AppError> {
    let Json(input) = payload?;
    let trade = state.store.create_trade(user_id, input).await?;
    Ok((StatusCode::CREATED, Json(trade)))
}

/// # GET /api/trades/:trade_id
pub async fn get_trade(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    trade_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Trade>, AppError> {
    let Path(trade_id) = trade_id?;
    state
        .store
        .get_trade(user_id, trade_id)
        .await?
        .map(Json)
        .ok_or_else(|| trade_not_found(trade_id))
}

/// # PUT /api/trades/:trade_id
pub async fn update_trade(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    trade_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TradePatch>, JsonRejection>,
) -> Result<Json<Trade>, AppError> {
    let Path(trade_id) = trade_id?;
    let Json(patch) = payload?;
    state
        .store
        .update_trade(user_id, trade_id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| trade_not_found(trade_id))
}

/// # DELETE /api/trades/:trade_id
pub async fn delete_trade(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    trade_id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(trade_id) = trade_id?;
    if state.store.delete_trade(user_id, trade_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(trade_not_found(trade_id))
    }
}

/// # POST /api/trades/import
/// Imports a batch of closed bot trades; either all rows are stored or none.
pub async fn import_trades(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    payload: Result<Json<Vec<BotTradeImport>>, JsonRejection>,
) -> Result<Json<ImportResponse>, AppError> {
    let Json(rows) = payload?;
    let trades = state.store.import_bot_trades(user_id, rows).await?;
    Ok(Json(ImportResponse {
        message: format!("{} trades imported successfully.", trades.len()),
        trades,
    }))
}

/// # GET /api/analytics/summary
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> Result<Json<SummaryReport>, AppError> {
    let Query(query) = query?;
    let range = DateRange::new(query.start_date, query.end_date)?;
    let range = (!range.is_unbounded()).then_some(range);
    let report = state.analyzer.summary(user_id, range).await?;
    Ok(Json(report))
}

/// # GET /api/analytics/by-emotion
pub async fn get_by_emotion(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<EmotionPerformance>>, AppError> {
    Ok(Json(state.analyzer.by_emotion(user_id).await?))
}

/// # GET /api/analytics/by-strategy
pub async fn get_by_strategy(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<StrategyPerformance>>, AppError> {
    Ok(Json(state.analyzer.by_strategy(user_id).await?))
}

/// # GET /api/analytics/by-coin
pub async fn get_by_coin(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<CoinPerformance>>, AppError> {
    Ok(Json(state.analyzer.by_coin(user_id).await?))
}

/// # GET /api/analytics/by-time
pub async fn get_by_time(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<HourPerformance>>, AppError> {
    Ok(Json(state.analyzer.by_hour(user_id).await?))
}

/// # GET /api/analytics/insights
pub async fn get_insights(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<InsightsReport>, AppError> {
    Ok(Json(state.analyzer.insights(user_id).await?))
}
