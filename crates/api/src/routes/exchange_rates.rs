//! Exchange rate read routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use subtrack_core::currency::ExchangeRate;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::rates::{self, Conversion};
use crate::AppState;

/// Creates the exchange rate routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/exchange-rates/latest", get(latest_rates))
        .route("/exchange-rates/convert", get(convert))
}

/// Latest snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestRatesResponse {
    /// Snapshot date; `None` when no rates are stored.
    pub date: Option<NaiveDate>,
    /// Base currency used for two-hop lookups.
    pub base_currency: String,
    /// Stored rows.
    pub rates: Vec<ExchangeRate>,
}

/// Query parameters for a conversion.
#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    /// Source currency code.
    pub from: String,
    /// Target currency code.
    pub to: String,
    /// Amount in the source currency.
    pub amount: Decimal,
}

/// GET `/exchange-rates/latest`.
async fn latest_rates(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<LatestRatesResponse>, ApiError> {
    let snapshot = rates::latest(&state.db).await?;
    Ok(Json(LatestRatesResponse {
        date: snapshot.date(),
        base_currency: state.settings.base_currency.clone(),
        rates: snapshot.rates().to_vec(),
    }))
}

/// GET `/exchange-rates/convert?from=USD&to=CNY&amount=10`.
async fn convert(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<ConvertQuery>,
) -> Result<Json<Conversion>, ApiError> {
    let conversion = rates::convert(
        &state.db,
        &state.settings.base_currency,
        &query.from,
        &query.to,
        query.amount,
    )
    .await?;
    Ok(Json(conversion))
}
