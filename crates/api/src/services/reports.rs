//! Expense report generation.

use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use subtrack_core::payments::PaymentHistoryAnalyzer;
use subtrack_core::reports::{ExpenseReport, ReportEngine, ReportRequest};
use subtrack_db::{
    CategoryRepository, ExchangeRateRepository, PaymentHistoryRepository, SubscriptionRepository,
};
use subtrack_shared::AppError;
use subtrack_shared::types::UserId;
use tracing::info;

use super::target_currency;
use crate::ApiSettings;

/// Body of `POST /reports/expenses`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseReportRequest {
    /// Display currency.
    pub target_currency: Option<String>,
    /// Range start (inclusive).
    pub start_date: NaiveDate,
    /// Range end (inclusive).
    pub end_date: NaiveDate,
    /// Compute the monthly series.
    pub include_monthly: Option<bool>,
    /// Compute the quarterly series.
    pub include_quarterly: Option<bool>,
    /// Compute the yearly series.
    pub include_yearly: Option<bool>,
    /// Compute the category breakdown.
    pub include_category_breakdown: Option<bool>,
    /// Attach a summary of recorded payments.
    pub include_payment_history: Option<bool>,
}

impl ExpenseReportRequest {
    /// Resolves the request against the configured defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an invalid currency or date range.
    pub fn to_report_request(&self, settings: &ApiSettings) -> Result<ReportRequest, AppError> {
        let target = target_currency(
            self.target_currency.as_deref(),
            &settings.aggregation.default_currency,
        )?;
        ReportEngine::validate_range(self.start_date, self.end_date)
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let mut request = ReportRequest::new(target, self.start_date, self.end_date);
        request.include_monthly = self.include_monthly.unwrap_or(true);
        request.include_quarterly = self.include_quarterly.unwrap_or(true);
        request.include_yearly = self.include_yearly.unwrap_or(true);
        request.include_category_breakdown = self.include_category_breakdown.unwrap_or(true);
        Ok(request)
    }
}

/// Builds an expense report for one user.
///
/// # Errors
///
/// Returns `AppError::Validation` for bad input and `AppError::Database`
/// when a query fails.
pub async fn expense_report(
    db: &DatabaseConnection,
    settings: &ApiSettings,
    user_id: UserId,
    body: &ExpenseReportRequest,
) -> Result<ExpenseReport, AppError> {
    let request = body.to_report_request(settings)?;

    let subscriptions = SubscriptionRepository::new(db.clone())
        .list_for_user(user_id)
        .await?;
    let categories = CategoryRepository::new(db.clone())
        .categories_for_user(user_id)
        .await?;
    let rates = ExchangeRateRepository::new(db.clone())
        .latest_snapshot()
        .await?
        .rate_map(&settings.base_currency);

    let mut report = ReportEngine::generate(&subscriptions, &categories, &rates, &request)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if body.include_payment_history.unwrap_or(false) {
        let payments = PaymentHistoryRepository::new(db.clone())
            .list_for_user(user_id, request.start, request.end)
            .await?;
        report.payment_history = Some(PaymentHistoryAnalyzer::summarize(
            &payments,
            &rates,
            request.target_currency.as_str(),
            request.start,
            request.end,
        ));
    }

    info!(
        %user_id,
        months = report.summary.month_count,
        currency = %report.currency,
        "Expense report generated"
    );
    Ok(report)
}
