use axum::{
    extract::{Path, Query, State},
    Json,
};
use service_core::error::AppError;

use crate::dtos::{ApiResponse, PagedResponse, Pagination, PaginationQuery};
use crate::middleware::CustomerContext;
use crate::models::AuditTrail;
use crate::startup::AppState;

pub async fn list_customer_audit_trails(
    State(state): State<AppState>,
    ctx: CustomerContext,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<PagedResponse<AuditTrail>>>, AppError> {
    let customer = state.customers.get_customer(ctx.customer_id).await?;
    let pagination = Pagination::from(query);

    let (entries, total) = state
        .audit
        .get_customer_audit_trails(customer.id, pagination)
        .await?;

    Ok(Json(ApiResponse::success(
        "Audit trails retrieved successfully",
        PagedResponse::new(entries, total, pagination),
    )))
}

pub async fn list_invoice_audit_trails(
    State(state): State<AppState>,
    ctx: CustomerContext,
    Path(invoice_id): Path<i64>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<PagedResponse<AuditTrail>>>, AppError> {
    let customer = state.customers.get_customer(ctx.customer_id).await?;
    let invoice = state
        .invoices
        .get_invoice_by_id_and_customer(invoice_id, customer.id)
        .await?;
    let pagination = Pagination::from(query);

    let (entries, total) = state
        .audit
        .get_invoice_audit_trails(invoice.id, customer.id, pagination)
        .await?;

    Ok(Json(ApiResponse::success(
        "Audit trails retrieved successfully",
        PagedResponse::new(entries, total, pagination),
    )))
}
