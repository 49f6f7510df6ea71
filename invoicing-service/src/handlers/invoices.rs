//! Invoice handlers.
//!
//! Every route is scoped to the customer from [`CustomerContext`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use validator::Validate;

use super::log_audit_failure;
use crate::dtos::{
    ApiResponse, ConfirmPaymentRequest, CreateInvoiceRequest, PagedResponse, Pagination,
    PaginationQuery, PaymentConfirmation, SetRemindersRequest, ShareableLinkResponse,
};
use crate::middleware::CustomerContext;
use crate::models::{Invoice, InvoiceDetails, InvoiceStatistics, InvoiceSummary, NewReminder};
use crate::startup::AppState;

/// Issue a new invoice, applying any reminder schedules sent with it.
#[tracing::instrument(skip_all, fields(customer_id = %ctx.customer_id))]
pub async fn create_invoice(
    State(state): State<AppState>,
    ctx: CustomerContext,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Invoice>>), AppError> {
    request.validate()?;
    let customer = state.customers.get_customer(ctx.customer_id).await?;

    let (draft, reminders) = request.into_draft();
    let invoice = state.invoices.create_invoice(customer.id, draft).await?;

    if let Some(toggles) = reminders {
        state
            .reminders
            .set_invoice_reminders(&invoice, customer.id, &toggles)
            .await?;
    }

    log_audit_failure(
        state.audit.log_invoice_created(&invoice, &customer).await,
        invoice.id,
    );

    tracing::info!(
        invoice_id = %invoice.id,
        invoice_number = %invoice.invoice_number,
        "Invoice created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Invoice created successfully", invoice)),
    ))
}

/// List the customer's invoices, newest first.
pub async fn list_invoices(
    State(state): State<AppState>,
    ctx: CustomerContext,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<PagedResponse<InvoiceSummary>>>, AppError> {
    let customer = state.customers.get_customer(ctx.customer_id).await?;
    let pagination = Pagination::from(query);

    let (invoices, total) = state
        .invoices
        .get_customer_invoices(customer.id, pagination)
        .await?;

    Ok(Json(ApiResponse::success(
        "Invoices retrieved successfully",
        PagedResponse::new(invoices, total, pagination),
    )))
}

pub async fn get_statistics(
    State(state): State<AppState>,
    ctx: CustomerContext,
) -> Result<Json<ApiResponse<InvoiceStatistics>>, AppError> {
    let customer = state.customers.get_customer(ctx.customer_id).await?;
    let stats = state.invoices.get_invoice_statistics(customer.id).await?;

    Ok(Json(ApiResponse::success(
        "Invoice statistics retrieved successfully",
        stats,
    )))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    ctx: CustomerContext,
    Path(invoice_id): Path<i64>,
) -> Result<Json<ApiResponse<InvoiceDetails>>, AppError> {
    let customer = state.customers.get_customer(ctx.customer_id).await?;
    let details = state
        .invoices
        .get_invoice_details(invoice_id, customer.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Invoice retrieved successfully",
        details,
    )))
}

/// Validate, record and settle a payment in that order.
#[tracing::instrument(skip_all, fields(customer_id = %ctx.customer_id, invoice_id = %invoice_id))]
pub async fn confirm_payment(
    State(state): State<AppState>,
    ctx: CustomerContext,
    Path(invoice_id): Path<i64>,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<Json<ApiResponse<PaymentConfirmation>>, AppError> {
    request.validate()?;
    let customer = state.customers.get_customer(ctx.customer_id).await?;
    let mut invoice = state
        .invoices
        .get_invoice_by_id_and_customer(invoice_id, customer.id)
        .await?;

    state
        .invoices
        .validate_payment_amount(request.amount, &invoice, request.is_partial)
        .await?;

    let payment = state
        .invoices
        .confirm_payment(
            invoice.id,
            request.amount,
            request.payment_date.unwrap_or_else(Utc::now),
            request.is_partial,
        )
        .await?;

    state
        .invoices
        .set_invoice_status_if_fully_paid(&mut invoice)
        .await?;

    log_audit_failure(
        state.audit.log_payment_confirmed(&invoice, &customer).await,
        invoice.id,
    );

    tracing::info!(
        payment_id = %payment.id,
        amount = %payment.amount,
        status = %invoice.status.as_str(),
        "Payment confirmed"
    );

    Ok(Json(ApiResponse::success(
        "Payment confirmed successfully",
        PaymentConfirmation {
            payment,
            invoice_status: invoice.status,
            is_fully_paid: invoice.is_fully_paid,
        },
    )))
}

pub async fn set_reminders(
    State(state): State<AppState>,
    ctx: CustomerContext,
    Path(invoice_id): Path<i64>,
    Json(request): Json<SetRemindersRequest>,
) -> Result<Json<ApiResponse<Vec<NewReminder>>>, AppError> {
    request.validate()?;
    let customer = state.customers.get_customer(ctx.customer_id).await?;
    let invoice = state
        .invoices
        .get_invoice_by_id_and_customer(invoice_id, customer.id)
        .await?;

    let reminders = state
        .reminders
        .set_invoice_reminders(&invoice, customer.id, &request.reminder_schedules)
        .await?;

    Ok(Json(ApiResponse::success(
        "Invoice reminders updated successfully",
        reminders,
    )))
}

pub async fn get_shareable_link(
    State(state): State<AppState>,
    ctx: CustomerContext,
    Path(invoice_id): Path<i64>,
) -> Result<Json<ApiResponse<ShareableLinkResponse>>, AppError> {
    let customer = state.customers.get_customer(ctx.customer_id).await?;
    let invoice = state
        .invoices
        .get_invoice_by_id_and_customer(invoice_id, customer.id)
        .await?;

    let link = state.invoices.get_shareable_link(&invoice).await?;

    Ok(Json(ApiResponse::success(
        "Shareable link generated successfully",
        ShareableLinkResponse { link },
    )))
}

#[tracing::instrument(skip_all, fields(customer_id = %ctx.customer_id, invoice_id = %invoice_id))]
pub async fn duplicate_invoice(
    State(state): State<AppState>,
    ctx: CustomerContext,
    Path(invoice_id): Path<i64>,
) -> Result<(StatusCode, Json<ApiResponse<Invoice>>), AppError> {
    let customer = state.customers.get_customer(ctx.customer_id).await?;
    let source = state
        .invoices
        .get_invoice_by_id_and_customer(invoice_id, customer.id)
        .await?;

    let copy = state.invoices.duplicate_invoice(&source).await?;

    log_audit_failure(
        state
            .audit
            .log_invoice_duplicated(&source, &copy, &customer)
            .await,
        copy.id,
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Invoice duplicated successfully", copy)),
    ))
}
