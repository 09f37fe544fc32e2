//! Request handlers for the HTTP API.
//!
//! Each handler extracts its inputs, runs one [`IpamService`] operation on
//! the blocking thread pool (the store does synchronous file I/O) and
//! renders the result as JSON. Extractor rejections are taken as `Result`
//! so they answer with the same `{"detail"}` body as every other error.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use crate::ip::{Allocation, IpamError, SubnetDetails};
use crate::service::IpamService;

pub type SharedService = Arc<IpamService>;

/// Body of `POST /create-subnet`
#[derive(Debug, Deserialize)]
pub struct SubnetRequest {
    pub subnet: String,
}

/// Body of `POST /add-range`
#[derive(Debug, Deserialize)]
pub struct RangeRequest {
    pub subnet: String,
    pub start_ip: String,
    pub end_ip: String,
}

/// Query of `GET /next-ip` and `DELETE /ip`
#[derive(Debug, Deserialize)]
pub struct AllocationQuery {
    pub subnet: String,
    pub name: String,
}

/// Confirmation message body
#[derive(Debug, Serialize)]
pub struct Detail {
    pub detail: String,
}

impl Detail {
    fn new(detail: String) -> Json<Self> {
        Json(Detail { detail })
    }
}

async fn run<T, F>(service: SharedService, operation: F) -> Result<T, ApiError>
where
    F: FnOnce(&IpamService) -> Result<T, IpamError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || operation(service.as_ref()))
        .await
        .map_err(|e| ApiError::Worker(e.to_string()))?
        .map_err(ApiError::from)
}

pub async fn create_subnet(
    State(service): State<SharedService>,
    request: Result<Json<SubnetRequest>, JsonRejection>,
) -> Result<Json<Detail>, ApiError> {
    let Json(request) = request?;
    let subnet = request.subnet;
    let message = format!("Subnet {} created", subnet);
    run(service, move |s| s.create_subnet(&subnet)).await?;
    Ok(Detail::new(message))
}

pub async fn add_range(
    State(service): State<SharedService>,
    request: Result<Json<RangeRequest>, JsonRejection>,
) -> Result<Json<Detail>, ApiError> {
    let Json(request) = request?;
    let message = format!(
        "Added IP range {} - {} to subnet {}",
        request.start_ip, request.end_ip, request.subnet
    );
    run(service, move |s| s.add_range(&request.subnet, &request.start_ip, &request.end_ip)).await?;
    Ok(Detail::new(message))
}

pub async fn next_ip(
    State(service): State<SharedService>,
    query: Result<Query<AllocationQuery>, QueryRejection>,
) -> Result<Json<Allocation>, ApiError> {
    let Query(query) = query?;
    let allocation = run(service, move |s| s.next_address(&query.subnet, &query.name)).await?;
    Ok(Json(allocation))
}

pub async fn release_ip(
    State(service): State<SharedService>,
    query: Result<Query<AllocationQuery>, QueryRejection>,
) -> Result<Json<Detail>, ApiError> {
    let Query(query) = query?;
    let ip = run(service, move |s| s.release(&query.subnet, &query.name)).await?;
    Ok(Detail::new(format!("Released IP {} and returned it to the pool", ip)))
}

pub async fn list_subnets(State(service): State<SharedService>) -> Result<Json<Vec<String>>, ApiError> {
    let subnets = run(service, |s| s.list_subnets()).await?;
    Ok(Json(subnets))
}

pub async fn subnet_details(
    State(service): State<SharedService>,
    subnet: Result<Path<String>, PathRejection>,
) -> Result<Json<SubnetDetails>, ApiError> {
    let Path(subnet) = subnet?;
    let details = run(service, move |s| s.subnet_details(&subnet)).await?;
    Ok(Json(details))
}
