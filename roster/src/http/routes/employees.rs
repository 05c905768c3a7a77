//! Employee endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use roster_core::page::{DEFAULT_PAGE_SIZE, PaginationParams};
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;
use crate::http::extractors::{JsonBody, QueryParams};
use crate::http::server::AppState;
use crate::model::{DepartmentAverage, Employee, EmployeePatch, NewEmployee};

/// Query string of GET /employees
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub department: Option<String>,
    pub page: usize,
    pub size: usize,
}

impl Default for ListParams {
    fn default() -> Self {
        Self { department: None, page: 1, size: DEFAULT_PAGE_SIZE }
    }
}

/// Query string of GET /employees/search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub skill: String,
    #[serde(default = "first_page")]
    pub page: usize,
    #[serde(default = "default_size")]
    pub size: usize,
}

fn first_page() -> usize {
    1
}

fn default_size() -> usize {
    DEFAULT_PAGE_SIZE
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /employees - create an employee
async fn create_employee(
    State(state): State<Arc<AppState>>,
    JsonBody(employee): JsonBody<NewEmployee>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    let employee = state.employees.create(employee).await?;

    Ok((StatusCode::CREATED, Json(employee)))
}

/// GET /employees/{employee_id}
async fn get_employee(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<String>,
) -> Result<Json<Employee>, ApiError> {
    Ok(Json(state.employees.get(&employee_id).await?))
}

/// PUT /employees/{employee_id} - partial update
async fn update_employee(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<String>,
    JsonBody(patch): JsonBody<EmployeePatch>,
) -> Result<Json<Employee>, ApiError> {
    Ok(Json(state.employees.update(&employee_id, patch).await?))
}

/// DELETE /employees/{employee_id}
async fn delete_employee(
    State(state): State<Arc<AppState>>,
    Path(employee_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = state.employees.delete(&employee_id).await?;

    Ok(Json(MessageResponse { message }))
}

/// GET /employees - newest first, optionally by department
async fn list_employees(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Vec<Employee>>, ApiError> {
    let page = PaginationParams::new(params.page, params.size);
    let employees = state
        .employees
        .list(params.department.as_deref(), page)
        .await?;

    Ok(Json(employees))
}

/// GET /employees/avg-salary
async fn average_salary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DepartmentAverage>>, ApiError> {
    Ok(Json(state.employees.average_salary_by_department().await?))
}

/// GET /employees/search?skill=...
async fn search_employees(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<SearchParams>,
) -> Result<Json<Vec<Employee>>, ApiError> {
    let page = PaginationParams::new(params.page, params.size);

    Ok(Json(state.employees.search_by_skill(&params.skill, page).await?))
}

/// Employee routes
///
/// The static `/employees/avg-salary` and `/employees/search` paths take
/// precedence over `/employees/{employee_id}`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/avg-salary", get(average_salary))
        .route("/employees/search", get(search_employees))
        .route(
            "/employees/{employee_id}",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}
