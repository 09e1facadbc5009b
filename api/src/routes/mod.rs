use actix_web::{
    HttpResponse, Responder, ResponseError, body::BoxBody,
    dev::HttpServiceFactory, get, http::StatusCode, web,
};
use serde::Deserialize;
use std::time::Duration;

use crate::fixtures::{Fixtures, Resource};

const DEFAULT_DELAY_MS: u64 = 1000;

pub fn api_services() -> impl HttpServiceFactory {
    web::scope("/api")
        .service(health_check)
        .service(malformed)
        .service(status)
        .service(slow)
        .service(list_resource)
        .service(get_item)
}

#[get("/health_check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("healthy")
}

#[tracing::instrument(skip(fixtures))]
#[get("/{resource}")]
pub async fn list_resource(
    resource: web::Path<Resource>,
    fixtures: web::Data<Fixtures>,
) -> Result<HttpResponse, APIError> {
    let body = fixtures.list(*resource).map_err(anyhow::Error::from)?;
    Ok(HttpResponse::Ok().json(body))
}

#[tracing::instrument(skip(fixtures))]
#[get("/{resource}/{id}")]
pub async fn get_item(
    path: web::Path<(Resource, u32)>,
    fixtures: web::Data<Fixtures>,
) -> Result<HttpResponse, APIError> {
    let (resource, id) = path.into_inner();
    let item = fixtures
        .item(resource, id)
        .map_err(anyhow::Error::from)?
        .ok_or_else(|| {
            APIError::NotFound(anyhow::anyhow!("no {resource:?} with id {id}"))
        })?;
    Ok(HttpResponse::Ok().json(item))
}

/// Respond with an empty body and the requested status.
#[tracing::instrument]
#[get("/status/{code}")]
pub async fn status(code: web::Path<u16>) -> Result<HttpResponse, APIError> {
    let status = StatusCode::from_u16(*code)
        .map_err(|e| APIError::BadRequest(e.into()))?;
    Ok(HttpResponse::build(status).finish())
}

#[derive(Debug, Deserialize)]
pub struct SlowQuery {
    pub delay_ms: Option<u64>,
}

/// Serve a resource after a delay, for exercising cancellation.
#[tracing::instrument(skip(fixtures))]
#[get("/slow/{resource}")]
pub async fn slow(
    resource: web::Path<Resource>,
    query: web::Query<SlowQuery>,
    fixtures: web::Data<Fixtures>,
) -> Result<HttpResponse, APIError> {
    let delay = query.delay_ms.unwrap_or(DEFAULT_DELAY_MS);
    tokio::time::sleep(Duration::from_millis(delay)).await;
    let body = fixtures.list(*resource).map_err(anyhow::Error::from)?;
    Ok(HttpResponse::Ok().json(body))
}

/// A successful response whose body is not JSON.
#[get("/malformed")]
pub async fn malformed() -> impl Responder {
    HttpResponse::Ok()
        .content_type("application/json")
        .body("{\"truncated\": ")
}

#[derive(Debug, thiserror::Error)]
pub enum APIError {
    #[error("Bad request")]
    BadRequest(#[source] anyhow::Error),
    #[error("Not found")]
    NotFound(#[source] anyhow::Error),
    #[error("Something went wrong")]
    UnexpectedError(#[from] anyhow::Error),
}

impl ResponseError for APIError {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        match self {
            Self::BadRequest(e) => {
                HttpResponse::BadRequest().body(format!("{self}: {e}"))
            }
            Self::NotFound(e) => {
                HttpResponse::NotFound().body(format!("{self}: {e}"))
            }
            Self::UnexpectedError(_) => {
                HttpResponse::InternalServerError().body(self.to_string())
            }
        }
    }
}
