//! Read-only JSON endpoints for templates and other consumers.

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, ResponseError, get, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CurrencyError, Result};
use crate::manager::CurrencyManager;
use crate::store::ConstantStore;
use crate::trend::{CNB_KEY, CSOB_KEY, TrendPanel, TrendRow};

pub struct AppState {
    pub manager: Arc<CurrencyManager>,
    pub constants: Arc<dyn ConstantStore>,
    pub panel: TrendPanel,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for CurrencyError {
    fn status_code(&self) -> StatusCode {
        match self {
            CurrencyError::NotFound(_) | CurrencyError::MissingDefault => StatusCode::NOT_FOUND,
            CurrencyError::AlreadyInstalled
            | CurrencyError::TooManyDefaults
            | CurrencyError::ReferencedElsewhere(_) => StatusCode::CONFLICT,
            CurrencyError::InvalidNumber(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

#[get("/currencies")]
async fn list_all(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.manager.list_all().await?))
}

#[get("/currencies/active")]
async fn list_active(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.manager.list_active().await?))
}

#[get("/currencies/default")]
async fn default_currency(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.manager.default_currency().await?))
}

#[get("/currencies/{code}")]
async fn by_code(state: web::Data<AppState>, code: web::Path<String>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.manager.get_by_code(&code).await?))
}

#[get("/currencies/{code}/history/{date}")]
async fn history(
    state: web::Data<AppState>,
    path: web::Path<(String, NaiveDate)>,
) -> Result<HttpResponse> {
    let (code, date) = path.into_inner();
    let currency = state.manager.get_by_code(&code).await?;
    Ok(HttpResponse::Ok().json(state.manager.historical_rate(&currency, date).await))
}

#[derive(Deserialize)]
struct PriceQuery {
    value: f64,
    code: Option<String>,
}

#[derive(Serialize)]
struct PriceBody {
    price: String,
}

#[get("/price")]
async fn price(state: web::Data<AppState>, query: web::Query<PriceQuery>) -> Result<HttpResponse> {
    let currency = match &query.code {
        Some(code) => Some(state.manager.get_by_code(code).await?),
        None => None,
    };
    let price = state.manager.format_price(query.value, currency.as_ref()).await?;
    Ok(HttpResponse::Ok().json(PriceBody { price }))
}

#[get("/trend")]
async fn trend(state: web::Data<AppState>) -> Result<HttpResponse> {
    let csob = state.constants.get(CSOB_KEY).await?;
    let cnb = state.constants.get(CNB_KEY).await?;
    let rows: Vec<TrendRow> = state.panel.rows(csob.as_deref(), cnb.as_deref());
    Ok(HttpResponse::Ok().json(rows))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_all)
        .service(list_active)
        .service(default_currency)
        .service(history)
        .service(by_code)
        .service(price)
        .service(trend);
}

pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let state = web::Data::new(state);
    log::info!("Listening on {}", addr);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind(addr)?
        .run()
        .await
}
