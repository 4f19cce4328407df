use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

use quality_screener::app::QualityStocksUseCase;
use quality_screener::config::DataConfig;
use quality_screener::pipeline::processing::scoring::ScoringEngine;
use quality_screener::pipeline::LoadOptions;
use quality_screener::repository::InstrumentRepository;
use quality_screener::server::create_server;

fn write_exports(folder: &Path) -> Result<()> {
    fs::write(
        folder.join("trendlyne-filtered (1).csv"),
        "Stock,NSE Code,ISIN,ROE Ann  %,Risk Notes\n\
         Alpha Ltd,ALPHA,ABC123,18.5,watch pledge\n\
         Beta Ltd,BETA,INE000B01011,9,\n",
    )?;
    fs::write(
        folder.join("trendlyne-filtered (2).csv"),
        "Stock,NSE Code,ISIN,Durability Score,Valuation Score\n\
         Alpha Ltd,ALPHA,ABC123,75,55\n\
         Beta Ltd,BETA,INE000B01011,40,20\n",
    )?;
    Ok(())
}

fn app(folder: &Path) -> Router {
    let options = LoadOptions::from(&DataConfig {
        folder: folder.to_path_buf(),
        ..DataConfig::default()
    });
    let repository = InstrumentRepository::new(options, ScoringEngine::default());
    create_server(Arc::new(QualityStocksUseCase::new(Arc::new(repository), None)))
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(request.body(body)?).await?;
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await?;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, json))
}

#[tokio::test]
async fn refresh_then_read_endpoints() -> Result<()> {
    let dir = tempdir()?;
    write_exports(dir.path())?;
    let app = app(dir.path());

    let (status, health) = call(&app, "GET", "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["instruments"], 0);
    assert!(health["loadedAt"].is_null());

    let (status, refresh) = call(&app, "POST", "/api/quality-stocks/refresh", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refresh["status"], "ok");
    assert_eq!(refresh["before"], 0);
    assert_eq!(refresh["after"], 2);
    assert_eq!(refresh["report"]["duplicatesMerged"], 2);

    let (status, stock) = call(&app, "GET", "/api/quality-stocks/stock/ISIN:ABC123", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stock["stockName"], "Alpha Ltd");
    assert_eq!(stock["durabilityScore"], 75);
    assert_eq!(stock["valuationScore"], 55);
    assert_eq!(stock["roe"], 18.5);
    assert_eq!(stock["extras"]["Risk Notes"], "watch pledge");
    assert!(stock.get("bseCode").is_none());

    let (status, great) = call(&app, "GET", "/api/quality-stocks/great", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(great["tier"], "Great");
    assert_eq!(great["count"], 0);

    let (status, all) = call(&app, "GET", "/api/quality-stocks/all", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["good"]["tier"], "Good");

    let (status, found) = call(&app, "GET", "/api/quality-stocks/search?query=alp", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().map(Vec::len), Some(1));

    let (status, dual) = call(&app, "GET", "/api/quality-stocks/durability-valuation", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dual["count"], 1);
    assert_eq!(dual["stocks"][0]["nseCode"], "ALPHA");

    let (status, stats) = call(&app, "GET", "/api/quality-stocks/durability-valuation/stats", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["withBoth"], 2);
    assert_eq!(stats["durability"]["max"], 75.0);

    let (status, screened) = call(
        &app,
        "POST",
        "/api/quality-stocks/screen",
        Some(serde_json::json!({ "minRoe": 10, "limit": 5 })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(screened["count"], 1);
    assert!(screened["stocks"][0]["screenScore"].is_number());
    Ok(())
}

#[tokio::test]
async fn unknown_code_is_404() -> Result<()> {
    let dir = tempdir()?;
    write_exports(dir.path())?;
    let app = app(dir.path());
    call(&app, "POST", "/api/quality-stocks/refresh", None).await?;

    let (status, body) = call(&app, "GET", "/api/quality-stocks/stock/NOPE", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap_or_default().contains("NOPE"));
    Ok(())
}

#[tokio::test]
async fn invalid_requests_are_400() -> Result<()> {
    let dir = tempdir()?;
    let app = app(dir.path());

    let (status, body) = call(&app, "GET", "/api/quality-stocks/search?query=a&limit=0", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (status, _) = call(&app, "GET", "/api/quality-stocks/durability-valuation?minDurability=500", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        "/api/quality-stocks/screen",
        Some(serde_json::json!({ "valuationWeight": 2.0 })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn failed_refresh_is_500_and_keeps_serving() -> Result<()> {
    let dir = tempdir()?;
    let app = app(&dir.path().join("missing"));

    let (status, body) = call(&app, "POST", "/api/quality-stocks/refresh", None).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].is_string());

    let (status, great) = call(&app, "GET", "/api/quality-stocks/great", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(great["count"], 0);
    Ok(())
}
