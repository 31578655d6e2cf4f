//! GPSS generation routes.
//!
//! Two operations over the same topology document:
//! - POST /gen       -> structured `GpssCode` JSON
//! - POST /gen-file  -> downloadable `.gps.txt` attachment with the
//!   generation-info banner embedded, in UTF-8 or WINDOWS-1251

use axum::{
    extract::Query,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

use gpss_codegen::{CodegenError, Generator, GpssCode};
use topology_model::{raw::RawTopology, ModelError, Topology};

pub fn gpss_routes() -> Router {
    Router::new()
        .route("/gen", post(generate))
        .route("/gen-file", post(generate_file))
}

/// Client-facing generation failure. Generation is all-or-nothing: any
/// error fails the whole request and no partial document leaves the
/// service.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        tracing::warn!(error = %message, "generation request rejected");
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "error": message })),
        )
            .into_response()
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub enum FileEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[default]
    #[serde(rename = "cp1251")]
    Cp1251,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenFileParams {
    #[serde(default)]
    pub encoding: FileEncoding,
}

async fn generate(Json(doc): Json<RawTopology>) -> Result<Json<GpssCode>, ApiError> {
    let topology = Topology::build(doc)?;
    let result = Generator::new(&topology).generate(false)?;
    Ok(Json(result))
}

async fn generate_file(
    Query(params): Query<GenFileParams>,
    Json(doc): Json<RawTopology>,
) -> Result<Response, ApiError> {
    let topology = Topology::build(doc)?;
    let result = Generator::new(&topology).generate(true)?;

    let stamp = result.gen_date.unwrap_or_else(Utc::now);
    let filename = attachment_filename(stamp);
    let bytes = encode_body(&result.code, params.encoding);

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        bytes,
    )
        .into_response())
}

fn attachment_filename(stamp: chrono::DateTime<Utc>) -> String {
    format!("model-{}.gps.txt", stamp.format("%d-%m-%Y-%H-%M-%S"))
}

fn encode_body(code: &str, encoding: FileEncoding) -> Vec<u8> {
    match encoding {
        FileEncoding::Utf8 => code.as_bytes().to_vec(),
        FileEncoding::Cp1251 => encoding_rs::WINDOWS_1251.encode(code).0.into_owned(),
    }
}
