//! services/api/src/web/extract.rs
//!
//! `Json` and `Query` extractors whose rejections render as `ApiError`, so malformed
//! bodies and query strings get the same `{ message, code }` 400 as every other
//! validation failure.

use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::Json;

use crate::error::ApiError;

#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
