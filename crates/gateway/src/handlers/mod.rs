//! API handlers module

pub mod chat;
pub mod health;

use answerforge_common::errors::AppError;
use axum::response::{IntoResponse, Response};
use std::any::Any;

/// Turn a handler panic into the regular 500 error body
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };

    AppError::Internal { message }.into_response()
}
