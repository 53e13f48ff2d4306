//! HTTP mapping for [`Error`].
//!
//! Handlers recover the expected failures themselves; whatever reaches this point is rendered
//! as a plain error page without internal details.

use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError};

use crate::error::Error;
use crate::web::views;

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::DuplicateEmail(_) => StatusCode::CONFLICT,
            Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::MissingField(_) | Error::InvalidField { .. } | Error::EmptyRoster => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if !self.is_user_error() {
            tracing::error!(error = %self, "request failed");
        }

        HttpResponse::build(self.status_code())
            .content_type(ContentType::html())
            .body(views::error_page(&self.user_message()))
    }
}
