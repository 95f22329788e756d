use crate::domain::model::{AggregatedOwnerList, ErrorEnvelope};
use crate::utils::error::AggregatorError;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";

/// Body sent for a settled single-owner GET.
pub const ACKNOWLEDGEMENT: &str = "OK";

/// Every outcome the gateway can emit. Built whole before anything is written,
/// so a caller never sees a partial array followed by an error.
#[derive(Debug)]
pub enum AggregateResponse {
    Owners(AggregatedOwnerList),
    Acknowledged,
    /// Fixed body for the unimplemented owner update.
    Placeholder,
    Failure {
        status: StatusCode,
        envelope: ErrorEnvelope,
    },
}

impl AggregateResponse {
    pub fn fatal(err: &AggregatorError) -> Self {
        AggregateResponse::Failure {
            status: StatusCode::NOT_IMPLEMENTED,
            envelope: ErrorEnvelope::now(err.to_string()),
        }
    }

    /// The caller's input cannot be turned into a subrequest.
    pub fn bad_request(err: &AggregatorError) -> Self {
        AggregateResponse::Failure {
            status: StatusCode::BAD_REQUEST,
            envelope: ErrorEnvelope::now(err.to_string()),
        }
    }

    pub fn method_not_allowed(method: &Method) -> Self {
        AggregateResponse::Failure {
            status: StatusCode::METHOD_NOT_ALLOWED,
            envelope: ErrorEnvelope::method_not_allowed(method.as_str()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AggregateResponse::Owners(_)
            | AggregateResponse::Acknowledged
            | AggregateResponse::Placeholder => StatusCode::OK,
            AggregateResponse::Failure { status, .. } => *status,
        }
    }
}

#[derive(Serialize)]
struct PlaceholderBody {
    hihi: &'static str,
}

pub(crate) fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut response = (status, bytes).into_response();
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
            response
        }
        Err(e) => {
            tracing::error!("❌ Failed to serialize response body: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

impl IntoResponse for AggregateResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AggregateResponse::Owners(owners) => json_response(status, &owners),
            AggregateResponse::Placeholder => json_response(status, &PlaceholderBody { hihi: "hihi" }),
            AggregateResponse::Failure { envelope, .. } => json_response(status, &envelope),
            AggregateResponse::Acknowledged => {
                let mut response = (status, ACKNOWLEDGEMENT).into_response();
                response
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE));
                response
            }
        }
    }
}
