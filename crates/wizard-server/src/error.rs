use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use wizard_core::WizardError;

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn status(&self) -> StatusCode {
        let Some(e) = self.0.downcast_ref::<WizardError>() else {
            return StatusCode::INTERNAL_SERVER_ERROR;
        };
        match e {
            WizardError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            WizardError::EmptyDescription
            | WizardError::EmptyFeedback
            | WizardError::StepOutOfRange { .. }
            | WizardError::UnknownStep(_)
            | WizardError::UnknownOutputKey(_)
            | WizardError::InvalidMode(_) => StatusCode::BAD_REQUEST,
            WizardError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            WizardError::StepInFlight { .. } => StatusCode::CONFLICT,
            WizardError::StepFailed { .. } => StatusCode::BAD_GATEWAY,
            WizardError::Io(_) | WizardError::Yaml(_) | WizardError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %format!("{:#}", self.0), "request failed");
        }
        let body = serde_json::json!({ "error": format!("{:#}", self.0) });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
