//! Request extractors that reject with [`AppError`].
//!
//! Malformed bodies and path ids become `400 {"message": ...}` instead of
//! the framework's plain-text rejections.

use axum::{
    extract::{
        FromRequest, FromRequestParts, Multipart, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::header::CONTENT_TYPE,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::services::uploads::UploadedImage;
use crate::state::AppState;

/// Multipart field carrying the image file.
const IMAGE_FIELD: &str = "image";

/// Prefix axum puts on body deserialization failures.
const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// Reduce a serde message to `field: problem`, without parser positions.
fn field_message(text: &str) -> String {
    let text = text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(text);
    let text = text.rfind(" at line ").map_or(text, |at| &text[..at]);
    format!("Invalid request body: {text}")
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(e) => field_message(&e.body_text()),
            JsonRejection::JsonSyntaxError(_) => "Malformed JSON body".to_string(),
            JsonRejection::MissingJsonContentType(_) => {
                "Expected a JSON body with Content-Type: application/json".to_string()
            }
            _ => "Invalid request body".to_string(),
        };
        Self::Validation(message)
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(_) => {
                Self::Validation("Invalid id".to_string())
            }
            other => Self::Internal(other.body_text()),
        }
    }
}

/// JSON body extractor.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path parameter extractor, used for typed ids.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct IdPath<T>(pub T);

/// Category or product fields with an optional image.
///
/// Accepts `multipart/form-data` (text fields plus an `image` file part) or
/// a JSON body. Blank text fields are dropped so they never overwrite
/// stored values.
#[derive(Debug)]
pub struct CatalogPayload<T> {
    pub form: T,
    pub image: Option<UploadedImage>,
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

impl<T> FromRequest<AppState> for CatalogPayload<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let ApiJson(form) = ApiJson::<T>::from_request(req, state).await?;
            return Ok(Self { form, image: None });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        let mut fields = Map::new();
        let mut image = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == IMAGE_FIELD && field.file_name().is_some() {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;

                // Browsers send an empty part when no file was chosen
                if !bytes.is_empty() {
                    image = Some(UploadedImage {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            if !text.trim().is_empty() {
                fields.insert(name, Value::String(text));
            }
        }

        let form = serde_json::from_value(Value::Object(fields))
            .map_err(|e| AppError::Validation(field_message(&e.to_string())))?;

        Ok(Self { form, image })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{body::Body, http::Request as HttpRequest};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Payload {
        total: u32,
    }

    async fn reject(content_type: &str, body: &'static str) -> String {
        let req = HttpRequest::builder()
            .method("POST")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        let rejection = axum::Json::<Payload>::from_request(req, &()).await.unwrap_err();
        match AppError::from(rejection) {
            AppError::Validation(message) => message,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_field_message_drops_positions() {
        assert_eq!(
            field_message(
                "Failed to deserialize the JSON body into the target type: \
                 total: invalid type: string \"20\", expected u32 at line 1 column 13"
            ),
            "Invalid request body: total: invalid type: string \"20\", expected u32"
        );
        assert_eq!(
            field_message("missing field `name`"),
            "Invalid request body: missing field `name`"
        );
    }

    #[tokio::test]
    async fn test_json_rejections_are_short() {
        let message = reject("application/json", r#"{"total": "20"}"#).await;
        assert!(message.starts_with("Invalid request body: total: "), "{message}");
        assert!(!message.contains("line"), "{message}");
        assert!(!message.contains("target type"), "{message}");

        assert_eq!(
            reject("application/json", "{not json").await,
            "Malformed JSON body"
        );
        assert_eq!(
            reject("text/plain", "{}").await,
            "Expected a JSON body with Content-Type: application/json"
        );
    }
}
