use crate::models::{GenerationForm, GenerationRequest, ImageUpload, Part};
use crate::startup::AppState;
use axum::{
    async_trait,
    extract::{
        multipart::MultipartError, rejection::FormRejection, FromRequest, Multipart, Request, State,
    },
    http::{header::CONTENT_TYPE, StatusCode},
    Form, Json,
};
use service_core::error::AppError;

/// `POST /`: validate the form, dispatch to the model, return the parts of the
/// first candidate.
pub async fn generate(
    State(state): State<AppState>,
    form: GenerationForm,
) -> Result<Json<Vec<Part>>, AppError> {
    let request = GenerationRequest::from_form(form, state.image_policy).map_err(|e| {
        tracing::warn!(error = %e, "Rejected generation request");
        e
    })?;

    let parts = state.generator.generate(&request).await?;

    Ok(Json(parts))
}

/// Fields collected from the body and query string. The first value of a
/// field wins.
#[derive(Default)]
struct RawFields {
    kind: Option<String>,
    text: Option<String>,
    image: ImageUpload,
}

impl RawFields {
    fn set(&mut self, name: &str, value: String) {
        let slot = match name {
            "type" => &mut self.kind,
            "text" => &mut self.text,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    fn into_form(self) -> GenerationForm {
        GenerationForm {
            kind: self.kind.unwrap_or_default(),
            text: self.text.unwrap_or_default(),
            image: self.image,
        }
    }
}

/// Reads `type`, `text` and the `image` file part from a multipart or
/// url-encoded body. Query parameters fill in whatever the body leaves out.
/// Other content types contribute no fields.
#[async_trait]
impl<S> FromRequest<S> for GenerationForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query: Vec<(String, String)> = req
            .uri()
            .query()
            .and_then(|q| serde_urlencoded::from_str(q).ok())
            .unwrap_or_default();

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let mut fields = RawFields::default();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::validation(e.body_text()))?;
            read_multipart(multipart, &mut fields).await?;
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(form_rejection)?;
            for (name, value) in pairs {
                fields.set(&name, value);
            }
        }

        for (name, value) in query {
            fields.set(&name, value);
        }

        Ok(fields.into_form())
    }
}

async fn read_multipart(mut multipart: Multipart, fields: &mut RawFields) -> Result<(), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            // Only a named file part counts as the image; a plain `image` value is ignored.
            "image" if field.file_name().is_some_and(|f| !f.is_empty()) => {
                if !matches!(fields.image, ImageUpload::Absent) {
                    continue;
                }
                match field.bytes().await {
                    Ok(bytes) => fields.image = ImageUpload::Uploaded(bytes),
                    Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                        return Err(multipart_error(e));
                    }
                    Err(e) => {
                        fields.image = ImageUpload::Unreadable(e.body_text());
                        break;
                    }
                }
            }
            "type" | "text" => {
                let value = field.text().await.map_err(multipart_error)?;
                fields.set(&name, value);
            }
            _ => {}
        }
    }

    Ok(())
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::validation(err.body_text())
    }
}

fn form_rejection(rejection: FormRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(rejection.body_text())
    } else {
        AppError::validation(rejection.body_text())
    }
}
