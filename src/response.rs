//! The `POST /generate` boundary, independent of any HTTP framework.
//!
//! A host server parses the multipart form into a [`GenerateForm`] (and an
//! optional [`Upload`]), calls [`Generator::handle`], and writes
//! [`GenerateResponse::status`] and [`GenerateResponse::body`] as the reply.
//! Error bodies only ever carry [`FlashgenError::public_message`].

use crate::artifact::{Artifact, ArtifactKind};
use crate::error::FlashgenError;
use crate::generate::Generator;
use crate::request::{GenerationRequest, Upload};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

/// Status code and JSON body of a `POST /generate` reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateResponse {
    pub status: u16,
    pub body: Value,
}

impl GenerateResponse {
    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Map a generation outcome to its reply.
///
/// * `Ok` → 200 `{"result": <artifact>}`; fields the model added outside the
///   schema were already dropped by validation and are not echoed back.
/// * `Err` → [`FlashgenError::status_code`] `{"error": <public message>}`
pub fn respond(outcome: &Result<Artifact, FlashgenError>) -> GenerateResponse {
    match outcome {
        Ok(artifact) => match serde_json::to_value(artifact) {
            Ok(result) => GenerateResponse {
                status: 200,
                body: json!({ "result": result }),
            },
            Err(e) => {
                error!("Failed to serialise artifact: {}", e);
                GenerateResponse::error(500, "Failed to generate content")
            }
        },
        Err(e) => GenerateResponse::error(e.status_code(), e.public_message()),
    }
}

/// Text fields of the `POST /generate` form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GenerateForm {
    #[serde(rename = "inputText", default)]
    pub input_text: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl GenerateForm {
    /// Build the request; the upload, if any, wins over `inputText`.
    pub fn into_request(self, upload: Option<Upload>) -> GenerationRequest {
        GenerationRequest {
            source_text: self.input_text,
            upload,
            kind: ArtifactKind::from_selector(self.kind.as_deref()),
        }
    }
}

impl Generator {
    /// Run a form submission end to end and produce the reply.
    pub async fn handle(&self, form: GenerateForm, upload: Option<Upload>) -> GenerateResponse {
        let outcome = self.generate(form.into_request(upload)).await;
        respond(&outcome)
    }
}
