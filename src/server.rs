//! MCP Server implementation for the image asset generator.
//!
//! This module provides the MCP server handler that exposes:
//! - `generate_images` tool for batch text-to-image generation
//! - `generate_image` tool for single-image generation
//!
//! Shape validation happens here, before the orchestrator is invoked; a
//! malformed call is rejected as a protocol error with no per-item results
//! and no side effects.

use crate::batch::{self, BatchRequest, BatchResult};
use crate::provider::ImageProvider;
use rmcp::{
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    ErrorData as McpError, ServerHandler,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::info;

/// MCP Server for image generation.
#[derive(Clone)]
pub struct ImageGenServer {
    /// Backing provider, selected once at startup
    provider: Arc<dyn ImageProvider>,
}

/// Tool parameters for generate_image (single-image variant).
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SingleImageParams {
    /// Text description of the image to generate
    pub description: String,
    /// The folder path where the image should be saved
    pub output_folder: String,
    /// The desired filename for the image (without extension)
    pub filename: String,
}

/// Validation error details for tool parameters.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Description of the validation failure.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn non_empty(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError {
            field: field.to_string(),
            message: "cannot be empty".to_string(),
        });
    }
}

/// Validate the batch tool input shape.
///
/// Collects all violations rather than stopping at the first one.
pub fn validate_batch(batch: &BatchRequest) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    non_empty(&mut errors, "outputFolder", &batch.output_folder);

    if batch.images.is_empty() {
        errors.push(ValidationError {
            field: "images".to_string(),
            message: "must contain at least one image request".to_string(),
        });
    }
    for (i, image) in batch.images.iter().enumerate() {
        non_empty(&mut errors, &format!("images[{}].description", i), &image.description);
        non_empty(&mut errors, &format!("images[{}].filename", i), &image.filename);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

impl SingleImageParams {
    /// Validate the single-image tool input shape.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        non_empty(&mut errors, "description", &self.description);
        non_empty(&mut errors, "outputFolder", &self.output_folder);
        non_empty(&mut errors, "filename", &self.filename);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn validation_error(errors: Vec<ValidationError>) -> McpError {
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    McpError::invalid_params(format!("Invalid parameters: {}", messages.join("; ")), None)
}

impl ImageGenServer {
    /// Create a new server around the process-wide provider.
    pub fn new(provider: Arc<dyn ImageProvider>) -> Self {
        Self { provider }
    }

    /// Run a validated batch and serialize its aggregate result.
    ///
    /// The result carries every per-item outcome in input order; the call is
    /// flagged as an error when any item failed, so callers can branch on
    /// overall success without re-parsing all items.
    pub async fn generate_images(&self, batch: BatchRequest) -> Result<CallToolResult, McpError> {
        validate_batch(&batch).map_err(validation_error)?;

        info!(count = batch.images.len(), "Handling generate_images");
        let result: BatchResult = batch::run_batch(self.provider.as_ref(), &batch).await;

        let payload = serde_json::to_string(&result).map_err(|e| {
            McpError::internal_error(format!("Failed to serialize batch result: {}", e), None)
        })?;

        let content = vec![Content::text(payload)];
        if result.overall_success {
            Ok(CallToolResult::success(content))
        } else {
            Ok(CallToolResult::error(content))
        }
    }

    /// Generate one image and serialize the single-image payload.
    pub async fn generate_image(&self, params: SingleImageParams) -> Result<CallToolResult, McpError> {
        params.validate().map_err(validation_error)?;

        info!(filename = %params.filename, "Handling generate_image");
        match batch::generate_single(
            self.provider.as_ref(),
            &params.description,
            &params.output_folder,
            &params.filename,
        )
        .await
        {
            Ok(file_path) => {
                let payload = json!({
                    "success": true,
                    "filePath": file_path,
                    "description": params.description,
                });
                Ok(CallToolResult::success(vec![Content::text(payload.to_string())]))
            }
            Err(e) => {
                let payload = json!({
                    "success": false,
                    "error": e.to_string(),
                });
                Ok(CallToolResult::error(vec![Content::text(payload.to_string())]))
            }
        }
    }
}

impl ServerHandler for ImageGenServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Image asset generator. Use generate_images to create a batch of \
                 images from text descriptions and save them as PNG files in one \
                 output folder, or generate_image for a single image."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<rmcp::model::ListToolsResult, McpError>> + Send + '_
    {
        async move {
            use rmcp::model::{ListToolsResult, Tool};
            use schemars::schema_for;

            // generate_images tool
            let batch_schema = schema_for!(BatchRequest);
            let batch_schema_value = serde_json::to_value(&batch_schema).unwrap_or_default();
            let batch_input_schema = match batch_schema_value {
                serde_json::Value::Object(map) => Arc::new(map),
                _ => Arc::new(serde_json::Map::new()),
            };

            // generate_image tool
            let single_schema = schema_for!(SingleImageParams);
            let single_schema_value = serde_json::to_value(&single_schema).unwrap_or_default();
            let single_input_schema = match single_schema_value {
                serde_json::Value::Object(map) => Arc::new(map),
                _ => Arc::new(serde_json::Map::new()),
            };

            Ok(ListToolsResult {
                tools: vec![
                    Tool {
                        name: Cow::Borrowed("generate_images"),
                        description: Some(Cow::Borrowed(
                            "Generates multiple images from text descriptions and saves \
                             them as PNG files in one output folder. Items succeed or \
                             fail independently; the result reports each outcome.",
                        )),
                        input_schema: batch_input_schema,
                        annotations: None,
                        icons: None,
                        meta: None,
                        output_schema: None,
                        title: None,
                    },
                    Tool {
                        name: Cow::Borrowed("generate_image"),
                        description: Some(Cow::Borrowed(
                            "Generates an image from a text description and saves it to \
                             a file.",
                        )),
                        input_schema: single_input_schema,
                        annotations: None,
                        icons: None,
                        meta: None,
                        output_schema: None,
                        title: None,
                    },
                ],
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        params: rmcp::model::CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            match params.name.as_ref() {
                "generate_images" => {
                    let batch: BatchRequest = params
                        .arguments
                        .map(|args| serde_json::from_value(serde_json::Value::Object(args)))
                        .transpose()
                        .map_err(|e| {
                            McpError::invalid_params(format!("Invalid parameters: {}", e), None)
                        })?
                        .ok_or_else(|| McpError::invalid_params("Missing parameters", None))?;

                    self.generate_images(batch).await
                }
                "generate_image" => {
                    let tool_params: SingleImageParams = params
                        .arguments
                        .map(|args| serde_json::from_value(serde_json::Value::Object(args)))
                        .transpose()
                        .map_err(|e| {
                            McpError::invalid_params(format!("Invalid parameters: {}", e), None)
                        })?
                        .ok_or_else(|| McpError::invalid_params("Missing parameters", None))?;

                    self.generate_image(tool_params).await
                }
                _ => Err(McpError::invalid_params(
                    format!("Unknown tool: {}", params.name),
                    None,
                )),
            }
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::batch::ImageRequest;
    use proptest::prelude::*;

    fn non_blank_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 ]{1,40}".prop_filter("Must not be blank", |s| !s.trim().is_empty())
    }

    proptest! {
        /// Any batch whose fields are all non-blank passes validation.
        #[test]
        fn well_formed_batches_pass_validation(
            output_folder in non_blank_strategy(),
            items in proptest::collection::vec(
                (non_blank_strategy(), non_blank_strategy()),
                1..8,
            ),
        ) {
            let batch = BatchRequest {
                output_folder,
                images: items
                    .into_iter()
                    .map(|(description, filename)| ImageRequest { description, filename })
                    .collect(),
            };
            prop_assert!(validate_batch(&batch).is_ok());
        }

        /// Blanking out any single item field makes validation fail and
        /// name the offending index.
        #[test]
        fn blank_item_field_fails_validation(
            items in proptest::collection::vec(
                (non_blank_strategy(), non_blank_strategy()),
                1..8,
            ),
            victim in any::<prop::sample::Index>(),
            blank_description in any::<bool>(),
        ) {
            let mut images: Vec<ImageRequest> = items
                .into_iter()
                .map(|(description, filename)| ImageRequest { description, filename })
                .collect();
            let index = victim.index(images.len());
            if blank_description {
                images[index].description = "   ".to_string();
            } else {
                images[index].filename = String::new();
            }

            let batch = BatchRequest {
                output_folder: "/tmp/out".to_string(),
                images,
            };
            let errors = validate_batch(&batch).unwrap_err();
            let field_prefix = format!("images[{}]", index);
            prop_assert!(errors.iter().any(|e| e.field.starts_with(&field_prefix)));
        }
    }
}
