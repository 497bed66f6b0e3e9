use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::styles::STYLE_NONE;

pub const RECEIPT_SCHEMA_VERSION: u64 = 1;

/// User-facing generation request, before enhancement and parameter
/// resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default)]
    pub ultra_realism: bool,
    #[serde(default = "default_enabled")]
    pub add_details: bool,
    #[serde(default = "default_enabled")]
    pub add_quality: bool,
    #[serde(default = "default_size")]
    pub size: String,
    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f64,
    #[serde(default = "default_steps")]
    pub steps: u32,
    pub negative_prompt: Option<String>,
    pub model: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            style: default_style(),
            ultra_realism: false,
            add_details: true,
            add_quality: true,
            size: default_size(),
            guidance_scale: default_guidance_scale(),
            steps: default_steps(),
            negative_prompt: None,
            model: None,
        }
    }
}

/// What is actually sent to the inference collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRequest {
    pub prompt: String,
    pub model: String,
    pub width: u32,
    pub height: u32,
    pub guidance_scale: f64,
    pub num_inference_steps: u32,
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

pub fn build_receipt(
    request: &GenerationRequest,
    resolved: &ResolvedRequest,
    image_path: &Path,
    receipt_path: &Path,
    result_metadata: &Map<String, Value>,
) -> Value {
    let mut root = Map::new();
    root.insert(
        "schema_version".to_string(),
        Value::Number(RECEIPT_SCHEMA_VERSION.into()),
    );
    root.insert(
        "request".to_string(),
        sanitize_payload(&serde_json::to_value(request).unwrap_or(Value::Null)),
    );
    root.insert(
        "resolved".to_string(),
        sanitize_payload(&serde_json::to_value(resolved).unwrap_or(Value::Null)),
    );

    let mut artifacts = Map::new();
    artifacts.insert(
        "image_path".to_string(),
        Value::String(image_path.to_string_lossy().to_string()),
    );
    artifacts.insert(
        "receipt_path".to_string(),
        Value::String(receipt_path.to_string_lossy().to_string()),
    );
    root.insert("artifacts".to_string(), Value::Object(artifacts));
    root.insert(
        "result_metadata".to_string(),
        sanitize_payload(&Value::Object(result_metadata.clone())),
    );
    Value::Object(root)
}

pub fn write_receipt(path: &Path, payload: &Value) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(payload)?)?;
    Ok(())
}

fn sanitize_payload(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Bool(_) | Value::Number(_) | Value::String(_) => value.clone(),
        Value::Array(rows) => Value::Array(rows.iter().map(sanitize_payload).collect()),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, row) in map {
                let lowered = key.to_ascii_lowercase();
                if matches!(
                    lowered.as_str(),
                    "b64_json" | "bytes" | "image" | "image_bytes" | "data"
                ) {
                    out.insert(key.clone(), Value::String("<omitted>".to_string()));
                    continue;
                }
                out.insert(key.clone(), sanitize_payload(row));
            }
            Value::Object(out)
        }
    }
}

fn default_style() -> String {
    STYLE_NONE.to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_size() -> String {
    "768x768".to_string()
}

fn default_guidance_scale() -> f64 {
    7.5
}

fn default_steps() -> u32 {
    4
}
