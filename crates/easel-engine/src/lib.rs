use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use easel_contracts::errors::classify_failure;
use easel_contracts::events::{EventPayload, EventWriter};
use easel_contracts::history::{GenerationRecord, History, ImageArtifact, HISTORY_CAPACITY};
use easel_contracts::requests::{build_receipt, write_receipt, GenerationRequest, ResolvedRequest};
use easel_contracts::styles::{StyleRegistry, STYLE_NONE};
use image::{ImageFormat, Rgb, RgbImage};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

pub const DEFAULT_MODEL: &str = "black-forest-labs/FLUX.1-schnell";
pub const DEFAULT_PROVIDER: &str = "huggingface";

pub const REALISM_WIDTH: u32 = 1024;
pub const REALISM_HEIGHT: u32 = 1024;
pub const REALISM_GUIDANCE_SCALE: f64 = 15.0;
pub const REALISM_INFERENCE_STEPS: u32 = 16;

const MIN_DIMENSION: u32 = 256;
const MAX_DIMENSION: u32 = 1024;
const MIN_GUIDANCE_SCALE: f64 = 1.0;
const MAX_GUIDANCE_SCALE: f64 = 20.0;
// Hosted FLUX.1-schnell rejects anything above 16 steps.
const MAX_INFERENCE_STEPS: u32 = 16;

const FALLBACK_WIDTH: u32 = 768;
const FALLBACK_HEIGHT: u32 = 768;

/// Prompt fragments that mark a human subject. Substring matching is a
/// documented heuristic ("manhole" matches "man"), not a precision guarantee.
const HUMAN_SUBJECT_KEYWORDS: &[&str] = &[
    "hand", "hands", "finger", "fingers", "face", "eye", "eyes", "nose", "mouth", "ear", "ears",
    "arm", "arms", "leg", "legs", "foot", "feet", "skin", "body", "person", "human", "portrait",
    "man", "woman", "child", "people",
];

const ULTRA_REALISM_SUFFIX: &str = "RAW photo, genuine photograph, real camera capture, photorealistic, ultra realistic, hyper detailed, 8k uhd, shot on Canon EOS R5, professional DSLR photography, natural photograph, real world scene, authentic lighting, real textures, film grain, natural color grading, high dynamic range, proper exposure, masterpiece quality, crystal clear, sharp focus everywhere, deep focus f/22, everything in focus, full scene detail, volumetric atmospheric lighting, physically accurate, extreme detail throughout, intricate real-world details, accurate colors, natural skin tones, realistic materials, perfect clarity, comprehensive detail, no artificial blur, infinite depth of field, everything sharp, all elements detailed, true to life, optical perfection, real photograph quality, entire scene in sharp focus, background highly detailed, foreground and background equally sharp, no depth of field blur, no bokeh, no defocus, complete scene clarity, f/32 aperture, tack sharp throughout";

const ULTRA_REALISM_ANATOMY_SUFFIX: &str = "anatomically correct, realistic human anatomy, real human skin texture, visible skin pores, skin imperfections, natural skin subsurface scattering, authentic dermal details, real skin microstructure, fine skin lines, natural skin blemishes, realistic skin tone variation, genuine skin appearance, skin texture like real photographs of humans, dermatological accuracy, macro photography skin detail, individual pore visibility, natural skin oils, authentic epidermal texture, real subcutaneous details, lifelike skin translucency, biological skin accuracy, medical photography skin precision, true to life human skin, photorealistic flesh tones, natural vein visibility under skin, authentic skin undertones, real human dermis characteristics";

const DETAIL_ENHANCER_SUFFIX: &str = "highly detailed throughout entire scene";

const QUALITY_ENHANCER_SUFFIX: &str =
    "high quality, sharp focus everywhere, everything in focus, deep focus, no blur";

pub fn contains_human_subject(prompt: &str) -> bool {
    let lowered = prompt.to_ascii_lowercase();
    HUMAN_SUBJECT_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// Appends the style (or ultra-realism) suffix to the base prompt.
///
/// Ultra realism wins over any style selection. A style of "none", an empty
/// style, or an identifier missing from the table all return the base prompt
/// unchanged. Pure and total; empty prompts are the caller's problem.
pub fn enhance_prompt(
    styles: &StyleRegistry,
    base_prompt: &str,
    style: &str,
    ultra_realism: bool,
) -> String {
    let contains_human = contains_human_subject(base_prompt);

    if ultra_realism {
        let mut enhanced = format!("{base_prompt}, {ULTRA_REALISM_SUFFIX}");
        if contains_human {
            enhanced.push_str(", ");
            enhanced.push_str(ULTRA_REALISM_ANATOMY_SUFFIX);
        }
        return enhanced;
    }

    let trimmed = style.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(STYLE_NONE) {
        return base_prompt.to_string();
    }
    let Some(preset) = styles.resolve(trimmed) else {
        return base_prompt.to_string();
    };

    let mut enhanced = format!("{base_prompt}, {}", preset.suffix);
    if contains_human {
        if let Some(anatomy) = &preset.anatomy_suffix {
            enhanced.push_str(", ");
            enhanced.push_str(anatomy);
        }
    }
    enhanced
}

/// Optional quality markers appended after style enhancement. Skipped
/// entirely in ultra-realism mode, whose suffix already encodes both. The
/// detail marker is idempotent: it is only added when "detailed" is not
/// already present somewhere in the enhanced prompt.
pub fn apply_quality_enhancers(
    enhanced_prompt: &str,
    add_details: bool,
    add_quality: bool,
    ultra_realism: bool,
) -> String {
    if ultra_realism {
        return enhanced_prompt.to_string();
    }
    let mut out = enhanced_prompt.to_string();
    if add_details && !out.to_ascii_lowercase().contains("detailed") {
        out.push_str(", ");
        out.push_str(DETAIL_ENHANCER_SUFFIX);
    }
    if add_quality {
        out.push_str(", ");
        out.push_str(QUALITY_ENHANCER_SUFFIX);
    }
    out
}

/// Turns a user request plus the final prompt into the exact payload sent to
/// the provider. Ultra realism forces the fixed maximum-quality parameters;
/// everything else is clamped to the supported envelope with a warning.
pub fn resolve_request(
    request: &GenerationRequest,
    final_prompt: &str,
    model: &str,
) -> ResolvedRequest {
    let negative_prompt = request
        .negative_prompt
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    if request.ultra_realism {
        return ResolvedRequest {
            prompt: final_prompt.to_string(),
            model: model.to_string(),
            width: REALISM_WIDTH,
            height: REALISM_HEIGHT,
            guidance_scale: REALISM_GUIDANCE_SCALE,
            num_inference_steps: REALISM_INFERENCE_STEPS,
            negative_prompt,
            warnings: Vec::new(),
        };
    }

    let mut warnings = Vec::new();
    let (width, height) = parse_size(&request.size, &mut warnings);

    let guidance_scale = request
        .guidance_scale
        .clamp(MIN_GUIDANCE_SCALE, MAX_GUIDANCE_SCALE);
    if guidance_scale != request.guidance_scale {
        push_unique_warning(
            &mut warnings,
            format!("guidance scale clamped to {guidance_scale}"),
        );
    }

    let num_inference_steps = request.steps.clamp(1, MAX_INFERENCE_STEPS);
    if num_inference_steps != request.steps {
        push_unique_warning(
            &mut warnings,
            format!("inference steps clamped to {num_inference_steps}"),
        );
    }

    ResolvedRequest {
        prompt: final_prompt.to_string(),
        model: model.to_string(),
        width,
        height,
        guidance_scale,
        num_inference_steps,
        negative_prompt,
        warnings,
    }
}

fn parse_size(raw: &str, warnings: &mut Vec<String>) -> (u32, u32) {
    let lowered = raw.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "square" => return (512, 512),
        "portrait" => return (512, 768),
        "landscape" => return (768, 512),
        _ => {}
    }
    if let Some((left, right)) = lowered.split_once('x') {
        if let (Ok(width), Ok(height)) = (left.trim().parse::<u32>(), right.trim().parse::<u32>()) {
            let clamped_width = width.clamp(MIN_DIMENSION, MAX_DIMENSION);
            let clamped_height = height.clamp(MIN_DIMENSION, MAX_DIMENSION);
            if clamped_width != width || clamped_height != height {
                push_unique_warning(
                    warnings,
                    format!("size clamped to {clamped_width}x{clamped_height}"),
                );
            }
            return (clamped_width, clamped_height);
        }
    }
    push_unique_warning(
        warnings,
        format!("size '{raw}' not understood; using {FALLBACK_WIDTH}x{FALLBACK_HEIGHT}"),
    );
    (FALLBACK_WIDTH, FALLBACK_HEIGHT)
}

/// Raw image payload as returned by a provider.
#[derive(Debug, Clone)]
pub struct ProviderImage {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

pub trait TextToImageProvider: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, request: &ResolvedRequest) -> Result<ProviderImage>;
}

#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Box<dyn TextToImageProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P: TextToImageProvider + 'static>(&mut self, provider: P) {
        self.providers
            .insert(provider.name().to_string(), Box::new(provider));
    }

    pub fn get(&self, name: &str) -> Option<&dyn TextToImageProvider> {
        self.providers.get(name).map(|provider| provider.as_ref())
    }

    pub fn names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

pub fn default_provider_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(DryrunProvider);
    registry.register(HuggingFaceProvider::new());
    registry
}

/// Offline provider: fills the requested canvas with a color derived from
/// the prompt, so sessions and tests run with no network or credentials.
struct DryrunProvider;

impl TextToImageProvider for DryrunProvider {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate(&self, request: &ResolvedRequest) -> Result<ProviderImage> {
        let (r, g, b) = color_from_prompt(&request.prompt, request.num_inference_steps as u64);
        let mut canvas = RgbImage::new(request.width, request.height);
        for pixel in canvas.pixels_mut() {
            *pixel = Rgb([r, g, b]);
        }
        let mut bytes = Vec::new();
        canvas
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .context("failed to encode dryrun image")?;
        Ok(ProviderImage {
            bytes,
            mime_type: Some("image/png".to_string()),
        })
    }
}

struct HuggingFaceProvider {
    api_base: String,
    http: HttpClient,
}

impl HuggingFaceProvider {
    fn new() -> Self {
        Self {
            api_base: env::var("HF_API_BASE")
                .ok()
                .map(|value| value.trim().trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| "https://api-inference.huggingface.co".to_string()),
            http: HttpClient::new(),
        }
    }

    fn model_endpoint(&self, model: &str) -> String {
        format!("{}/models/{}", self.api_base, model.trim_start_matches('/'))
    }
}

pub fn huggingface_api_key() -> Option<String> {
    non_empty_env("HUGGINGFACE_TOKEN").or_else(|| non_empty_env("HF_TOKEN"))
}

impl TextToImageProvider for HuggingFaceProvider {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn generate(&self, request: &ResolvedRequest) -> Result<ProviderImage> {
        let Some(api_key) = huggingface_api_key() else {
            bail!("HUGGINGFACE_TOKEN not set");
        };

        let mut parameters = map_object(json!({
            "width": request.width,
            "height": request.height,
            "guidance_scale": request.guidance_scale,
            "num_inference_steps": request.num_inference_steps,
        }));
        if let Some(negative_prompt) = &request.negative_prompt {
            parameters.insert(
                "negative_prompt".to_string(),
                Value::String(negative_prompt.clone()),
            );
        }
        let payload = json!({
            "inputs": request.prompt,
            "parameters": parameters,
        });

        let endpoint = self.model_endpoint(&request.model);
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&api_key)
            .timeout(Duration::from_secs(120))
            .json(&payload)
            .send()
            .with_context(|| format!("Hugging Face request failed ({endpoint})"))?;

        image_from_response("Hugging Face", response)
    }
}

/// A success response is either raw image bytes or a JSON body carrying a
/// base64-encoded image; error bodies are surfaced verbatim with the status.
fn image_from_response(provider: &str, response: HttpResponse) -> Result<ProviderImage> {
    let status = response.status();
    let mime_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = response
        .bytes()
        .with_context(|| format!("{provider} response body read failed"))?
        .to_vec();

    if !status.is_success() {
        let body = String::from_utf8_lossy(&bytes);
        bail!(
            "{provider} request failed ({}): {}",
            status.as_u16(),
            truncate_text(&body, 512)
        );
    }

    let is_json = mime_type
        .as_deref()
        .map(|value| value.to_ascii_lowercase().contains("json"))
        .unwrap_or(false);
    if is_json {
        let parsed: Value = serde_json::from_slice(&bytes)
            .with_context(|| format!("{provider} returned invalid JSON payload"))?;
        let Some(encoded) = extract_image_b64(&parsed) else {
            bail!(
                "{provider} response carried no image data: {}",
                truncate_text(&parsed.to_string(), 512)
            );
        };
        let decoded = BASE64
            .decode(encoded.as_bytes())
            .with_context(|| format!("{provider} returned undecodable image data"))?;
        return Ok(ProviderImage {
            bytes: decoded,
            mime_type: Some("image/png".to_string()),
        });
    }

    Ok(ProviderImage { bytes, mime_type })
}

fn extract_image_b64(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            let stripped = trimmed
                .split_once("base64,")
                .map(|(_, tail)| tail)
                .unwrap_or(trimmed);
            Some(stripped.to_string())
        }
        Value::Array(rows) => rows.iter().find_map(extract_image_b64),
        Value::Object(obj) => {
            for key in ["b64_json", "image", "image_base64", "images", "data"] {
                if let Some(found) = obj.get(key).and_then(extract_image_b64) {
                    return Some(found);
                }
            }
            None
        }
        _ => None,
    }
}

/// Session-scoped orchestrator: enhances the prompt, calls the provider,
/// writes artifacts and receipts, and maintains the bounded history. One
/// instance per session; the history dies with it.
pub struct SessionEngine {
    out_dir: PathBuf,
    session_id: String,
    events: EventWriter,
    styles: StyleRegistry,
    providers: ProviderRegistry,
    provider_name: String,
    model: String,
    history: History,
    last_request: Option<GenerationRequest>,
    generation_count: u64,
    started_at: String,
}

impl SessionEngine {
    pub fn new(
        out_dir: impl Into<PathBuf>,
        events_path: impl Into<PathBuf>,
        model: Option<String>,
        provider: Option<String>,
    ) -> Result<Self> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("failed to create {}", out_dir.display()))?;
        let session_id = uuid::Uuid::new_v4().to_string();
        let events = EventWriter::new(events_path.into(), session_id.clone());
        let provider_name = provider
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
        let model = model
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let started_at = now_utc_iso();

        events.emit(
            "session_started",
            map_object(json!({
                "out_dir": out_dir.to_string_lossy().to_string(),
                "provider": provider_name.clone(),
                "model": model.clone(),
            })),
        )?;

        Ok(Self {
            out_dir,
            session_id,
            events,
            styles: StyleRegistry::load(),
            providers: default_provider_registry(),
            provider_name,
            model,
            history: History::new(),
            last_request: None,
            generation_count: 0,
            started_at,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn out_dir(&self) -> &PathBuf {
        &self.out_dir
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn event_writer(&self) -> EventWriter {
        self.events.clone()
    }

    pub fn emit_event(&self, event_type: &str, payload: EventPayload) -> Result<Value> {
        self.events.emit(event_type, payload)
    }

    pub fn clear_history(&mut self) -> Result<()> {
        self.history.clear();
        self.events.emit("history_cleared", EventPayload::new())?;
        Ok(())
    }

    /// Runs one full generation: validate, enhance, resolve, call the
    /// provider, persist the artifact, push the record. The provider call is
    /// the only blocking point; a failure is surfaced once, never retried.
    pub fn generate(&mut self, request: &GenerationRequest) -> Result<GenerationRecord> {
        let base_prompt = request.prompt.trim();
        if base_prompt.is_empty() {
            bail!("prompt is empty");
        }

        let style_id = self
            .styles
            .resolve(&request.style)
            .map(|preset| preset.id.clone())
            .unwrap_or_else(|| STYLE_NONE.to_string());
        let enhanced = enhance_prompt(&self.styles, base_prompt, &request.style, request.ultra_realism);
        let final_prompt = apply_quality_enhancers(
            &enhanced,
            request.add_details,
            request.add_quality,
            request.ultra_realism,
        );
        let model = request
            .model
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(&self.model)
            .to_string();
        let resolved = resolve_request(request, &final_prompt, &model);

        self.events.emit(
            "generation_started",
            map_object(json!({
                "prompt": base_prompt,
                "enhanced_prompt": resolved.prompt.clone(),
                "style": style_id.clone(),
                "ultra_realism": request.ultra_realism,
                "provider": self.provider_name.clone(),
                "model": resolved.model.clone(),
                "width": resolved.width,
                "height": resolved.height,
                "guidance_scale": resolved.guidance_scale,
                "num_inference_steps": resolved.num_inference_steps,
                "warnings": resolved.warnings.clone(),
            })),
        )?;

        let provider = if let Some(provider) = self.providers.get(&self.provider_name) {
            provider
        } else {
            let available = self.providers.names().join(", ");
            let error = format!(
                "provider '{}' not registered (available: [{}])",
                self.provider_name, available
            );
            let kind = classify_failure(&error);
            self.events.emit(
                "generation_failed",
                map_object(json!({
                    "provider": self.provider_name.clone(),
                    "model": resolved.model.clone(),
                    "error": error.clone(),
                    "kind": kind.as_str(),
                })),
            )?;
            bail!("{error}");
        };

        let started = Instant::now();
        let image = match provider.generate(&resolved) {
            Ok(image) => image,
            Err(err) => {
                let error_text = error_chain_text(&err, 2048);
                let kind = classify_failure(&error_text);
                self.events.emit(
                    "generation_failed",
                    map_object(json!({
                        "provider": self.provider_name.clone(),
                        "model": resolved.model.clone(),
                        "error": error_text,
                        "kind": kind.as_str(),
                        "latency_s": started.elapsed().as_secs_f64(),
                    })),
                )?;
                return Err(err).context("provider generation failed");
            }
        };
        let latency_s = started.elapsed().as_secs_f64();

        self.generation_count += 1;
        let record_id = format!(
            "gen-{:03}-{}",
            self.generation_count,
            short_id(&resolved.prompt, self.generation_count)
        );
        let ext = output_extension_from_mime(image.mime_type.as_deref());
        let image_path = self.out_dir.join(format!(
            "artifact-{}-{:02}.{}",
            timestamp_millis(),
            self.generation_count,
            ext
        ));
        fs::write(&image_path, &image.bytes)
            .with_context(|| format!("failed to write {}", image_path.display()))?;

        let receipt_path = self.out_dir.join(format!("receipt-{record_id}.json"));
        let result_metadata = map_object(json!({
            "provider": self.provider_name.clone(),
            "mime_type": image.mime_type.clone(),
            "byte_len": image.bytes.len(),
            "latency_s": latency_s,
        }));
        let receipt = build_receipt(request, &resolved, &image_path, &receipt_path, &result_metadata);
        write_receipt(&receipt_path, &receipt)?;

        let record = GenerationRecord {
            record_id: record_id.clone(),
            image: ImageArtifact {
                bytes: image.bytes,
                mime_type: image.mime_type,
            },
            image_path: Some(image_path.clone()),
            original_prompt: base_prompt.to_string(),
            enhanced_prompt: resolved.prompt.clone(),
            style: style_id,
            realism_mode: request.ultra_realism,
            width: resolved.width,
            height: resolved.height,
            created_at: Utc::now(),
        };
        self.history.push(record.clone());
        self.last_request = Some(request.clone());

        self.events.emit(
            "artifact_created",
            map_object(json!({
                "record_id": record_id,
                "image_path": image_path.to_string_lossy().to_string(),
                "receipt_path": receipt_path.to_string_lossy().to_string(),
                "width": record.width,
                "height": record.height,
                "latency_s": latency_s,
            })),
        )?;
        self.events.emit(
            "history_updated",
            map_object(json!({
                "length": self.history.len(),
                "capacity": HISTORY_CAPACITY,
            })),
        )?;

        Ok(record)
    }

    /// Re-runs the previous request with refinement instructions appended to
    /// its prompt, keeping style, realism and parameters as they were.
    pub fn refine(&mut self, instructions: &str) -> Result<GenerationRecord> {
        let instructions = instructions.trim();
        if instructions.is_empty() {
            bail!("refinement instructions are empty");
        }
        let Some(last) = self.last_request.clone() else {
            bail!("nothing to refine yet; generate an image first");
        };
        let mut request = last;
        request.prompt = format!("{}, {}", request.prompt.trim(), instructions);
        self.generate(&request)
    }

    pub fn finish(&mut self) -> Result<()> {
        self.events.emit(
            "session_finished",
            map_object(json!({
                "generations": self.generation_count,
                "history_len": self.history.len(),
                "started_at": self.started_at.clone(),
                "finished_at": now_utc_iso(),
            })),
        )?;
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts
            .last()
            .map(|existing| existing == trimmed)
            .unwrap_or(false)
        {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

fn push_unique_warning(warnings: &mut Vec<String>, message: String) {
    if message.trim().is_empty() {
        return;
    }
    if warnings.iter().any(|existing| existing == &message) {
        return;
    }
    warnings.push(message);
}

fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or(0)
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, false)
}

fn short_id(prompt: &str, idx: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update(idx.to_be_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..4])
}

fn color_from_prompt(prompt: &str, seed: u64) -> (u8, u8, u8) {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update(seed.to_be_bytes());
    let digest = hasher.finalize();
    (digest[0], digest[1], digest[2])
}

fn output_extension_from_mime(mime: Option<&str>) -> &'static str {
    if let Some(mime) = mime {
        let lowered = mime.to_ascii_lowercase();
        if lowered.contains("jpeg") || lowered.contains("jpg") {
            return "jpg";
        }
        if lowered.contains("webp") {
            return "webp";
        }
    }
    "png"
}

fn map_object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
