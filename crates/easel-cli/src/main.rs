use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use easel_contracts::chat::{parse_intent, Intent, SESSION_HELP_COMMANDS};
use easel_contracts::errors::{classify_failure, failure_hint};
use easel_contracts::history::GenerationRecord;
use easel_contracts::requests::GenerationRequest;
use easel_contracts::styles::{StyleRegistry, STYLE_NONE};
use easel_engine::{huggingface_api_key, SessionEngine, DEFAULT_PROVIDER};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "easel", version, about = "Prompt-enhanced text-to-image generation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a single image and exit.
    Generate(GenerateArgs),
    /// Interactive generation session with history.
    Session(SessionArgs),
    /// List the available style presets.
    Styles,
}

#[derive(Debug, Parser)]
struct GenerateArgs {
    #[arg(long)]
    prompt: String,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long, default_value = "none")]
    style: String,
    /// Ultra realism mode: overrides style and forces maximum-quality
    /// parameters (1024x1024, guidance 15, 16 steps).
    #[arg(long)]
    realism: bool,
    /// WxH, or one of: square, portrait, landscape.
    #[arg(long, default_value = "768x768")]
    size: String,
    #[arg(long, default_value_t = 7.5)]
    guidance: f64,
    #[arg(long, default_value_t = 4)]
    steps: u32,
    #[arg(long)]
    negative: Option<String>,
    #[arg(long)]
    no_details: bool,
    #[arg(long)]
    no_quality: bool,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    provider: Option<String>,
}

#[derive(Debug, Parser)]
struct SessionArgs {
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    provider: Option<String>,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("easel error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Session(args) => {
            run_session(args)?;
            Ok(0)
        }
        Command::Styles => {
            print_styles(&StyleRegistry::load());
            Ok(0)
        }
    }
}

/// Missing credentials halt before any core logic runs; every other failure
/// is surfaced per generation.
fn ensure_credentials(provider: &str) -> Result<()> {
    if provider.trim().eq_ignore_ascii_case("huggingface") && huggingface_api_key().is_none() {
        bail!(
            "HUGGINGFACE_TOKEN not configured; create a token with write permissions and export it (read-only tokens do not work for the inference API)"
        );
    }
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<i32> {
    let provider = args
        .provider
        .clone()
        .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
    ensure_credentials(&provider)?;

    let events_path = args
        .events
        .clone()
        .unwrap_or_else(|| args.out.join("events.jsonl"));
    let mut engine = SessionEngine::new(&args.out, events_path, args.model.clone(), Some(provider))?;

    let mut request = GenerationRequest::new(args.prompt.clone());
    request.style = args.style.clone();
    request.ultra_realism = args.realism;
    request.add_details = !args.no_details;
    request.add_quality = !args.no_quality;
    request.size = args.size.clone();
    request.guidance_scale = args.guidance;
    request.steps = args.steps;
    request.negative_prompt = args.negative.clone();

    let code = match engine.generate(&request) {
        Ok(record) => {
            report_record(&record);
            0
        }
        Err(err) => {
            report_failure(&err);
            1
        }
    };
    engine.finish()?;
    Ok(code)
}

fn run_session(args: SessionArgs) -> Result<()> {
    let provider = args
        .provider
        .clone()
        .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
    ensure_credentials(&provider)?;

    let events_path = args
        .events
        .clone()
        .unwrap_or_else(|| args.out.join("events.jsonl"));
    let mut engine = SessionEngine::new(&args.out, events_path, args.model.clone(), Some(provider))?;
    let mut settings = GenerationRequest::new(String::new());

    println!("Easel session started. Type a prompt to generate, /help for commands.");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        let read = stdin
            .read_line(&mut line)
            .context("failed reading from stdin")?;
        if read == 0 {
            break;
        }

        let intent = parse_intent(&line);
        match intent.action.as_str() {
            "noop" => {}
            "quit" => break,
            "help" => print_help(),
            "generate" => {
                settings.prompt = intent.prompt.clone().unwrap_or_default();
                match engine.generate(&settings) {
                    Ok(record) => report_record(&record),
                    Err(err) => report_failure(&err),
                }
            }
            "refine" => match intent.prompt.as_deref() {
                Some(instructions) => match engine.refine(instructions) {
                    Ok(record) => report_record(&record),
                    Err(err) => report_failure(&err),
                },
                None => println!("usage: /refine <what to improve or change>"),
            },
            "show_history" => print_history(&engine),
            "clear_history" => {
                engine.clear_history()?;
                println!("History cleared.");
            }
            "list_styles" => print_styles(engine.styles()),
            "save" => handle_save(&engine, &intent),
            "unknown" => {
                println!("Unknown command. Type /help for the command list.");
            }
            _ => {
                let message = apply_settings_update(&mut settings, engine.styles(), &intent);
                if !message.is_empty() {
                    println!("{message}");
                }
            }
        }
    }

    engine.finish()?;
    Ok(())
}

/// Applies a `/style`-family intent to the session settings and returns the
/// line to show the user.
fn apply_settings_update(
    settings: &mut GenerationRequest,
    styles: &StyleRegistry,
    intent: &Intent,
) -> String {
    match intent.action.as_str() {
        "set_style" => match intent.settings_update.get("style") {
            Some(Value::String(raw)) => {
                if raw.trim().eq_ignore_ascii_case(STYLE_NONE) {
                    settings.style = STYLE_NONE.to_string();
                    return "Style cleared; prompts are used as-is.".to_string();
                }
                match styles.resolve(raw) {
                    Some(preset) => {
                        settings.style = preset.id.clone();
                        format!("Style set to {}.", preset.label)
                    }
                    None => format!("Unknown style '{raw}'. Use /styles to list presets."),
                }
            }
            _ => "usage: /style <name> (or /style none)".to_string(),
        },
        "set_model" => match intent.settings_update.get("model") {
            Some(Value::String(raw)) => {
                settings.model = Some(raw.clone());
                format!("Model set to {raw}.")
            }
            _ => "usage: /model <model id>".to_string(),
        },
        "set_negative" => match intent.settings_update.get("negative_prompt") {
            Some(Value::String(raw)) => {
                settings.negative_prompt = Some(raw.clone());
                "Negative prompt set.".to_string()
            }
            _ => {
                settings.negative_prompt = None;
                "Negative prompt cleared.".to_string()
            }
        },
        "set_size" => match intent.settings_update.get("size") {
            Some(Value::String(raw)) => {
                settings.size = raw.clone();
                format!("Size set to {raw}.")
            }
            _ => "usage: /size <WxH|square|portrait|landscape>".to_string(),
        },
        "set_guidance" => match intent
            .settings_update
            .get("guidance_scale")
            .and_then(Value::as_f64)
        {
            Some(value) => {
                settings.guidance_scale = value;
                format!("Guidance scale set to {value}.")
            }
            None => "usage: /guidance <1.0-20.0>".to_string(),
        },
        "set_steps" => match intent.settings_update.get("steps").and_then(Value::as_u64) {
            Some(value) => {
                settings.steps = value as u32;
                format!("Inference steps set to {value}.")
            }
            None => "usage: /steps <1-16>".to_string(),
        },
        "set_realism" => match intent
            .settings_update
            .get("ultra_realism")
            .and_then(Value::as_bool)
        {
            Some(true) => {
                settings.ultra_realism = true;
                "Ultra realism mode on: 1024x1024, guidance 15, 16 steps (slower).".to_string()
            }
            Some(false) => {
                settings.ultra_realism = false;
                "Ultra realism mode off.".to_string()
            }
            None => "usage: /realism on|off".to_string(),
        },
        "set_details" => match intent
            .settings_update
            .get("add_details")
            .and_then(Value::as_bool)
        {
            Some(value) => {
                settings.add_details = value;
                format!("Detail enhancer {}.", if value { "on" } else { "off" })
            }
            None => "usage: /details on|off".to_string(),
        },
        "set_quality" => match intent
            .settings_update
            .get("add_quality")
            .and_then(Value::as_bool)
        {
            Some(value) => {
                settings.add_quality = value;
                format!("Quality keywords {}.", if value { "on" } else { "off" })
            }
            None => "usage: /quality on|off".to_string(),
        },
        _ => String::new(),
    }
}

fn handle_save(engine: &SessionEngine, intent: &Intent) {
    let index = intent
        .command_args
        .get("index")
        .and_then(Value::as_u64)
        .unwrap_or(0) as usize;
    let Some(path) = intent.command_args.get("path").and_then(Value::as_str) else {
        println!("usage: /save [index] <path>");
        return;
    };
    let Some(record) = engine.history().get(index) else {
        println!(
            "No history entry {index}; /history lists {} entries.",
            engine.history().len()
        );
        return;
    };
    match fs::write(path, &record.image.bytes) {
        Ok(()) => println!("Saved {} to {path}.", record.record_id),
        Err(err) => println!("Failed to save {path}: {err}"),
    }
}

fn report_record(record: &GenerationRecord) {
    println!(
        "Generated {} ({}x{}, style {}{})",
        record.record_id,
        record.width,
        record.height,
        record.style,
        if record.realism_mode { ", ultra realism" } else { "" }
    );
    if let Some(path) = &record.image_path {
        println!("Saved to {}", path.display());
    }
    println!(
        "Prompt sent: {}",
        truncate_prompt(&record.enhanced_prompt, 160)
    );
}

fn report_failure(err: &anyhow::Error) {
    let rendered = format!("{err:#}");
    let kind = classify_failure(&rendered);
    eprintln!("Generation failed: {rendered}");
    eprintln!("{}", failure_hint(kind));
}

fn print_history(engine: &SessionEngine) {
    if engine.history().is_empty() {
        println!("History is empty.");
        return;
    }
    for (index, record) in engine.history().list().iter().enumerate() {
        println!("{}", format_history_line(index, record));
    }
}

fn format_history_line(index: usize, record: &GenerationRecord) -> String {
    format!(
        "[{index}] {} style={}{} {}x{} {}",
        record.created_at.format("%H:%M:%S"),
        record.style,
        if record.realism_mode { "+realism" } else { "" },
        record.width,
        record.height,
        truncate_prompt(&record.original_prompt, 60)
    )
}

fn print_styles(styles: &StyleRegistry) {
    println!("{:<16} use the prompt as-is", STYLE_NONE);
    for preset in styles.list() {
        println!("{:<16} {}", preset.id, preset.label);
    }
}

fn print_help() {
    println!("Type a prompt to generate an image. Commands:");
    println!("  {}", SESSION_HELP_COMMANDS.join(" "));
}

fn truncate_prompt(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use easel_contracts::chat::parse_intent;
    use easel_contracts::history::{GenerationRecord, ImageArtifact};
    use easel_contracts::requests::GenerationRequest;
    use easel_contracts::styles::StyleRegistry;

    use super::{apply_settings_update, format_history_line, truncate_prompt};

    fn record(prompt: &str) -> GenerationRecord {
        GenerationRecord {
            record_id: "gen-001-abcd1234".to_string(),
            image: ImageArtifact {
                bytes: vec![1, 2, 3],
                mime_type: Some("image/png".to_string()),
            },
            image_path: None,
            original_prompt: prompt.to_string(),
            enhanced_prompt: format!("{prompt}, watercolor painting"),
            style: "watercolor".to_string(),
            realism_mode: false,
            width: 512,
            height: 768,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn style_updates_resolve_labels_and_reject_unknowns() {
        let styles = StyleRegistry::new(None);
        let mut settings = GenerationRequest::new("");

        let message =
            apply_settings_update(&mut settings, &styles, &parse_intent("/style Anime/Manga"));
        assert_eq!(settings.style, "anime");
        assert!(message.contains("Anime/Manga"));

        let message =
            apply_settings_update(&mut settings, &styles, &parse_intent("/style vaporwave"));
        assert_eq!(settings.style, "anime");
        assert!(message.contains("Unknown style"));

        let message = apply_settings_update(&mut settings, &styles, &parse_intent("/style none"));
        assert_eq!(settings.style, "none");
        assert!(message.contains("as-is"));
    }

    #[test]
    fn numeric_and_toggle_updates_apply() {
        let styles = StyleRegistry::new(None);
        let mut settings = GenerationRequest::new("");

        apply_settings_update(&mut settings, &styles, &parse_intent("/guidance 12.5"));
        assert_eq!(settings.guidance_scale, 12.5);

        apply_settings_update(&mut settings, &styles, &parse_intent("/steps 8"));
        assert_eq!(settings.steps, 8);

        apply_settings_update(&mut settings, &styles, &parse_intent("/realism"));
        assert!(settings.ultra_realism);

        apply_settings_update(&mut settings, &styles, &parse_intent("/realism off"));
        assert!(!settings.ultra_realism);

        let message = apply_settings_update(&mut settings, &styles, &parse_intent("/steps lots"));
        assert_eq!(settings.steps, 8);
        assert!(message.starts_with("usage:"));
    }

    #[test]
    fn negative_prompt_sets_and_clears() {
        let styles = StyleRegistry::new(None);
        let mut settings = GenerationRequest::new("");

        apply_settings_update(
            &mut settings,
            &styles,
            &parse_intent("/negative blurry, low quality"),
        );
        assert_eq!(settings.negative_prompt.as_deref(), Some("blurry, low quality"));

        apply_settings_update(&mut settings, &styles, &parse_intent("/negative"));
        assert!(settings.negative_prompt.is_none());
    }

    #[test]
    fn history_line_is_compact() {
        let line = format_history_line(3, &record("a very calm harbor at dawn"));
        assert!(line.starts_with("[3] "));
        assert!(line.contains("style=watercolor"));
        assert!(line.contains("512x768"));
        assert!(line.contains("a very calm harbor at dawn"));
    }

    #[test]
    fn truncate_prompt_appends_ellipsis() {
        assert_eq!(truncate_prompt("short", 10), "short");
        let truncated = truncate_prompt(&"x".repeat(20), 10);
        assert_eq!(truncated.chars().count(), 11);
        assert!(truncated.ends_with('…'));
    }
}
