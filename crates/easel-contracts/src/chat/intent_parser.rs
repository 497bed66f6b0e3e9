use std::collections::BTreeMap;

use serde_json::{Number, Value};

use super::command_registry::{
    CommandSpec, SettingSpec, NO_ARG_COMMANDS, NUMERIC_SETTING_COMMANDS, REFINE_COMMAND,
    SAVE_COMMAND, TEXT_SETTING_COMMANDS, TOGGLE_COMMANDS,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub raw: String,
    pub prompt: Option<String>,
    pub settings_update: BTreeMap<String, Value>,
    pub command_args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            prompt: None,
            settings_update: BTreeMap::new(),
            command_args: BTreeMap::new(),
        }
    }
}

fn find_command(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn find_setting(command: &str, specs: &'static [SettingSpec]) -> Option<&'static SettingSpec> {
    specs.iter().find(|spec| spec.command == command)
}

/// `on`/`off` style flag, empty meaning "turn on". Returns `None` on anything
/// unrecognized so the caller can show usage.
fn parse_toggle_arg(arg: &str) -> Option<bool> {
    let lowered = arg.trim().to_ascii_lowercase();
    if lowered.is_empty() {
        return Some(true);
    }
    if matches!(lowered.as_str(), "on" | "true" | "yes" | "1") {
        return Some(true);
    }
    if matches!(lowered.as_str(), "off" | "false" | "no" | "0") {
        return Some(false);
    }
    None
}

fn parse_number_arg(arg: &str) -> Option<Number> {
    let trimmed = arg.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = trimmed.parse::<u64>() {
        return Some(Number::from(value));
    }
    trimmed.parse::<f64>().ok().and_then(Number::from_f64)
}

fn parse_save_args(arg: &str) -> (u64, Option<String>) {
    let parts = match shell_words::split(arg) {
        Ok(parts) => parts,
        Err(_) => arg.split_whitespace().map(str::to_string).collect(),
    };
    let parts: Vec<String> = parts.into_iter().filter(|value| !value.is_empty()).collect();
    match parts.as_slice() {
        [] => (0, None),
        [path] => match path.parse::<u64>() {
            // A bare index still needs a path.
            Ok(index) => (index, None),
            Err(_) => (0, Some(path.clone())),
        },
        [index, rest @ ..] => match index.parse::<u64>() {
            Ok(index) => (index, Some(rest.join(" "))),
            Err(_) => (0, Some(parts.join(" "))),
        },
    }
}

pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::new("noop", text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let remainder = &slash_tail[command_len..];
            let arg = if remainder.is_empty() {
                ""
            } else {
                remainder.trim()
            };

            if let Some(spec) = find_setting(&command, TEXT_SETTING_COMMANDS) {
                let mut intent = Intent::new(spec.action, text);
                let value = if arg.is_empty() {
                    Value::Null
                } else {
                    Value::String(arg.to_string())
                };
                intent.settings_update.insert(spec.key.to_string(), value);
                return intent;
            }

            if let Some(spec) = find_setting(&command, NUMERIC_SETTING_COMMANDS) {
                let mut intent = Intent::new(spec.action, text);
                let value = parse_number_arg(arg).map(Value::Number).unwrap_or(Value::Null);
                intent.settings_update.insert(spec.key.to_string(), value);
                return intent;
            }

            if let Some(spec) = find_setting(&command, TOGGLE_COMMANDS) {
                let mut intent = Intent::new(spec.action, text);
                let value = parse_toggle_arg(arg).map(Value::Bool).unwrap_or(Value::Null);
                intent.settings_update.insert(spec.key.to_string(), value);
                return intent;
            }

            if command == REFINE_COMMAND.command {
                let mut intent = Intent::new(REFINE_COMMAND.action, text);
                intent.prompt = if arg.is_empty() {
                    None
                } else {
                    Some(arg.to_string())
                };
                return intent;
            }

            if command == SAVE_COMMAND.command {
                let (index, path) = parse_save_args(arg);
                let mut intent = Intent::new(SAVE_COMMAND.action, text);
                intent
                    .command_args
                    .insert("index".to_string(), Value::Number(index.into()));
                intent.command_args.insert(
                    "path".to_string(),
                    path.map(Value::String).unwrap_or(Value::Null),
                );
                return intent;
            }

            if let Some(action) = find_command(&command, NO_ARG_COMMANDS) {
                return Intent::new(action, text);
            }

            let mut intent = Intent::new("unknown", text);
            intent
                .command_args
                .insert("command".to_string(), Value::String(command));
            intent
                .command_args
                .insert("arg".to_string(), Value::String(arg.to_string()));
            return intent;
        }
    }

    let mut intent = Intent::new("generate", text);
    intent.prompt = Some(raw_trimmed.to_string());
    intent
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::parse_intent;

    #[test]
    fn plain_text_generates() {
        let intent = parse_intent("  a serene landscape at sunset  ");
        assert_eq!(intent.action, "generate");
        assert_eq!(intent.prompt.as_deref(), Some("a serene landscape at sunset"));
    }

    #[test]
    fn empty_input_is_noop() {
        assert_eq!(parse_intent("   ").action, "noop");
    }

    #[test]
    fn parse_text_settings() {
        let style = parse_intent("/style photorealistic");
        assert_eq!(style.action, "set_style");
        assert_eq!(style.settings_update["style"], json!("photorealistic"));

        let model = parse_intent("/model black-forest-labs/FLUX.1-dev");
        assert_eq!(model.action, "set_model");
        assert_eq!(
            model.settings_update["model"],
            json!("black-forest-labs/FLUX.1-dev")
        );

        let negative = parse_intent("/negative blurry, low quality");
        assert_eq!(negative.action, "set_negative");
        assert_eq!(
            negative.settings_update["negative_prompt"],
            json!("blurry, low quality")
        );

        let cleared = parse_intent("/negative");
        assert_eq!(cleared.settings_update["negative_prompt"], json!(null));

        let size = parse_intent("/size 512x768");
        assert_eq!(size.action, "set_size");
        assert_eq!(size.settings_update["size"], json!("512x768"));
    }

    #[test]
    fn parse_numeric_settings() {
        let guidance = parse_intent("/guidance 12.5");
        assert_eq!(guidance.action, "set_guidance");
        assert_eq!(guidance.settings_update["guidance_scale"], json!(12.5));

        let steps = parse_intent("/steps 8");
        assert_eq!(steps.action, "set_steps");
        assert_eq!(steps.settings_update["steps"], json!(8));

        let bad = parse_intent("/steps lots");
        assert_eq!(bad.settings_update["steps"], json!(null));
    }

    #[test]
    fn parse_toggles() {
        let on = parse_intent("/realism");
        assert_eq!(on.action, "set_realism");
        assert_eq!(on.settings_update["ultra_realism"], json!(true));

        let off = parse_intent("/realism off");
        assert_eq!(off.settings_update["ultra_realism"], json!(false));

        let details = parse_intent("/details no");
        assert_eq!(details.action, "set_details");
        assert_eq!(details.settings_update["add_details"], json!(false));

        let quality = parse_intent("/quality ON");
        assert_eq!(quality.settings_update["add_quality"], json!(true));

        let invalid = parse_intent("/realism sideways");
        assert_eq!(invalid.settings_update["ultra_realism"], json!(null));
    }

    #[test]
    fn parse_refine() {
        let intent = parse_intent("/refine make the colors more vibrant");
        assert_eq!(intent.action, "refine");
        assert_eq!(intent.prompt.as_deref(), Some("make the colors more vibrant"));

        let bare = parse_intent("/refine");
        assert_eq!(bare.action, "refine");
        assert!(bare.prompt.is_none());
    }

    #[test]
    fn parse_save_with_index_and_quoted_path() {
        let latest = parse_intent("/save out.png");
        assert_eq!(latest.action, "save");
        assert_eq!(latest.command_args["index"], json!(0));
        assert_eq!(latest.command_args["path"], json!("out.png"));

        let indexed = parse_intent("/save 3 \"/tmp/my image.png\"");
        assert_eq!(indexed.command_args["index"], json!(3));
        assert_eq!(indexed.command_args["path"], json!("/tmp/my image.png"));

        let missing_path = parse_intent("/save 2");
        assert_eq!(missing_path.command_args["index"], json!(2));
        assert_eq!(missing_path.command_args["path"], json!(null));
    }

    #[test]
    fn parse_no_arg_commands() {
        assert_eq!(parse_intent("/history").action, "show_history");
        assert_eq!(parse_intent("/clear").action, "clear_history");
        assert_eq!(parse_intent("/styles").action, "list_styles");
        assert_eq!(parse_intent("/help").action, "help");
        assert_eq!(parse_intent("/quit").action, "quit");
        assert_eq!(parse_intent("/exit").action, "quit");
    }

    #[test]
    fn parse_unknown_command() {
        let intent = parse_intent("/magic foo bar");
        assert_eq!(intent.action, "unknown");
        assert_eq!(intent.command_args["command"], json!("magic"));
        assert_eq!(intent.command_args["arg"], json!("foo bar"));
    }
}
