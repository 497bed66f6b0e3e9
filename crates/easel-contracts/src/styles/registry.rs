use std::env;
use std::fs;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde_json::Value;

const DEFAULT_STYLES_JSON: &str = include_str!("../../resources/default_styles.json");

/// Style identifier meaning "use the prompt as-is". Not part of the table.
pub const STYLE_NONE: &str = "none";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylePreset {
    pub id: String,
    pub label: String,
    pub suffix: String,
    pub anatomy_suffix: Option<String>,
}

/// Data-driven mapping from style identifier to prompt suffix, loaded once at
/// startup. Adding a style is a data change, not a code change.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    styles: IndexMap<String, StylePreset>,
}

impl StyleRegistry {
    pub fn new(styles: Option<IndexMap<String, StylePreset>>) -> Self {
        Self {
            styles: styles.unwrap_or_else(default_styles),
        }
    }

    /// Compiled-in table merged with `~/.easel/styles_overrides.json` when
    /// that file exists and parses.
    pub fn load() -> Self {
        let mut styles = default_styles();
        if let Some(path) = styles_override_path() {
            if let Ok(raw) = fs::read_to_string(path) {
                merge_style_rows(&mut styles, &raw);
            }
        }
        Self { styles }
    }

    pub fn get(&self, id: &str) -> Option<&StylePreset> {
        self.styles.get(id)
    }

    /// Case-insensitive lookup by identifier or display label.
    pub fn resolve(&self, raw: &str) -> Option<&StylePreset> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lowered = trimmed.to_ascii_lowercase();
        let normalized = normalize_style_key(trimmed);
        self.styles.values().find(|preset| {
            preset.id == lowered
                || preset.label.eq_ignore_ascii_case(trimmed)
                || preset.id == normalized
        })
    }

    pub fn list(&self) -> impl Iterator<Item = &StylePreset> {
        self.styles.values()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

fn normalize_style_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.trim().to_ascii_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

fn styles_override_path() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(".easel").join("styles_overrides.json"))
}

fn default_styles() -> IndexMap<String, StylePreset> {
    let mut styles = IndexMap::new();
    merge_style_rows(&mut styles, DEFAULT_STYLES_JSON);
    styles
}

fn merge_style_rows(styles: &mut IndexMap<String, StylePreset>, raw: &str) {
    let Ok(payload) = serde_json::from_str::<Value>(raw) else {
        return;
    };
    let Some(table) = payload.as_object() else {
        return;
    };
    for (style_id, row_value) in table {
        let Some(row) = row_value.as_object() else {
            continue;
        };
        let Some(suffix) = row
            .get("suffix")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
        else {
            continue;
        };
        let label = row
            .get("label")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(style_id)
            .to_string();
        let anatomy_suffix = row
            .get("anatomy_suffix")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let id = style_id.trim().to_ascii_lowercase();
        styles.insert(
            id.clone(),
            StylePreset {
                id,
                label,
                suffix: suffix.to_string(),
                anatomy_suffix,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::{merge_style_rows, StylePreset, StyleRegistry};

    #[test]
    fn default_table_carries_the_known_styles() {
        let registry = StyleRegistry::new(None);
        for id in [
            "photorealistic",
            "digital-art",
            "oil-painting",
            "watercolor",
            "3d-render",
            "anime",
            "sketch",
            "cinematic",
            "fantasy",
        ] {
            assert!(registry.get(id).is_some(), "missing style '{id}'");
        }
    }

    #[test]
    fn photorealistic_has_anatomy_suffix() {
        let registry = StyleRegistry::new(None);
        let preset = registry.get("photorealistic").unwrap();
        assert!(preset.suffix.contains("RAW photo"));
        let anatomy = preset.anatomy_suffix.as_deref().unwrap_or_default();
        assert!(anatomy.contains("skin pores"));
    }

    #[test]
    fn resolve_matches_id_and_label_case_insensitively() {
        let registry = StyleRegistry::new(None);
        assert_eq!(registry.resolve("PHOTOREALISTIC").unwrap().id, "photorealistic");
        assert_eq!(registry.resolve("Anime/Manga").unwrap().id, "anime");
        assert_eq!(registry.resolve("digital art").unwrap().id, "digital-art");
        assert!(registry.resolve("vaporwave").is_none());
        assert!(registry.resolve("").is_none());
    }

    #[test]
    fn merge_adds_and_replaces_rows() {
        let mut styles: IndexMap<String, StylePreset> = IndexMap::new();
        merge_style_rows(
            &mut styles,
            r#"{"pixel-art": {"label": "Pixel Art", "suffix": "pixel art, 16-bit"}}"#,
        );
        assert_eq!(styles["pixel-art"].label, "Pixel Art");

        merge_style_rows(
            &mut styles,
            r#"{"pixel-art": {"suffix": "pixel art, 8-bit"}}"#,
        );
        assert_eq!(styles["pixel-art"].suffix, "pixel art, 8-bit");
        assert_eq!(styles.len(), 1);
    }

    #[test]
    fn merge_skips_rows_without_a_suffix() {
        let mut styles: IndexMap<String, StylePreset> = IndexMap::new();
        merge_style_rows(&mut styles, r#"{"broken": {"label": "Broken"}}"#);
        assert!(styles.is_empty());
    }

    #[test]
    fn merge_tolerates_invalid_json() {
        let mut styles: IndexMap<String, StylePreset> = IndexMap::new();
        merge_style_rows(&mut styles, "not json at all");
        assert!(styles.is_empty());
    }
}
