use std::{collections::HashMap, path::Path};

use tokio::fs;

use super::Localizer;
use crate::error::ContentError;

const FALLBACK_LANGUAGE: &str = "en";

const BUILTIN_CATALOGUES: [(&str, &str); 2] = [
    ("en", include_str!("../../locales/en.json")),
    ("id", include_str!("../../locales/id.json")),
];

/// Message catalogues loaded from `<lang>.json` files
#[derive(Debug, Default)]
pub struct JsonLocalizer {
    catalogues: HashMap<String, HashMap<String, String>>,
}

impl JsonLocalizer {
    /// Catalogues compiled into the binary
    pub fn builtin() -> Self {
        let mut localizer = Self::default();
        for (lang, raw) in BUILTIN_CATALOGUES {
            match serde_json::from_str(raw) {
                Ok(catalogue) => {
                    localizer.catalogues.insert(lang.to_string(), catalogue);
                }
                Err(e) => tracing::error!("Built-in catalogue {} is invalid: {}", lang, e),
            }
        }
        localizer
    }

    /// Load every `*.json` file in `dir`; the file stem is the language tag
    pub async fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ContentError> {
        let dir = dir.as_ref();
        let mut localizer = Self::default();
        let mut entries = fs::read_dir(dir).await.map_err(|source| ContentError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        while let Some(entry) = entries.next_entry().await.map_err(|source| ContentError::Io {
            path: dir.display().to_string(),
            source,
        })? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(lang) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let raw = fs::read_to_string(&path)
                .await
                .map_err(|source| ContentError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
            let catalogue: HashMap<String, String> =
                serde_json::from_str(&raw).map_err(|source| ContentError::Parse {
                    path: path.display().to_string(),
                    source,
                })?;
            tracing::info!("Loaded language file: {}", path.display());
            localizer.catalogues.insert(lang, catalogue);
        }

        if localizer.catalogues.is_empty() {
            return Err(ContentError::Empty(dir.display().to_string()));
        }
        Ok(localizer)
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self.catalogues.keys().map(String::as_str).collect();
        langs.sort_unstable();
        langs
    }
}

impl Localizer for JsonLocalizer {
    fn get(&self, lang: &str, key: &str) -> String {
        [lang, FALLBACK_LANGUAGE]
            .iter()
            .filter_map(|l| self.catalogues.get(*l))
            .find_map(|catalogue| catalogue.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

/// Substitute `{name}` placeholders in one pass; values are never rescanned
pub fn render(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            args.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escape text for HTML-formatted messages
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalogues_share_keys() {
        let localizer = JsonLocalizer::builtin();
        assert_eq!(localizer.languages(), vec!["en", "id"]);
        let en = &localizer.catalogues["en"];
        let id = &localizer.catalogues["id"];
        for key in en.keys() {
            assert!(id.contains_key(key), "id catalogue is missing {}", key);
        }
    }

    #[test]
    fn test_lookup_falls_back_to_english_then_key() {
        let localizer = JsonLocalizer::builtin();
        assert_eq!(
            localizer.get("fr", "guess_time_warning"),
            localizer.get("en", "guess_time_warning")
        );
        assert_eq!(localizer.get("en", "no_such_key"), "no_such_key");
    }

    #[test]
    fn test_render_replaces_every_occurrence() {
        let text = render("{name} vs {name} in round {round}", &[("name", "Ana"), ("round", "2")]);
        assert_eq!(text, "Ana vs Ana in round 2");
    }

    #[test]
    fn test_render_does_not_expand_values() {
        let text = render("{name}: {points}", &[("name", "{points}"), ("points", "5")]);
        assert_eq!(text, "{points}: 5");
        assert_eq!(render("{unknown} {", &[("name", "Ana")]), "{unknown} {");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>Tom & \"Jerry\"</b>"), "&lt;b&gt;Tom &amp; &#34;Jerry&#34;&lt;/b&gt;");
    }

    #[tokio::test]
    async fn test_load_dir_reports_missing_directory() {
        let result = JsonLocalizer::load_dir("/nonexistent/locales").await;
        assert!(matches!(result, Err(ContentError::Io { .. })));
    }
}
