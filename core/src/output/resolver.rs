use std::collections::BTreeMap;

use raidwatch_types::{Lang, LocaleText};
use serde::{Deserialize, Serialize};

use super::{OutputError, library};

/// A trigger's own output strings: key → localized template.
///
/// Templates may contain `${name}` placeholders filled at format time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputStrings {
    entries: BTreeMap<String, LocaleText>,
}

impl OutputStrings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, key: impl Into<String>, text: impl Into<LocaleText>) -> Self {
        self.insert(key, text);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<LocaleText>) {
        self.entries.insert(key.into(), text.into());
    }

    pub fn get(&self, key: &str) -> Option<&LocaleText> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves output keys to display text for one trigger in one language.
///
/// Lookup order: the trigger's own strings, then the shared library.
#[derive(Debug, Clone, Copy)]
pub struct Output<'a> {
    lang: Lang,
    strings: &'a OutputStrings,
}

impl<'a> Output<'a> {
    pub fn new(lang: Lang, strings: &'a OutputStrings) -> Self {
        Self { lang, strings }
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    pub fn has(&self, key: &str) -> bool {
        self.strings.get(key).is_some() || library::contains(key)
    }

    /// Resolve a key with no placeholders
    pub fn text(&self, key: &str) -> Result<String, OutputError> {
        self.format(key, &[])
    }

    /// Resolve a key and substitute `${name}` placeholders from `params`
    pub fn format(&self, key: &str, params: &[(&str, &str)]) -> Result<String, OutputError> {
        let template = self.template(key)?;
        substitute(key, template, params)
    }

    fn template(&self, key: &str) -> Result<&'a str, OutputError> {
        if let Some(text) = self.strings.get(key) {
            return Ok(text.get(self.lang));
        }
        library::get(key)
            .map(|text| text.get(self.lang))
            .ok_or_else(|| OutputError::MissingKey {
                key: key.to_string(),
            })
    }
}

/// Replace every `${token}` in `template`. Every token must have a param.
pub fn substitute(key: &str, template: &str, params: &[(&str, &str)]) -> Result<String, OutputError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| OutputError::UnterminatedPlaceholder {
                key: key.to_string(),
            })?;
        let token = &after[..end];
        let value = params
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, value)| *value)
            .ok_or_else(|| OutputError::UnresolvedPlaceholder {
                key: key.to_string(),
                token: token.to_string(),
            })?;
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Placeholder names referenced by a template, in order of appearance
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else { break };
        tokens.push(&after[..end]);
        rest = &after[end + 1..];
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings() -> OutputStrings {
        OutputStrings::new()
            .add(
                "clockPairs",
                LocaleText::new("Clock Pairs").with(Lang::De, "Uhrzeiger-Paare"),
            )
            .add("stackOn", LocaleText::new("Stack on ${player}"))
            .add("dirN", LocaleText::new("North!"))
    }

    #[test]
    fn resolves_trigger_strings_in_language() {
        let strings = strings();
        assert_eq!(Output::new(Lang::De, &strings).text("clockPairs").unwrap(), "Uhrzeiger-Paare");
        // No ja translation: English fallback
        assert_eq!(Output::new(Lang::Ja, &strings).text("clockPairs").unwrap(), "Clock Pairs");
    }

    #[test]
    fn trigger_strings_shadow_shared_library() {
        let strings = strings();
        let output = Output::new(Lang::En, &strings);
        assert_eq!(output.text("dirN").unwrap(), "North!");
        assert_eq!(output.text("dirSW").unwrap(), "SW");
    }

    #[test]
    fn substitutes_params() {
        let strings = strings();
        let output = Output::new(Lang::En, &strings);
        assert_eq!(
            output.format("stackOn", &[("player", "Tini")]).unwrap(),
            "Stack on Tini"
        );
        assert_eq!(
            output
                .format("tankBusterOnPlayer", &[("player", "Potato")])
                .unwrap(),
            "Tank Buster on Potato"
        );
    }

    #[test]
    fn missing_key_and_param_are_errors() {
        let strings = strings();
        let output = Output::new(Lang::En, &strings);
        assert_eq!(
            output.text("nope"),
            Err(OutputError::MissingKey { key: "nope".into() })
        );
        assert_eq!(
            output.text("stackOn"),
            Err(OutputError::UnresolvedPlaceholder {
                key: "stackOn".into(),
                token: "player".into()
            })
        );
    }

    #[test]
    fn placeholders_lists_tokens() {
        assert_eq!(placeholders("${a} and ${b}"), vec!["a", "b"]);
        assert!(placeholders("plain").is_empty());
    }
}
