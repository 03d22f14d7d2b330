//! Localized result messages.
//!
//! The dispatcher only ever needs two strings per language: the message
//! reported when there is nobody to send to, and the prefix written in
//! front of every failed address.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// The message table for a single language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleMessages {
    /// Reported when `send()` is called without recipients.
    pub no_recipients: String,
    /// Written before the address of every failed recipient.
    pub error_sending: String,
}

impl LocaleMessages {
    pub fn new(no_recipients: impl Into<String>, error_sending: impl Into<String>) -> Self {
        Self {
            no_recipients: no_recipients.into(),
            error_sending: error_sending.into(),
        }
    }

    fn validate(&self, language: &str) -> Result<(), DispatchError> {
        if self.no_recipients.trim().is_empty() {
            return Err(DispatchError::Configuration(format!(
                "locale `{language}` has an empty `no_recipients` message"
            )));
        }
        if self.error_sending.trim().is_empty() {
            return Err(DispatchError::Configuration(format!(
                "locale `{language}` has an empty `error_sending` message"
            )));
        }
        Ok(())
    }
}

/// Message tables keyed by language tag.
///
/// Ships with Spanish (`es`) and English (`en`); configuration can add
/// languages or replace the built-in strings.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: BTreeMap<String, LocaleMessages>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The built-in `es` and `en` tables.
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            "es".to_owned(),
            LocaleMessages::new("¡No hay destinatarios!", "Error al enviar email a: "),
        );
        entries.insert(
            "en".to_owned(),
            LocaleMessages::new("There are no recipients!", "Error sending the email to: "),
        );
        Self { entries }
    }

    /// The built-in tables with `overrides` layered on top.
    pub fn with_overrides<'a>(
        overrides: impl IntoIterator<Item = (&'a String, &'a LocaleMessages)>,
    ) -> Self {
        let mut catalog = Self::builtin();
        for (language, messages) in overrides {
            catalog.insert(language.clone(), messages.clone());
        }
        catalog
    }

    pub fn insert(&mut self, language: impl Into<String>, messages: LocaleMessages) {
        self.entries.insert(language.into(), messages);
    }

    pub fn get(&self, language: &str) -> Option<&LocaleMessages> {
        self.entries.get(language)
    }

    /// Known language tags, sorted.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Look up `language` and check that both of its messages are usable.
    pub fn resolve(&self, language: &str) -> Result<&LocaleMessages, DispatchError> {
        let messages = self.get(language).ok_or_else(|| {
            let known = self.languages().collect::<Vec<_>>().join(", ");
            DispatchError::Configuration(format!(
                "unknown language `{language}` (known: {known})"
            ))
        })?;
        messages.validate(language)?;
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_languages_are_distinct() {
        let catalog = Catalog::builtin();
        let es = catalog.resolve("es").unwrap();
        let en = catalog.resolve("en").unwrap();
        assert_eq!(es.no_recipients, "¡No hay destinatarios!");
        assert_eq!(es.error_sending, "Error al enviar email a: ");
        assert_eq!(en.no_recipients, "There are no recipients!");
        assert_eq!(en.error_sending, "Error sending the email to: ");
        assert_ne!(es, en);
    }

    #[test]
    fn unknown_language_lists_known_ones() {
        let err = Catalog::builtin().resolve("xx").unwrap_err();
        assert!(matches!(err, DispatchError::Configuration(_)));
        let message = err.to_string();
        assert!(message.contains("`xx`"));
        assert!(message.contains("en, es"));
    }

    #[test]
    fn overrides_replace_and_extend() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            "en".to_owned(),
            LocaleMessages::new("Nobody to send to", "Could not send to: "),
        );
        overrides.insert(
            "fr".to_owned(),
            LocaleMessages::new("Aucun destinataire !", "Erreur d'envoi à : "),
        );
        let catalog = Catalog::with_overrides(&overrides);
        assert_eq!(catalog.resolve("en").unwrap().no_recipients, "Nobody to send to");
        assert_eq!(catalog.resolve("fr").unwrap().error_sending, "Erreur d'envoi à : ");
        assert_eq!(
            catalog.resolve("es").unwrap().no_recipients,
            "¡No hay destinatarios!"
        );
        assert_eq!(catalog.languages().collect::<Vec<_>>(), ["en", "es", "fr"]);
    }

    #[test]
    fn empty_messages_are_rejected() {
        let mut catalog = Catalog::builtin();
        catalog.insert("blank", LocaleMessages::new("  ", "Error: "));
        let err = catalog.resolve("blank").unwrap_err();
        assert!(err.to_string().contains("no_recipients"));

        catalog.insert("half", LocaleMessages::new("None!", ""));
        let err = catalog.resolve("half").unwrap_err();
        assert!(err.to_string().contains("error_sending"));
    }

    #[test]
    fn locale_messages_deserialize_requires_both_keys() {
        let ok: LocaleMessages =
            toml::from_str("no_recipients = \"a\"\nerror_sending = \"b\"").unwrap();
        assert_eq!(ok, LocaleMessages::new("a", "b"));
        assert!(toml::from_str::<LocaleMessages>("no_recipients = \"a\"").is_err());
    }
}
