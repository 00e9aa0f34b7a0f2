//! In-process [`MessageContext`] backed by built-in English templates,
//! optional overrides and a static permission-label table.

use std::collections::HashMap;

use regex::{Captures, Regex};

use super::{LookupError, MessageContext, MessageKey};

/// Substitutes positional `{n}` placeholders.
#[derive(Debug, Clone)]
pub struct TemplateFormatter {
    placeholder: Regex,
}

impl Default for TemplateFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateFormatter {
    pub fn new() -> Self {
        Self {
            placeholder: Regex::new(r"\{(\d+)\}").expect("placeholder pattern is valid"),
        }
    }

    /// Replaces `{n}` with `args[n]`. Placeholders without an argument are
    /// left as they are.
    pub fn format(&self, template: &str, args: &[&str]) -> String {
        self.placeholder
            .replace_all(template, |caps: &Captures<'_>| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| args.get(index))
                    .map(|arg| arg.to_string())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Message context for applications that ship their texts with the binary.
#[derive(Debug, Clone, Default)]
pub struct LocalContext {
    overrides: HashMap<MessageKey, String>,
    permissions: HashMap<String, String>,
    formatter: TemplateFormatter,
}

impl LocalContext {
    /// Creates a context with the built-in English templates and no known
    /// permissions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the template for `key`.
    pub fn with_template(mut self, key: MessageKey, template: impl Into<String>) -> Self {
        self.overrides.insert(key, template.into());
        self
    }

    /// Registers the label shown for a permission identifier.
    pub fn with_permission_label(
        mut self,
        permission: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        self.permissions.insert(permission.into(), label.into());
        self
    }

    /// The template currently used for `key`.
    pub fn template(&self, key: MessageKey) -> &str {
        self.overrides
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.default_template())
    }
}

impl MessageContext for LocalContext {
    fn text(&self, key: MessageKey, args: &[&str]) -> String {
        let text = self.formatter.format(self.template(key), args);
        if text.trim().is_empty() {
            // A blank override must not blank out the user-facing message.
            return self.formatter.format(key.default_template(), args);
        }
        text
    }

    fn permission_label(&self, permission: &str) -> Result<String, LookupError> {
        self.permissions
            .get(permission)
            .cloned()
            .ok_or_else(|| LookupError::UnknownPermission(permission.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_positional_arguments() {
        let formatter = TemplateFormatter::new();
        assert_eq!(formatter.format("{1} before {0}", &["a", "b"]), "b before a");
    }

    #[test]
    fn test_format_keeps_missing_placeholders() {
        let formatter = TemplateFormatter::new();
        assert_eq!(formatter.format("x={0} y={3}", &["1"]), "x=1 y={3}");
    }

    #[test]
    fn test_default_template_text() {
        let context = LocalContext::new();
        assert_eq!(
            context.text(MessageKey::ExceptionOfType, &["IoError"]),
            "exception of type IoError"
        );
    }

    #[test]
    fn test_override_template() {
        let context =
            LocalContext::new().with_template(MessageKey::RateLimited, "Langsamer bitte!");
        assert_eq!(context.text(MessageKey::RateLimited, &[]), "Langsamer bitte!");
        assert_eq!(
            context.text(MessageKey::NotFound, &[]),
            MessageKey::NotFound.default_template()
        );
    }

    #[test]
    fn test_blank_override_falls_back_to_default() {
        let context = LocalContext::new().with_template(MessageKey::Internal, "   ");
        assert_eq!(
            context.text(MessageKey::Internal, &[]),
            MessageKey::Internal.default_template()
        );
    }

    #[test]
    fn test_permission_label_lookup() {
        let context = LocalContext::new().with_permission_label("android.permission.CAMERA", "Camera");
        assert_eq!(
            context.permission_label("android.permission.CAMERA"),
            Ok("Camera".to_string())
        );
        assert_eq!(
            context.permission_label("android.permission.NFC"),
            Err(LookupError::UnknownPermission("android.permission.NFC".to_string()))
        );
    }
}
