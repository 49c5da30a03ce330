//! Pure validation for theme tokens and the legacy flat theme object.
//!
//! Only the `ref.palette.*` and `comp.layout.*` token paths are inspected;
//! full schema coverage is intentionally out of scope and unrecognized
//! sub-paths pass through untouched.

use std::fmt;

use serde_json::{Map, Value};

/// Flat theme fields that must be expressed as theme tokens instead, paired
/// with the remediation to surface.
const LEGACY_THEME_FIELDS: [(&str, &str); 8] = [
    ("name", "Theme names should not be set in the theme object"),
    ("primaryColor", "Use themeTokens.ref.palette.primary50 instead"),
    (
        "secondaryColor",
        "Use themeTokens.ref.palette.supportOne50 instead",
    ),
    (
        "backgroundColor",
        "Use themeTokens.comp.layout.backgroundColor instead",
    ),
    ("textColor", "Use themeTokens.comp.layout.textColor instead"),
    ("fontColor", "Use themeTokens.comp.layout.textColor instead"),
    (
        "headerColor",
        "Use themeTokens.comp.layout.backgroundColor instead",
    ),
    (
        "bodyColor",
        "Use themeTokens.comp.layout.backgroundColor instead",
    ),
];

/// A denied legacy theme field and its token-path replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyField {
    pub name: &'static str,
    pub suggestion: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeError {
    InvalidColor { field: String, value: String },
    LegacyFields(Vec<LegacyField>),
}

impl fmt::Display for ThemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidColor { field, value } => {
                write!(f, "invalid hex color for {field}: '{value}' (expected #RRGGBB)")
            }
            Self::LegacyFields(fields) => {
                let names: Vec<&str> = fields.iter().map(|field| field.name).collect();
                writeln!(
                    f,
                    "unsupported fields in theme object: {}",
                    names.join(", ")
                )?;
                writeln!(f, "Move these to themeTokens instead:")?;
                for field in fields {
                    writeln!(f, "- {}: {}", field.name, field.suggestion)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ThemeError {}

/// Whether a value is a `#RRGGBB` hex color.
#[must_use]
pub fn validate_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validates the recognized token paths, failing on the first non-empty leaf
/// that is not a hex color.
///
/// # Errors
/// Returns [`ThemeError::InvalidColor`] with the field-qualified path.
pub fn validate_theme_tokens(tokens: &Value) -> Result<(), ThemeError> {
    check_color_group(tokens, &["ref", "palette"], "ref.palette")?;
    check_color_group(tokens, &["comp", "layout"], "comp.layout")
}

fn check_color_group(tokens: &Value, path: &[&str], prefix: &str) -> Result<(), ThemeError> {
    let mut node = tokens;
    for segment in path {
        let Some(next) = node.get(segment) else {
            return Ok(());
        };
        node = next;
    }
    let Some(entries) = node.as_object() else {
        return Ok(());
    };
    for (key, value) in entries {
        if let Some(color) = value.as_str() {
            if !color.is_empty() && !validate_hex_color(color) {
                return Err(ThemeError::InvalidColor {
                    field: format!("{prefix}.{key}"),
                    value: color.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Rejects legacy flat theme fields, collecting every denied field present.
///
/// # Errors
/// Returns [`ThemeError::LegacyFields`] naming each field and its
/// `themeTokens` replacement.
pub fn validate_legacy_theme(theme: &Map<String, Value>) -> Result<(), ThemeError> {
    let found: Vec<LegacyField> = LEGACY_THEME_FIELDS
        .iter()
        .filter(|(name, _)| theme.contains_key(*name))
        .map(|&(name, suggestion)| LegacyField { name, suggestion })
        .collect();
    if found.is_empty() {
        Ok(())
    } else {
        Err(ThemeError::LegacyFields(found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_six_digit_hex_colors() {
        assert!(validate_hex_color("#ABC123"));
        assert!(validate_hex_color("#ffffff"));
        assert!(validate_hex_color("#000000"));
    }

    #[test]
    fn rejects_malformed_hex_colors() {
        assert!(!validate_hex_color("ABC123"));
        assert!(!validate_hex_color("#abc12"));
        assert!(!validate_hex_color("#abc1234"));
        assert!(!validate_hex_color("#GGGGGG"));
        assert!(!validate_hex_color(""));
    }

    #[test]
    fn validates_palette_and_layout_leaves() {
        let tokens = json!({
            "ref": { "palette": { "primary50": "#888888" } },
            "comp": { "layout": { "backgroundColor": "#f0f0f0" } },
        });
        assert_eq!(validate_theme_tokens(&tokens), Ok(()));
    }

    #[test]
    fn reports_field_qualified_palette_violation() {
        let tokens = json!({ "ref": { "palette": { "primary50": "not-a-color" } } });
        let err = validate_theme_tokens(&tokens).expect_err("should fail");
        assert_eq!(
            err,
            ThemeError::InvalidColor {
                field: "ref.palette.primary50".to_string(),
                value: "not-a-color".to_string(),
            }
        );
    }

    #[test]
    fn reports_field_qualified_layout_violation() {
        let tokens = json!({ "comp": { "layout": { "textColor": "#12" } } });
        let err = validate_theme_tokens(&tokens).expect_err("should fail");
        assert!(matches!(err, ThemeError::InvalidColor { field, .. } if field == "comp.layout.textColor"));
    }

    #[test]
    fn ignores_unrecognized_sub_paths_and_empty_leaves() {
        let tokens = json!({
            "ref": { "typography": { "fontFamily": "monospace" } },
            "comp": { "layout": { "textColor": "" } },
            "sys": { "anything": "goes" },
        });
        assert_eq!(validate_theme_tokens(&tokens), Ok(()));
    }

    #[test]
    fn rejects_legacy_primary_color_with_token_suggestion() {
        let theme = json!({ "primaryColor": "#888888" });
        let theme = theme.as_object().expect("object").clone();
        let err = validate_legacy_theme(&theme).expect_err("should fail");
        let message = err.to_string();
        assert!(message.contains("primaryColor"));
        assert!(message.contains("themeTokens.ref.palette.primary50"));
    }

    #[test]
    fn collects_every_denied_field() {
        let theme = json!({
            "name": "Acme",
            "backgroundColor": "#ffffff",
            "sideBarColor": "#888888",
        });
        let theme = theme.as_object().expect("object").clone();
        let err = validate_legacy_theme(&theme).expect_err("should fail");
        let ThemeError::LegacyFields(fields) = err else {
            panic!("expected legacy-field error");
        };
        let names: Vec<&str> = fields.iter().map(|field| field.name).collect();
        assert_eq!(names, vec!["name", "backgroundColor"]);
    }

    #[test]
    fn accepts_theme_without_denied_fields() {
        let theme = json!({ "sideBarColor": "#888888" });
        let theme = theme.as_object().expect("object").clone();
        assert_eq!(validate_legacy_theme(&theme), Ok(()));
    }
}
