// File: form.rs
// Location: /src/form.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::FormError;
use crate::schema::{ContentKind, ErrorLevel, ExportFormat, FieldType, QrMode};

pub const DEFAULT_DARK: &str = "#000000";
pub const DEFAULT_LIGHT: &str = "#FFFFFF";
pub const DEFAULT_SCALE: u32 = 2;
pub const DEFAULT_BORDER: u32 = 1;

/// A single extracted field value. Coordinates are stored as numbers,
/// everything else as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Number(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(text) => f.write_str(text),
        }
    }
}

pub type KindValues = BTreeMap<&'static str, FieldValue>;
pub type FieldValues = BTreeMap<ContentKind, KindValues>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub error: ErrorLevel,
    #[serde(default)]
    pub boost_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub dark: String,
    pub light: String,
    pub scale: u32,
    pub border: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_light: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiscOptions {
    pub qrcode_format: QrMode,
    pub active_tab: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_format: Option<ExportFormat>,
}

/// Every value the form holds, for all content kinds at once.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub active_kind: ContentKind,
    pub mode: QrMode,
    pub error_level: ErrorLevel,
    pub scale: u32,
    pub border: u32,
    pub dark: String,
    pub light: String,
    pub data_dark: String,
    pub data_light: String,
    pub export_format: ExportFormat,
    fields: BTreeMap<ContentKind, BTreeMap<&'static str, String>>,
}

impl Default for FormState {
    fn default() -> Self {
        let fields = ContentKind::ALL
            .into_iter()
            .map(|kind| {
                let values = kind
                    .fields()
                    .iter()
                    .map(|spec| (spec.name, String::new()))
                    .collect();
                (kind, values)
            })
            .collect();

        Self {
            active_kind: ContentKind::Generic,
            mode: QrMode::Standard,
            error_level: ErrorLevel::Medium,
            scale: DEFAULT_SCALE,
            border: DEFAULT_BORDER,
            dark: DEFAULT_DARK.to_string(),
            light: DEFAULT_LIGHT.to_string(),
            data_dark: DEFAULT_DARK.to_string(),
            data_light: DEFAULT_LIGHT.to_string(),
            export_format: ExportFormat::Png,
            fields,
        }
    }
}

impl FormState {
    pub fn field(&self, kind: ContentKind, name: &str) -> &str {
        self.fields
            .get(&kind)
            .and_then(|values| values.get(name))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Returns false when `name` is not a field of `kind`.
    pub fn set_field(&mut self, kind: ContentKind, name: &str, value: impl Into<String>) -> bool {
        let Some(spec) = kind.field(name) else {
            return false;
        };
        self.fields
            .entry(kind)
            .or_default()
            .insert(spec.name, value.into());
        true
    }

    pub fn clear_kind(&mut self, kind: ContentKind) {
        if let Some(values) = self.fields.get_mut(&kind) {
            values.values_mut().for_each(String::clear);
        }
    }
}

fn color_or(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

pub fn extract_options(state: &FormState) -> (GenerationOptions, RenderOptions, MiscOptions) {
    let make_opts = GenerationOptions {
        error: state.error_level,
        boost_error: false,
    };

    let mut export_opts = RenderOptions {
        dark: color_or(&state.dark, DEFAULT_DARK),
        light: color_or(&state.light, DEFAULT_LIGHT),
        scale: state.scale,
        border: state.border,
        data_dark: None,
        data_light: None,
    };

    if state.export_format.supports_data_colors() {
        export_opts.data_dark = Some(color_or(&state.data_dark, DEFAULT_DARK));
        export_opts.data_light = Some(color_or(&state.data_light, DEFAULT_LIGHT));
    }

    let misc_opts = MiscOptions {
        qrcode_format: state.mode,
        active_tab: state.active_kind.name().to_string(),
        export_format: Some(state.export_format),
    };

    (make_opts, export_opts, misc_opts)
}

/// Collects the non-empty values of every content kind. Float fields are
/// parsed here, so a bad coordinate anywhere fails the whole extraction.
pub fn extract_field_values(state: &FormState) -> Result<FieldValues, FormError> {
    let mut data = FieldValues::new();
    for kind in ContentKind::ALL {
        let mut values = KindValues::new();
        for spec in kind.fields() {
            let raw = state.field(kind, spec.name);
            if raw.is_empty() {
                continue;
            }
            let value = match spec.field_type {
                FieldType::Float => {
                    let number = raw.trim().parse::<f64>().map_err(|source| {
                        FormError::InvalidNumber {
                            kind,
                            field: spec.name,
                            value: raw.to_string(),
                            source,
                        }
                    })?;
                    // inf and NaN have no JSON form
                    if !number.is_finite() {
                        return Err(FormError::NonFiniteNumber {
                            kind,
                            field: spec.name,
                            value: raw.to_string(),
                        });
                    }
                    FieldValue::Number(number)
                }
                FieldType::Text => FieldValue::Text(raw.to_string()),
            };
            values.insert(spec.name, value);
        }
        data.insert(kind, values);
    }
    Ok(data)
}
