// File: settings.rs
// Location: /src/settings.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::write_atomic;
use crate::error::SettingsError;
use crate::form::{self, FieldValue, FormState, GenerationOptions, MiscOptions, RenderOptions};
use crate::schema::{ContentKind, BORDER_RANGE, SCALE_RANGE};

pub const SOFTWARE_NAME: &str = "adw-qrcode";
pub const SOFTWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Software {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// On-disk form of the settings file. Keys unknown to this version are
/// ignored on import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDocument {
    pub software: Software,
    #[serde(default)]
    pub data: BTreeMap<String, BTreeMap<String, FieldValue>>,
    pub segno_make_opts: GenerationOptions,
    pub segno_export_opts: RenderOptions,
    pub misc_opts: MiscOptions,
}

impl SettingsDocument {
    pub fn from_state(state: &FormState) -> Result<Self, SettingsError> {
        let (segno_make_opts, segno_export_opts, misc_opts) = form::extract_options(state);
        let data = form::extract_field_values(state)?
            .into_iter()
            .map(|(kind, values)| {
                let values = values
                    .into_iter()
                    .map(|(name, value)| (name.to_string(), value))
                    .collect();
                (kind.name().to_string(), values)
            })
            .collect();

        Ok(Self {
            software: Software {
                name: SOFTWARE_NAME.to_string(),
                version: SOFTWARE_VERSION.to_string(),
            },
            data,
            segno_make_opts,
            segno_export_opts,
            misc_opts,
        })
    }

    /// Checks the identity tag before looking at anything else.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let found = value
            .get("software")
            .and_then(|software| software.get("name"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();
        if found != SOFTWARE_NAME {
            return Err(SettingsError::InvalidIdentity {
                expected: SOFTWARE_NAME,
                found: found.to_string(),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let opts = &self.segno_export_opts;
        if !SCALE_RANGE.contains(&opts.scale) {
            return Err(SettingsError::OutOfRange {
                field: "scale",
                value: opts.scale,
            });
        }
        if !BORDER_RANGE.contains(&opts.border) {
            return Err(SettingsError::OutOfRange {
                field: "border",
                value: opts.border,
            });
        }
        Ok(())
    }

    /// Writes the document into `state`. Nothing is changed on error.
    pub fn apply(&self, state: &mut FormState) -> Result<(), SettingsError> {
        self.validate()?;

        let mut updated = state.clone();
        updated.error_level = self.segno_make_opts.error;

        let export_opts = &self.segno_export_opts;
        updated.dark = export_opts.dark.clone();
        updated.light = export_opts.light.clone();
        updated.scale = export_opts.scale;
        updated.border = export_opts.border;
        if let Some(data_dark) = &export_opts.data_dark {
            updated.data_dark = data_dark.clone();
        }
        if let Some(data_light) = &export_opts.data_light {
            updated.data_light = data_light.clone();
        }

        updated.mode = self.misc_opts.qrcode_format;
        match ContentKind::from_name(&self.misc_opts.active_tab) {
            Some(kind) => updated.active_kind = kind,
            None => log::warn!("Ignoring unknown tab '{}'", self.misc_opts.active_tab),
        }
        if let Some(format) = self.misc_opts.export_format {
            updated.export_format = format;
        }

        for (kind_name, values) in &self.data {
            let Some(kind) = ContentKind::from_name(kind_name) else {
                log::debug!("Ignoring unknown content kind '{}'", kind_name);
                continue;
            };
            // Empty fields are never written, so absent means empty.
            updated.clear_kind(kind);
            for (name, value) in values {
                if !updated.set_field(kind, name, value.to_string()) {
                    log::debug!("Ignoring unknown field '{}' of {}", name, kind);
                }
            }
        }

        *state = updated;
        Ok(())
    }
}

/// Keeps the part of the chosen file name before its first dot and adds `.json`.
pub fn settings_path(chosen: &Path) -> PathBuf {
    let file_name = chosen
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or_default();
    let stem = if stem.is_empty() { "settings" } else { stem };
    chosen.with_file_name(format!("{}.json", stem))
}

/// Returns the path actually written.
pub fn export_settings(chosen: &Path, state: &FormState) -> Result<PathBuf, SettingsError> {
    let path = settings_path(chosen);
    let document = SettingsDocument::from_state(state)?;
    let json = serde_json::to_string_pretty(&document)?;
    write_atomic(&path, json.as_bytes()).map_err(|source| SettingsError::Write {
        path: path.clone(),
        source,
    })?;
    log::info!("Settings written to {}", path.display());
    Ok(path)
}

pub fn load_settings(path: &Path) -> Result<SettingsDocument, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    SettingsDocument::from_json(&content)
}

pub fn import_settings(path: &Path, state: &mut FormState) -> Result<(), SettingsError> {
    let document = load_settings(path)?;
    document.apply(state)?;
    log::info!(
        "Settings imported from {} (written by {} {})",
        path.display(),
        document.software.name,
        document.software.version
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormError;
    use crate::schema::{ErrorLevel, ExportFormat, FieldType, QrMode};

    fn populated_state() -> FormState {
        let mut state = FormState::default();
        for kind in ContentKind::ALL {
            for spec in kind.fields() {
                let value = match spec.field_type {
                    FieldType::Float => "-12.345678".to_string(),
                    FieldType::Text => format!("{} {}", kind, spec.name),
                };
                state.set_field(kind, spec.name, value);
            }
        }
        state.active_kind = ContentKind::Wifi;
        state.mode = QrMode::Micro;
        state.error_level = ErrorLevel::Quartile;
        state.scale = 7;
        state.border = 4;
        state.dark = "#112233".to_string();
        state.light = "#fafafa".to_string();
        state.data_dark = "#440000".to_string();
        state.data_light = "#eeeeff".to_string();
        state.export_format = ExportFormat::Svg;
        state
    }

    #[test]
    fn test_round_trip_restores_everything() {
        let dir = tempfile::tempdir().unwrap();
        let original = populated_state();
        let written = export_settings(&dir.path().join("qr"), &original).unwrap();
        assert_eq!(written, dir.path().join("qr.json"));

        let mut restored = FormState::default();
        import_settings(&written, &mut restored).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_round_trip_clears_fields_that_were_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut original = FormState::default();
        original.set_field(ContentKind::Generic, "content", "HELLO");
        let written = export_settings(&dir.path().join("qr.json"), &original).unwrap();

        let mut restored = populated_state();
        import_settings(&written, &mut restored).unwrap();
        assert_eq!(restored.field(ContentKind::Generic, "content"), "HELLO");
        assert_eq!(restored.field(ContentKind::VCard, "name"), "");
        assert_eq!(restored.export_format, ExportFormat::Png);
    }

    #[test]
    fn test_document_layout() {
        let mut state = FormState::default();
        state.set_field(ContentKind::Geo, "lat", "1.5");
        let document = SettingsDocument::from_state(&state).unwrap();
        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json["software"]["name"], SOFTWARE_NAME);
        assert_eq!(json["segno_make_opts"]["error"], "M");
        assert_eq!(json["segno_make_opts"]["boost_error"], false);
        assert_eq!(json["segno_export_opts"]["scale"], 2);
        assert_eq!(json["segno_export_opts"]["data_dark"], "#000000");
        assert_eq!(json["misc_opts"]["qrcode_format"], "Standard QR Code");
        assert_eq!(json["misc_opts"]["active_tab"], "Generic");
        assert_eq!(json["data"]["Geo"]["lat"], 1.5);
        assert!(json["data"]["Generic"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_pdf_export_omits_data_colors() {
        let mut state = FormState::default();
        state.export_format = ExportFormat::Pdf;
        let json = serde_json::to_value(SettingsDocument::from_state(&state).unwrap()).unwrap();
        assert!(json["segno_export_opts"].get("data_dark").is_none());
        assert!(json["segno_export_opts"].get("data_light").is_none());
    }

    #[test]
    fn test_foreign_identity_is_rejected_and_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("foreign.json");
        let mut document = SettingsDocument::from_state(&populated_state()).unwrap();
        document.software.name = "segno_ui".to_string();
        std::fs::write(&path, serde_json::to_string(&document).unwrap()).unwrap();

        let mut state = FormState::default();
        let before = state.clone();
        let err = import_settings(&path, &mut state).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidIdentity { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn test_unparsable_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let mut state = FormState::default();
        assert!(matches!(
            import_settings(&path, &mut state),
            Err(SettingsError::Parse(_))
        ));
        assert_eq!(state, FormState::default());
    }

    #[test]
    fn test_out_of_range_scale_is_rejected() {
        let mut document = SettingsDocument::from_state(&FormState::default()).unwrap();
        document.segno_export_opts.scale = 20;
        document.segno_export_opts.dark = "#ff0000".to_string();
        let mut state = FormState::default();
        assert!(matches!(
            document.apply(&mut state),
            Err(SettingsError::OutOfRange { field: "scale", .. })
        ));
        assert_eq!(state.dark, "#000000");
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let json = format!(
            r##"{{
                "software": {{"name": "{}", "version": "0.0.1"}},
                "data": {{
                    "Generic": {{"content": "HI", "colour": "blue"}},
                    "Hologram": {{"depth": 3}}
                }},
                "segno_make_opts": {{"error": "H", "boost_error": true, "mask": 3}},
                "segno_export_opts": {{"dark": "#010101", "light": "#fefefe", "scale": 3, "border": 2}},
                "misc_opts": {{"qrcode_format": "Mini QR Code", "active_tab": "Nowhere"}},
                "window": {{"width": 800}}
            }}"##,
            SOFTWARE_NAME
        );
        let document = SettingsDocument::from_json(&json).unwrap();
        let mut state = FormState::default();
        document.apply(&mut state).unwrap();
        assert_eq!(state.field(ContentKind::Generic, "content"), "HI");
        assert_eq!(state.error_level, ErrorLevel::High);
        assert_eq!(state.mode, QrMode::Micro);
        assert_eq!(state.active_kind, ContentKind::Generic);
        assert_eq!(state.scale, 3);
        assert_eq!(state.dark, "#010101");
    }

    #[test]
    fn test_settings_path_uses_first_dot_segment() {
        assert_eq!(settings_path(Path::new("/a/b/qr")), PathBuf::from("/a/b/qr.json"));
        assert_eq!(settings_path(Path::new("/a/b/qr.json")), PathBuf::from("/a/b/qr.json"));
        assert_eq!(
            settings_path(Path::new("/a/b.c/qr.backup.txt")),
            PathBuf::from("/a/b.c/qr.json")
        );
    }

    #[test]
    fn test_write_failure_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let chosen = dir.path().join("missing/qr");
        let err = export_settings(&chosen, &FormState::default()).unwrap_err();
        assert!(matches!(err, SettingsError::Write { .. }));
        assert!(err.to_string().contains("qr.json"));
    }

    #[test]
    fn test_infinite_coordinate_blocks_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = FormState::default();
        state.set_field(ContentKind::VCard, "lat", "inf");
        assert!(matches!(
            export_settings(&dir.path().join("qr"), &state),
            Err(SettingsError::Form(FormError::NonFiniteNumber { .. }))
        ));
        assert!(!dir.path().join("qr.json").exists());
    }

    #[test]
    fn test_bad_coordinate_blocks_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = FormState::default();
        state.set_field(ContentKind::Geo, "lng", "east");
        assert!(matches!(
            export_settings(&dir.path().join("qr"), &state),
            Err(SettingsError::Form(_))
        ));
    }
}
