// File: generate.rs
// Location: /src/generate.rs

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::GenerationError;
use crate::form::{self, FormState};
use crate::payload;
use crate::qr::{self, Symbol};
use crate::render;
use crate::schema::ExportFormat;

/// `out` + `svg` -> `out.svg`. The extension is always appended.
pub fn export_path(save_to: &Path, format: ExportFormat) -> PathBuf {
    let mut path = OsString::from(save_to.as_os_str());
    path.push(".");
    path.push(format.extension());
    PathBuf::from(path)
}

fn build_symbol(state: &FormState) -> Result<Symbol, GenerationError> {
    let (make_opts, _, misc_opts) = form::extract_options(state);
    let data = form::extract_field_values(state)?;
    let values = data.get(&state.active_kind).cloned().unwrap_or_default();
    let content = payload::assemble(state.active_kind, &values)?;
    Ok(qr::make_symbol(&content, &make_opts, misc_opts.qrcode_format)?)
}

/// Without `save_to` returns the PNG preview bytes. With `save_to` writes
/// `<save_to>.<format>` and returns `None`.
pub fn generate(
    state: &FormState,
    save_to: Option<&Path>,
) -> Result<Option<Vec<u8>>, GenerationError> {
    let symbol = build_symbol(state)?;
    let (_, export_opts, _) = form::extract_options(state);

    match save_to {
        None => Ok(Some(render::render_png(&symbol, &export_opts)?)),
        Some(base) => {
            let path = export_path(base, state.export_format);
            render::render_to_file(&symbol, &path, state.export_format, &export_opts)?;
            log::info!("Exported {} to {}", state.active_kind, path.display());
            Ok(None)
        }
    }
}

/// Preview path used on every edit.
pub fn try_generate(state: &FormState) -> Result<Vec<u8>, GenerationError> {
    let symbol = build_symbol(state)?;
    let (_, export_opts, _) = form::extract_options(state);
    Ok(render::render_png(&symbol, &export_opts)?)
}

/// Writes the export file and returns the path actually written.
pub fn export(state: &FormState, save_to: &Path) -> Result<PathBuf, GenerationError> {
    generate(state, Some(save_to))?;
    Ok(export_path(save_to, state.export_format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormError;
    use crate::schema::{ContentKind, ErrorLevel, QrMode};

    fn hello_state() -> FormState {
        let mut state = FormState::default();
        state.active_kind = ContentKind::Generic;
        state.set_field(ContentKind::Generic, "content", "HELLO");
        state.mode = QrMode::Standard;
        state.error_level = ErrorLevel::from_label("15%").unwrap();
        state.scale = 2;
        state.border = 1;
        state
    }

    #[test]
    fn test_generic_hello_is_png_and_deterministic() {
        let state = hello_state();
        let first = generate(&state, None).unwrap().unwrap();
        let second = generate(&state, None).unwrap().unwrap();
        assert!(!first.is_empty());
        assert_eq!(&first[..8], b"\x89PNG\r\n\x1a\n");
        assert!(image::load_from_memory(&first).is_ok());
        assert_eq!(first, second);
        assert_eq!(try_generate(&state).unwrap(), first);
    }

    #[test]
    fn test_non_numeric_latitude_fails_to_generate() {
        let mut state = FormState::default();
        state.active_kind = ContentKind::Geo;
        state.set_field(ContentKind::Geo, "lat", "abc");
        state.set_field(ContentKind::Geo, "lng", "10");
        let err = generate(&state, None).unwrap_err();
        assert!(matches!(err, GenerationError::Form(FormError::InvalidNumber { .. })));
    }

    #[test]
    fn test_missing_content_fails() {
        let state = FormState::default();
        assert!(matches!(
            try_generate(&state),
            Err(GenerationError::Payload(_))
        ));
    }

    #[test]
    fn test_only_active_kind_is_encoded() {
        let mut state = hello_state();
        state.set_field(ContentKind::Email, "to", "a@example.org");
        let generic = try_generate(&state).unwrap();
        state.active_kind = ContentKind::Email;
        let email = try_generate(&state).unwrap();
        assert_ne!(generic, email);
    }

    #[test]
    fn test_micro_mode() {
        let mut state = hello_state();
        state.mode = QrMode::Micro;
        let bytes = try_generate(&state).unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        // micro symbols are at most 17 modules wide
        assert!(img.width() <= (17 + 2) * 2);
    }

    #[test]
    fn test_export_appends_extension() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("out");
        let mut state = hello_state();
        state.export_format = ExportFormat::Svg;

        assert!(generate(&state, Some(&base)).unwrap().is_none());
        let svg = dir.path().join("out.svg");
        assert!(svg.exists());
        assert!(!base.exists());
        let content = std::fs::read_to_string(svg).unwrap();
        assert!(content.contains("<svg"));
    }

    #[test]
    fn test_export_keeps_existing_suffix() {
        assert_eq!(
            export_path(Path::new("/tmp/code.png"), ExportFormat::Png),
            PathBuf::from("/tmp/code.png.png")
        );
    }

    #[test]
    fn test_failed_export_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("out");
        let mut state = hello_state();
        state.dark = "not-a-color".to_string();
        state.export_format = ExportFormat::Pdf;
        assert!(export(&state, &base).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_export_to_missing_directory_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("missing/out");
        let err = export(&hello_state(), &base).unwrap_err();
        assert!(err.to_string().contains("out.png"));
    }
}
