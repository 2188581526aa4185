// File: qr.rs
// Location: /src/qr.rs

use qrcode::types::QrError;
use qrcode::{Color, QrCode, Version};

use crate::error::SymbolError;
use crate::form::GenerationOptions;
use crate::schema::{ErrorLevel, QrMode};

/// Module classification used for coloring. Function patterns (finders,
/// timing, alignment, format and version info) keep the base colors, data
/// modules may be drawn with the data colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Dark,
    Light,
    DataDark,
    DataLight,
}

impl Module {
    pub fn is_dark(self) -> bool {
        matches!(self, Module::Dark | Module::DataDark)
    }
}

#[derive(Debug, Clone)]
pub struct Symbol {
    width: usize,
    modules: Vec<Module>,
    version: Version,
}

impl Symbol {
    fn from_code(code: &QrCode) -> Self {
        let width = code.width();
        let colors = code.to_colors();
        let mut modules = Vec::with_capacity(width * width);
        for y in 0..width {
            for x in 0..width {
                let dark = colors[y * width + x] == Color::Dark;
                let module = match (code.is_functional(x, y), dark) {
                    (true, true) => Module::Dark,
                    (true, false) => Module::Light,
                    (false, true) => Module::DataDark,
                    (false, false) => Module::DataLight,
                };
                modules.push(module);
            }
        }

        Self {
            width,
            modules,
            version: code.version(),
        }
    }

    /// Number of modules per side, without the border.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_micro(&self) -> bool {
        self.version.is_micro()
    }

    pub fn module(&self, x: usize, y: usize) -> Module {
        self.modules[y * self.width + x]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Module]> {
        self.modules.chunks(self.width)
    }
}

/// Encodes `data` at the smallest version that fits.
pub fn make_symbol(
    data: &str,
    opts: &GenerationOptions,
    mode: QrMode,
) -> Result<Symbol, SymbolError> {
    let level = opts.error.to_ec_level();
    match mode {
        QrMode::Standard => {
            let code = QrCode::with_error_correction_level(data.as_bytes(), level)?;
            Ok(Symbol::from_code(&code))
        }
        QrMode::Micro => {
            if opts.error == ErrorLevel::High {
                return Err(SymbolError::UnsupportedMicroLevel(opts.error.label()));
            }
            for version in 1..=4 {
                match QrCode::with_version(data.as_bytes(), Version::Micro(version), level) {
                    Ok(code) => return Ok(Symbol::from_code(&code)),
                    // M1 holds digits only and M2 has no byte mode
                    Err(
                        QrError::DataTooLong
                        | QrError::InvalidVersion
                        | QrError::UnsupportedCharacterSet,
                    ) => continue,
                    Err(e) => return Err(e.into()),
                }
            }
            Err(SymbolError::MicroOverflow)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(error: ErrorLevel) -> GenerationOptions {
        GenerationOptions {
            error,
            boost_error: false,
        }
    }

    #[test]
    fn test_standard_symbol() {
        let symbol = make_symbol("HELLO", &opts(ErrorLevel::Medium), QrMode::Standard).unwrap();
        assert_eq!(symbol.width(), 21);
        assert!(!symbol.is_micro());
        // Top-left finder corner is a dark function module.
        assert_eq!(symbol.module(0, 0), Module::Dark);
        assert!(symbol.rows().flatten().any(|m| *m == Module::DataDark));
    }

    #[test]
    fn test_micro_symbol_is_small() {
        let symbol = make_symbol("12345", &opts(ErrorLevel::Low), QrMode::Micro).unwrap();
        assert!(symbol.is_micro());
        assert!(symbol.width() <= 17);
    }

    #[test]
    fn test_micro_rejects_high_level() {
        let err = make_symbol("1", &opts(ErrorLevel::High), QrMode::Micro).unwrap_err();
        assert!(matches!(err, SymbolError::UnsupportedMicroLevel("33%")));
    }

    #[test]
    fn test_micro_symbol_for_text() {
        let symbol = make_symbol("HELLO", &opts(ErrorLevel::Medium), QrMode::Micro).unwrap();
        assert!(symbol.is_micro());
        assert!(symbol.width() > 11 && symbol.width() <= 17);

        let symbol = make_symbol("hello", &opts(ErrorLevel::Low), QrMode::Micro).unwrap();
        assert!(symbol.is_micro());
    }

    #[test]
    fn test_micro_overflow() {
        let data = "X".repeat(100);
        let err = make_symbol(&data, &opts(ErrorLevel::Low), QrMode::Micro).unwrap_err();
        assert!(matches!(err, SymbolError::MicroOverflow));
    }
}
