// File: schema.rs
// Location: /src/schema.rs

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
}

impl FieldSpec {
    const fn required(name: &'static str) -> Self {
        Self { name, field_type: FieldType::Text, required: true }
    }

    const fn optional(name: &'static str) -> Self {
        Self { name, field_type: FieldType::Text, required: false }
    }

    const fn float(name: &'static str, required: bool) -> Self {
        Self { name, field_type: FieldType::Float, required }
    }

    /// Label shown next to the entry, e.g. `photo_uri` -> `Photo uri`.
    pub fn label(&self) -> String {
        let spaced = self.name.replace('_', " ");
        let mut chars = spaced.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

const GENERIC_FIELDS: &[FieldSpec] = &[FieldSpec::required("content")];

const VCARD_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("name"),
    FieldSpec::required("displayname"),
    FieldSpec::optional("email"),
    FieldSpec::optional("phone"),
    FieldSpec::optional("fax"),
    FieldSpec::optional("videophone"),
    FieldSpec::optional("memo"),
    FieldSpec::optional("nickname"),
    FieldSpec::optional("birthday"),
    FieldSpec::optional("url"),
    FieldSpec::optional("pobox"),
    FieldSpec::optional("street"),
    FieldSpec::optional("city"),
    FieldSpec::optional("region"),
    FieldSpec::optional("zipcode"),
    FieldSpec::optional("country"),
    FieldSpec::optional("org"),
    FieldSpec::float("lat", false),
    FieldSpec::float("lng", false),
    FieldSpec::optional("source"),
    FieldSpec::optional("rev"),
    FieldSpec::optional("title"),
    FieldSpec::optional("photo_uri"),
    FieldSpec::optional("cellphone"),
    FieldSpec::optional("homephone"),
    FieldSpec::optional("workphone"),
];

const MECARD_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("name"),
    FieldSpec::optional("reading"),
    FieldSpec::optional("email"),
    FieldSpec::optional("phone"),
    FieldSpec::optional("videophone"),
    FieldSpec::optional("memo"),
    FieldSpec::optional("nickname"),
    FieldSpec::optional("birthday"),
    FieldSpec::optional("url"),
    FieldSpec::optional("pobox"),
    FieldSpec::optional("roomno"),
    FieldSpec::optional("houseno"),
    FieldSpec::optional("city"),
    FieldSpec::optional("prefecture"),
    FieldSpec::optional("zipcode"),
    FieldSpec::optional("country"),
];

const EMAIL_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("to"),
    FieldSpec::optional("cc"),
    FieldSpec::optional("bcc"),
    FieldSpec::optional("subject"),
    FieldSpec::optional("body"),
];

const GEO_FIELDS: &[FieldSpec] = &[FieldSpec::float("lat", true), FieldSpec::float("lng", true)];

const WIFI_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("ssid"),
    FieldSpec::optional("password"),
    FieldSpec::optional("security"),
    FieldSpec::optional("hidden"),
];

const EPC_FIELDS: &[FieldSpec] = &[
    FieldSpec::required("name"),
    FieldSpec::required("iban"),
    FieldSpec::required("amount"),
    FieldSpec::optional("text"),
    FieldSpec::optional("reference"),
    FieldSpec::optional("bic"),
    FieldSpec::optional("purpose"),
    FieldSpec::optional("encoding"),
];

/// Structured-data template selecting the tab, the field list and the payload builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum ContentKind {
    #[default]
    Generic,
    #[serde(rename = "vCard")]
    VCard,
    MeCard,
    Email,
    Geo,
    Wifi,
    #[serde(rename = "EPC")]
    Epc,
}

impl ContentKind {
    pub const ALL: [ContentKind; 7] = [
        ContentKind::Generic,
        ContentKind::VCard,
        ContentKind::MeCard,
        ContentKind::Email,
        ContentKind::Geo,
        ContentKind::Wifi,
        ContentKind::Epc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ContentKind::Generic => "Generic",
            ContentKind::VCard => "vCard",
            ContentKind::MeCard => "MeCard",
            ContentKind::Email => "Email",
            ContentKind::Geo => "Geo",
            ContentKind::Wifi => "Wifi",
            ContentKind::Epc => "EPC",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            ContentKind::Generic => GENERIC_FIELDS,
            ContentKind::VCard => VCARD_FIELDS,
            ContentKind::MeCard => MECARD_FIELDS,
            ContentKind::Email => EMAIL_FIELDS,
            ContentKind::Geo => GEO_FIELDS,
            ContentKind::Wifi => WIFI_FIELDS,
            ContentKind::Epc => EPC_FIELDS,
        }
    }

    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|spec| spec.name == name)
    }

    pub fn icon(self) -> &'static str {
        match self {
            ContentKind::Generic => "text-x-generic-symbolic",
            ContentKind::VCard | ContentKind::MeCard => "contact-new-symbolic",
            ContentKind::Email => "mail-unread-symbolic",
            ContentKind::Geo => "find-location-symbolic",
            ContentKind::Wifi => "network-wireless-symbolic",
            ContentKind::Epc => "emblem-documents-symbolic",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// QR error correction level. Serialized as its one-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ErrorLevel {
    #[serde(rename = "L")]
    Low,
    #[default]
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "Q")]
    Quartile,
    #[serde(rename = "H")]
    High,
}

impl ErrorLevel {
    pub const ALL: [ErrorLevel; 4] = [
        ErrorLevel::Low,
        ErrorLevel::Medium,
        ErrorLevel::Quartile,
        ErrorLevel::High,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ErrorLevel::Low => "7%",
            ErrorLevel::Medium => "15%",
            ErrorLevel::Quartile => "25%",
            ErrorLevel::High => "33%",
        }
    }

    pub fn code(self) -> char {
        match self {
            ErrorLevel::Low => 'L',
            ErrorLevel::Medium => 'M',
            ErrorLevel::Quartile => 'Q',
            ErrorLevel::High => 'H',
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.label() == label)
    }

    pub fn from_code(code: char) -> Option<Self> {
        let code = code.to_ascii_uppercase();
        Self::ALL.into_iter().find(|level| level.code() == code)
    }

    pub fn index(self) -> u32 {
        match self {
            ErrorLevel::Low => 0,
            ErrorLevel::Medium => 1,
            ErrorLevel::Quartile => 2,
            ErrorLevel::High => 3,
        }
    }

    pub fn from_index(index: u32) -> Self {
        match index {
            0 => ErrorLevel::Low,
            2 => ErrorLevel::Quartile,
            3 => ErrorLevel::High,
            _ => ErrorLevel::Medium,
        }
    }

    pub(crate) fn to_ec_level(self) -> qrcode::EcLevel {
        match self {
            ErrorLevel::Low => qrcode::EcLevel::L,
            ErrorLevel::Medium => qrcode::EcLevel::M,
            ErrorLevel::Quartile => qrcode::EcLevel::Q,
            ErrorLevel::High => qrcode::EcLevel::H,
        }
    }
}

pub const STANDARD_MODE_LABEL: &str = "Standard QR Code";
pub const MICRO_MODE_LABEL: &str = "Micro QR Code";

/// Symbol variant. Stored in settings files as its display label; any label
/// other than the standard one means micro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QrMode {
    #[default]
    Standard,
    Micro,
}

impl QrMode {
    pub fn label(self) -> &'static str {
        match self {
            QrMode::Standard => STANDARD_MODE_LABEL,
            QrMode::Micro => MICRO_MODE_LABEL,
        }
    }

    pub fn from_label(label: &str) -> Self {
        if label == STANDARD_MODE_LABEL {
            QrMode::Standard
        } else {
            QrMode::Micro
        }
    }
}

impl From<String> for QrMode {
    fn from(label: String) -> Self {
        QrMode::from_label(&label)
    }
}

impl From<QrMode> for String {
    fn from(mode: QrMode) -> Self {
        mode.label().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Svg,
    Eps,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Png,
        ExportFormat::Svg,
        ExportFormat::Eps,
        ExportFormat::Pdf,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
            ExportFormat::Eps => "eps",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.extension() == ext)
    }

    /// EPS and PDF output only knows two colors.
    pub fn supports_data_colors(self) -> bool {
        matches!(self, ExportFormat::Png | ExportFormat::Svg)
    }

    pub fn index(self) -> u32 {
        match self {
            ExportFormat::Png => 0,
            ExportFormat::Svg => 1,
            ExportFormat::Eps => 2,
            ExportFormat::Pdf => 3,
        }
    }

    pub fn from_index(index: u32) -> Self {
        match index {
            1 => ExportFormat::Svg,
            2 => ExportFormat::Eps,
            3 => ExportFormat::Pdf,
            _ => ExportFormat::Png,
        }
    }
}

pub const SCALE_RANGE: std::ops::RangeInclusive<u32> = 1..=8;
pub const BORDER_RANGE: std::ops::RangeInclusive<u32> = 1..=10;
