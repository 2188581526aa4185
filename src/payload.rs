// File: payload.rs
// Location: /src/payload.rs

use chrono::NaiveDate;

use crate::error::PayloadError;
use crate::form::{FieldValue, KindValues};
use crate::schema::ContentKind;

const EPC_MAX_AMOUNT: f64 = 999_999_999.99;

/// Character set identifiers of the EPC069-12 header line.
const EPC_ENCODINGS: [(u8, &str); 8] = [
    (1, "utf-8"),
    (2, "iso-8859-1"),
    (3, "iso-8859-2"),
    (4, "iso-8859-4"),
    (5, "iso-8859-5"),
    (6, "iso-8859-7"),
    (7, "iso-8859-10"),
    (8, "iso-8859-15"),
];

/// Named-argument view over the extracted values of one content kind.
struct Args<'a> {
    values: &'a KindValues,
}

impl<'a> Args<'a> {
    fn text(&self, name: &str) -> Option<String> {
        self.values.get(name).map(FieldValue::to_string)
    }

    fn required(&self, name: &'static str) -> Result<String, PayloadError> {
        self.text(name).ok_or(PayloadError::Missing(name))
    }

    fn number(&self, name: &'static str) -> Result<Option<f64>, PayloadError> {
        match self.values.get(name) {
            None => Ok(None),
            Some(FieldValue::Number(n)) => Ok(Some(*n)),
            Some(FieldValue::Text(text)) => text
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|e| invalid(name, e.to_string())),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> PayloadError {
    PayloadError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Builds the text encoded into the symbol for `kind`.
pub fn assemble(kind: ContentKind, values: &KindValues) -> Result<String, PayloadError> {
    let args = Args { values };
    match kind {
        ContentKind::Generic => args.required("content"),
        ContentKind::VCard => make_vcard_data(&args),
        ContentKind::MeCard => make_mecard_data(&args),
        ContentKind::Email => make_email_data(&args),
        ContentKind::Geo => make_geo_data(&args),
        ContentKind::Wifi => make_wifi_data(&args),
        ContentKind::Epc => make_epc_data(&args),
    }
}

fn escape_with(value: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn escape_vcard(value: &str) -> String {
    escape_with(value, &['\\', ',', ';'])
}

fn escape_mecard(value: &str) -> String {
    escape_with(value, &['\\', ';', ':', ',', '"'])
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, PayloadError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .map_err(|_| invalid(field, format!("'{}' is not a date (YYYY-MM-DD)", value)))
}

fn make_vcard_data(args: &Args) -> Result<String, PayloadError> {
    let mut lines = vec![
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!("N:{}", args.required("name")?),
        format!("FN:{}", escape_vcard(&args.required("displayname")?)),
    ];

    let simple = [
        ("org", "ORG"),
        ("email", "EMAIL"),
        ("phone", "TEL"),
        ("fax", "TEL;TYPE=FAX"),
        ("videophone", "TEL;TYPE=VIDEO"),
        ("cellphone", "TEL;TYPE=CELL"),
        ("homephone", "TEL;TYPE=HOME"),
        ("workphone", "TEL;TYPE=WORK"),
        ("memo", "NOTE"),
        ("nickname", "NICKNAME"),
        ("url", "URL"),
        ("title", "TITLE"),
        ("source", "SOURCE"),
    ];
    for (field, property) in simple {
        if let Some(value) = args.text(field) {
            lines.push(format!("{}:{}", property, escape_vcard(&value)));
        }
    }

    if let Some(birthday) = args.text("birthday") {
        let date = parse_date("birthday", &birthday)?;
        lines.push(format!("BDAY:{}", date.format("%Y-%m-%d")));
    }

    let address: Vec<String> = ["pobox", "street", "city", "region", "zipcode", "country"]
        .iter()
        .map(|field| args.text(field).map(|v| escape_vcard(&v)).unwrap_or_default())
        .collect();
    if address.iter().any(|part| !part.is_empty()) {
        // ADR: pobox;extended;street;city;region;zipcode;country
        lines.push(format!(
            "ADR:{};;{}",
            address[0],
            address[1..].join(";")
        ));
    }

    match (args.number("lat")?, args.number("lng")?) {
        (Some(lat), Some(lng)) => lines.push(format!("GEO:{};{}", lat, lng)),
        (None, None) => {}
        (Some(_), None) => return Err(invalid("lng", "lat and lng must be provided together")),
        (None, Some(_)) => return Err(invalid("lat", "lat and lng must be provided together")),
    }

    if let Some(photo) = args.text("photo_uri") {
        lines.push(format!("PHOTO;VALUE=uri:{}", photo));
    }

    if let Some(rev) = args.text("rev") {
        let date = parse_date("rev", &rev)?;
        lines.push(format!("REV:{}", date.format("%Y-%m-%d")));
    }

    lines.push("END:VCARD".to_string());
    let mut data = lines.join("\r\n");
    data.push_str("\r\n");
    Ok(data)
}

fn make_mecard_data(args: &Args) -> Result<String, PayloadError> {
    let mut data = format!("MECARD:N:{};", escape_mecard(&args.required("name")?));

    let simple = [
        ("reading", "SOUND"),
        ("phone", "TEL"),
        ("videophone", "TEL-AV"),
        ("email", "EMAIL"),
        ("memo", "NOTE"),
    ];
    for (field, property) in simple {
        if let Some(value) = args.text(field) {
            data.push_str(&format!("{}:{};", property, escape_mecard(&value)));
        }
    }

    if let Some(birthday) = args.text("birthday") {
        let date = parse_date("birthday", &birthday)?;
        data.push_str(&format!("BDAY:{};", date.format("%Y%m%d")));
    }

    let address: Vec<String> = [
        "pobox",
        "roomno",
        "houseno",
        "city",
        "prefecture",
        "zipcode",
        "country",
    ]
    .iter()
    .map(|field| args.text(field).map(|v| escape_mecard(&v)).unwrap_or_default())
    .collect();
    if address.iter().any(|part| !part.is_empty()) {
        data.push_str(&format!("ADR:{};", address.join(",")));
    }

    for (field, property) in [("url", "URL"), ("nickname", "NICKNAME")] {
        if let Some(value) = args.text(field) {
            data.push_str(&format!("{}:{};", property, escape_mecard(&value)));
        }
    }

    data.push(';');
    Ok(data)
}

/// Percent-encodes everything outside the RFC 3986 unreserved set and `safe`.
fn percent_encode(value: &str, safe: &[u8]) -> String {
    let mut encoded = String::with_capacity(value.len());
    for &byte in value.as_bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) || safe.contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

fn address_list(value: &str) -> String {
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(|address| percent_encode(address, b"@"))
        .collect::<Vec<_>>()
        .join(",")
}

fn make_email_data(args: &Args) -> Result<String, PayloadError> {
    let to = address_list(&args.required("to")?);
    if to.is_empty() {
        return Err(PayloadError::Missing("to"));
    }

    let mut query = Vec::new();
    for field in ["cc", "bcc"] {
        if let Some(value) = args.text(field) {
            query.push(format!("{}={}", field, address_list(&value)));
        }
    }
    for field in ["subject", "body"] {
        if let Some(value) = args.text(field) {
            query.push(format!("{}={}", field, percent_encode(&value, b"")));
        }
    }

    let mut data = format!("mailto:{}", to);
    if !query.is_empty() {
        data.push('?');
        data.push_str(&query.join("&"));
    }
    Ok(data)
}

fn format_coordinate(value: f64) -> String {
    let formatted = format!("{:.8}", value);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn make_geo_data(args: &Args) -> Result<String, PayloadError> {
    let lat = args.number("lat")?.ok_or(PayloadError::Missing("lat"))?;
    let lng = args.number("lng")?.ok_or(PayloadError::Missing("lng"))?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(invalid("lat", format!("{} is not within -90..90", lat)));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(invalid("lng", format!("{} is not within -180..180", lng)));
    }
    Ok(format!(
        "geo:{},{}",
        format_coordinate(lat),
        format_coordinate(lng)
    ))
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, PayloadError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" | "" => Ok(false),
        other => Err(invalid(field, format!("'{}' is not a yes/no value", other))),
    }
}

/// Hex-only values are quoted so readers do not take them for raw keys.
/// Escapes `value`; values that look like hex are wrapped in quotes so
/// readers take them as text.
fn wifi_value(value: &str) -> String {
    let escaped = escape_mecard(value);
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_hexdigit()) {
        format!("\"{}\"", escaped)
    } else {
        escaped
    }
}

fn make_wifi_data(args: &Args) -> Result<String, PayloadError> {
    let ssid = args.required("ssid")?;
    let mut data = String::from("WIFI:");

    if let Some(security) = args.text("security") {
        let security = if security.eq_ignore_ascii_case("nopass") {
            "nopass".to_string()
        } else {
            security.to_uppercase()
        };
        data.push_str(&format!("T:{};", security));
    }

    data.push_str(&format!("S:{};", wifi_value(&ssid)));

    if let Some(password) = args.text("password") {
        data.push_str(&format!("P:{};", wifi_value(&password)));
    }

    let hidden = match args.text("hidden") {
        Some(value) => parse_flag("hidden", &value)?,
        None => false,
    };
    if hidden {
        data.push_str("H:true;");
    }

    data.push(';');
    Ok(data)
}

/// Accepts the identifier (`1`..`8`) or the charset name. The payload itself
/// stays UTF-8, so the ISO-8859 sets are limited to ASCII text.
fn epc_encoding(value: &str) -> Result<u8, PayloadError> {
    let value = value.trim().to_lowercase();
    let normalized = value.replace('_', "-").replace("latin1", "iso-8859-1");
    EPC_ENCODINGS
        .iter()
        .find(|(id, name)| id.to_string() == normalized || *name == normalized)
        .map(|(id, _)| *id)
        .ok_or_else(|| invalid("encoding", format!("'{}' is not an EPC character set", value)))
}

fn make_epc_data(args: &Args) -> Result<String, PayloadError> {
    let name = args.required("name")?;
    if name.chars().count() > 70 {
        return Err(invalid("name", "must not exceed 70 characters"));
    }

    let iban: String = args
        .required("iban")?
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if iban.len() < 5 || iban.len() > 34 || !iban.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid("iban", format!("'{}' is not a valid IBAN", iban)));
    }

    let amount = args.number("amount")?.ok_or(PayloadError::Missing("amount"))?;
    if !(0.01..=EPC_MAX_AMOUNT).contains(&amount) {
        return Err(invalid("amount", "must be between 0.01 and 999999999.99"));
    }

    let bic = args.text("bic").map(|b| b.trim().to_uppercase()).unwrap_or_default();
    if !bic.is_empty() && bic.len() != 8 && bic.len() != 11 {
        return Err(invalid("bic", "must be 8 or 11 characters long"));
    }

    let purpose = args.text("purpose").unwrap_or_default();
    if purpose.chars().count() > 4 {
        return Err(invalid("purpose", "must not exceed 4 characters"));
    }

    let text = args.text("text").unwrap_or_default();
    let reference = args.text("reference").unwrap_or_default();
    if !text.is_empty() && !reference.is_empty() {
        return Err(invalid("text", "text and reference are mutually exclusive"));
    }
    if text.chars().count() > 140 {
        return Err(invalid("text", "must not exceed 140 characters"));
    }
    if reference.chars().count() > 35 {
        return Err(invalid("reference", "must not exceed 35 characters"));
    }

    let encoding = match args.text("encoding") {
        Some(value) => epc_encoding(&value)?,
        None => 1,
    };
    if encoding != 1 && ![&name, &reference, &text].iter().all(|v| v.is_ascii()) {
        return Err(invalid("encoding", "non-ASCII text requires UTF-8 (1)"));
    }

    let lines = [
        "BCD".to_string(),
        "002".to_string(),
        encoding.to_string(),
        "SCT".to_string(),
        bic,
        name,
        iban,
        format!("EUR{:.2}", amount),
        purpose,
        reference,
        text,
    ];
    Ok(lines.join("\n").trim_end_matches('\n').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&'static str, &str)]) -> KindValues {
        pairs
            .iter()
            .map(|(k, v)| (*k, FieldValue::Text(v.to_string())))
            .collect()
    }

    #[test]
    fn test_generic_passes_content_through() {
        let data = assemble(ContentKind::Generic, &values(&[("content", "HELLO")])).unwrap();
        assert_eq!(data, "HELLO");
    }

    #[test]
    fn test_missing_required_field() {
        let err = assemble(ContentKind::Generic, &KindValues::new()).unwrap_err();
        assert_eq!(err, PayloadError::Missing("content"));
        let err = assemble(ContentKind::VCard, &values(&[("name", "Doe;John")])).unwrap_err();
        assert_eq!(err, PayloadError::Missing("displayname"));
    }

    #[test]
    fn test_vcard() {
        let data = assemble(
            ContentKind::VCard,
            &values(&[
                ("name", "Doe;John"),
                ("displayname", "John Doe"),
                ("email", "john@example.org"),
                ("city", "Berlin"),
                ("birthday", "1980-02-29"),
            ]),
        )
        .unwrap();
        assert!(data.starts_with("BEGIN:VCARD\r\nVERSION:3.0\r\nN:Doe;John\r\nFN:John Doe\r\n"));
        assert!(data.contains("EMAIL:john@example.org\r\n"));
        assert!(data.contains("BDAY:1980-02-29\r\n"));
        assert!(data.contains("ADR:;;;Berlin;;;\r\n"));
        assert!(data.ends_with("END:VCARD\r\n"));
    }

    #[test]
    fn test_vcard_rejects_half_coordinate() {
        let mut vals = values(&[("name", "Doe"), ("displayname", "Doe")]);
        vals.insert("lat", FieldValue::Number(1.5));
        assert!(matches!(
            assemble(ContentKind::VCard, &vals),
            Err(PayloadError::Invalid { field: "lng", .. })
        ));
    }

    #[test]
    fn test_mecard() {
        let data = assemble(
            ContentKind::MeCard,
            &values(&[("name", "Doe,John"), ("phone", "+49123"), ("birthday", "19800229")]),
        )
        .unwrap();
        assert_eq!(data, "MECARD:N:Doe\\,John;TEL:+49123;BDAY:19800229;;");
    }

    #[test]
    fn test_email() {
        let data = assemble(
            ContentKind::Email,
            &values(&[("to", "a@example.org, b@example.org"), ("subject", "Hi there")]),
        )
        .unwrap();
        assert_eq!(data, "mailto:a@example.org,b@example.org?subject=Hi%20there");
    }

    #[test]
    fn test_geo() {
        let mut vals = KindValues::new();
        vals.insert("lat", FieldValue::Number(38.8976763));
        vals.insert("lng", FieldValue::Number(-77.0365298));
        assert_eq!(
            assemble(ContentKind::Geo, &vals).unwrap(),
            "geo:38.8976763,-77.0365298"
        );
        vals.insert("lat", FieldValue::Number(91.0));
        assert!(assemble(ContentKind::Geo, &vals).is_err());
    }

    #[test]
    fn test_wifi() {
        let data = assemble(
            ContentKind::Wifi,
            &values(&[("ssid", "My;Net"), ("password", "secret"), ("security", "wpa")]),
        )
        .unwrap();
        assert_eq!(data, "WIFI:T:WPA;S:My\\;Net;P:secret;;");

        let data = assemble(
            ContentKind::Wifi,
            &values(&[("ssid", "cafe"), ("security", "nopass"), ("hidden", "yes")]),
        )
        .unwrap();
        assert_eq!(data, "WIFI:T:nopass;S:\"cafe\";H:true;;");

        let data = assemble(
            ContentKind::Wifi,
            &values(&[("ssid", "Home"), ("password", "12345678"), ("security", "WPA")]),
        )
        .unwrap();
        assert_eq!(data, "WIFI:T:WPA;S:Home;P:\"12345678\";;");
    }

    #[test]
    fn test_wifi_rejects_bad_flag() {
        let err = assemble(ContentKind::Wifi, &values(&[("ssid", "n"), ("hidden", "maybe")]));
        assert!(matches!(err, Err(PayloadError::Invalid { field: "hidden", .. })));
    }

    #[test]
    fn test_epc() {
        let data = assemble(
            ContentKind::Epc,
            &values(&[
                ("name", "Wikimedia Foerdergesellschaft"),
                ("iban", "DE33 1002 0500 0001 1947 00"),
                ("amount", "10.5"),
                ("text", "Spende"),
            ]),
        )
        .unwrap();
        assert_eq!(
            data,
            "BCD\n002\n1\nSCT\n\nWikimedia Foerdergesellschaft\nDE33100205000001194700\nEUR10.50\n\n\nSpende"
        );
    }

    #[test]
    fn test_epc_encoding() {
        let base = [
            ("name", "Acme"),
            ("iban", "DE33100205000001194700"),
            ("amount", "1"),
        ];

        let mut fields = base.to_vec();
        fields.push(("encoding", "ISO-8859-15"));
        let data = assemble(ContentKind::Epc, &values(&fields)).unwrap();
        assert!(data.starts_with("BCD\n002\n8\nSCT\n"));

        let mut fields = base.to_vec();
        fields.push(("encoding", "2"));
        let data = assemble(ContentKind::Epc, &values(&fields)).unwrap();
        assert!(data.starts_with("BCD\n002\n2\n"));

        let mut fields = base.to_vec();
        fields.push(("encoding", "9"));
        let err = assemble(ContentKind::Epc, &values(&fields));
        assert!(matches!(err, Err(PayloadError::Invalid { field: "encoding", .. })));

        let fields = [
            ("name", "Müller"),
            ("iban", "DE33100205000001194700"),
            ("amount", "1"),
            ("encoding", "iso-8859-1"),
        ];
        let err = assemble(ContentKind::Epc, &values(&fields));
        assert!(matches!(err, Err(PayloadError::Invalid { field: "encoding", .. })));
    }

    #[test]
    fn test_epc_text_and_reference_exclusive() {
        let err = assemble(
            ContentKind::Epc,
            &values(&[
                ("name", "A"),
                ("iban", "DE33100205000001194700"),
                ("amount", "1"),
                ("text", "x"),
                ("reference", "y"),
            ]),
        );
        assert!(err.is_err());
    }
}
