// File: render.rs
// Location: /src/render.rs

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Cursor;
use std::path::Path;

use crate::config::write_atomic;
use crate::error::RenderError;
use crate::form::RenderOptions;
use crate::qr::{Module, Symbol};
use crate::schema::ExportFormat;

pub type Rgba8 = [u8; 4];

const TRANSPARENT: Rgba8 = [0, 0, 0, 0];

const NAMED_COLORS: &[(&str, Rgba8)] = &[
    ("black", [0x00, 0x00, 0x00, 0xff]),
    ("white", [0xff, 0xff, 0xff, 0xff]),
    ("red", [0xff, 0x00, 0x00, 0xff]),
    ("green", [0x00, 0x80, 0x00, 0xff]),
    ("lime", [0x00, 0xff, 0x00, 0xff]),
    ("blue", [0x00, 0x00, 0xff, 0xff]),
    ("navy", [0x00, 0x00, 0x80, 0xff]),
    ("yellow", [0xff, 0xff, 0x00, 0xff]),
    ("orange", [0xff, 0xa5, 0x00, 0xff]),
    ("cyan", [0x00, 0xff, 0xff, 0xff]),
    ("aqua", [0x00, 0xff, 0xff, 0xff]),
    ("magenta", [0xff, 0x00, 0xff, 0xff]),
    ("fuchsia", [0xff, 0x00, 0xff, 0xff]),
    ("purple", [0x80, 0x00, 0x80, 0xff]),
    ("maroon", [0x80, 0x00, 0x00, 0xff]),
    ("olive", [0x80, 0x80, 0x00, 0xff]),
    ("teal", [0x00, 0x80, 0x80, 0xff]),
    ("gray", [0x80, 0x80, 0x80, 0xff]),
    ("grey", [0x80, 0x80, 0x80, 0xff]),
    ("silver", [0xc0, 0xc0, 0xc0, 0xff]),
    ("darkblue", [0x00, 0x00, 0x8b, 0xff]),
    ("darkred", [0x8b, 0x00, 0x00, 0xff]),
    ("darkgreen", [0x00, 0x64, 0x00, 0xff]),
    ("transparent", TRANSPARENT),
    ("none", TRANSPARENT),
];

/// Accepts `#RGB`, `#RRGGBB`, `#RRGGBBAA` and a few CSS color names.
pub fn parse_color(value: &str) -> Result<Rgba8, RenderError> {
    let trimmed = value.trim();
    let invalid = || RenderError::InvalidColor(value.to_string());

    if let Some(hex) = trimmed.strip_prefix('#') {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        return match hex.len() {
            3 => {
                let mut rgba = [0xff; 4];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16).ok_or_else(invalid)? as u8;
                    rgba[i] = v * 17;
                }
                Ok(rgba)
            }
            6 => Ok([channel(0)?, channel(2)?, channel(4)?, 0xff]),
            8 => Ok([channel(0)?, channel(2)?, channel(4)?, channel(6)?]),
            _ => Err(invalid()),
        };
    }

    let lower = trimmed.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, rgba)| *rgba)
        .ok_or_else(invalid)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub dark: Rgba8,
    pub light: Rgba8,
    pub data_dark: Rgba8,
    pub data_light: Rgba8,
}

impl Palette {
    /// Data colors fall back to the base colors when not given.
    pub fn from_options(opts: &RenderOptions) -> Result<Self, RenderError> {
        let dark = parse_color(&opts.dark)?;
        let light = parse_color(&opts.light)?;
        let data_dark = match &opts.data_dark {
            Some(color) => parse_color(color)?,
            None => dark,
        };
        let data_light = match &opts.data_light {
            Some(color) => parse_color(color)?,
            None => light,
        };
        Ok(Self {
            dark,
            light,
            data_dark,
            data_light,
        })
    }

    pub fn color(&self, module: Module) -> Rgba8 {
        match module {
            Module::Dark => self.dark,
            Module::Light => self.light,
            Module::DataDark => self.data_dark,
            Module::DataLight => self.data_light,
        }
    }
}

/// Module grid including the border, in module units.
struct Layout {
    modules: usize,
    border: usize,
    scale: u32,
}

impl Layout {
    fn new(symbol: &Symbol, opts: &RenderOptions) -> Self {
        let border = opts.border as usize;
        Self {
            modules: symbol.width() + 2 * border,
            border,
            scale: opts.scale.max(1),
        }
    }

    fn pixels(&self) -> u32 {
        self.modules as u32 * self.scale
    }
}

pub fn render_png(symbol: &Symbol, opts: &RenderOptions) -> Result<Vec<u8>, RenderError> {
    let palette = Palette::from_options(opts)?;
    let layout = Layout::new(symbol, opts);
    let size = layout.pixels();
    let scale = layout.scale;

    let mut img = ImageBuffer::from_pixel(size, size, Rgba(palette.light));

    for (y, row) in symbol.rows().enumerate() {
        for (x, module) in row.iter().enumerate() {
            let color = Rgba(palette.color(*module));
            let px = (x + layout.border) as u32 * scale;
            let py = (y + layout.border) as u32 * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    img.put_pixel(px + dx, py + dy, color);
                }
            }
        }
    }

    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

fn svg_fill(color: Rgba8) -> String {
    let mut fill = format!("fill=\"#{:02x}{:02x}{:02x}\"", color[0], color[1], color[2]);
    if color[3] != 0xff {
        let _ = write!(fill, " fill-opacity=\"{:.3}\"", f32::from(color[3]) / 255.0);
    }
    fill
}

pub fn render_svg(symbol: &Symbol, opts: &RenderOptions) -> Result<Vec<u8>, RenderError> {
    let palette = Palette::from_options(opts)?;
    let layout = Layout::new(symbol, opts);
    let size = layout.pixels();

    // One path per distinct color, the light background is a single rect.
    let mut paths: BTreeMap<Rgba8, String> = BTreeMap::new();
    for (y, row) in symbol.rows().enumerate() {
        for (x, module) in row.iter().enumerate() {
            let color = palette.color(*module);
            if color == palette.light || color[3] == 0 {
                continue;
            }
            let path = paths.entry(color).or_default();
            let _ = write!(
                path,
                "M{} {}h1v1h-1z",
                x + layout.border,
                y + layout.border
            );
        }
    }

    let mut svg = String::new();
    let _ = writeln!(svg, "<?xml version=\"1.0\" encoding=\"utf-8\"?>");
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{size}\" height=\"{size}\" viewBox=\"0 0 {n} {n}\" shape-rendering=\"crispEdges\">",
        size = size,
        n = layout.modules
    );
    if palette.light[3] != 0 {
        let _ = writeln!(
            svg,
            "<rect width=\"{n}\" height=\"{n}\" {}/>",
            svg_fill(palette.light),
            n = layout.modules
        );
    }
    for (color, path) in &paths {
        let _ = writeln!(svg, "<path {} d=\"{}\"/>", svg_fill(*color), path);
    }
    svg.push_str("</svg>\n");
    Ok(svg.into_bytes())
}

fn rgb_operands(color: Rgba8) -> String {
    let component = |c: u8| {
        let s = format!("{:.3}", f32::from(c) / 255.0);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    };
    format!(
        "{} {} {}",
        component(color[0]),
        component(color[1]),
        component(color[2])
    )
}

/// Dark module rectangles in PostScript/PDF user space (origin bottom-left).
fn dark_rects(symbol: &Symbol, layout: &Layout) -> Vec<(u32, u32, u32)> {
    let scale = layout.scale;
    let size = layout.pixels();
    let mut rects = Vec::new();
    for (y, row) in symbol.rows().enumerate() {
        for (x, module) in row.iter().enumerate() {
            if module.is_dark() {
                let px = (x + layout.border) as u32 * scale;
                let py = size - (y + layout.border + 1) as u32 * scale;
                rects.push((px, py, scale));
            }
        }
    }
    rects
}

pub fn render_eps(symbol: &Symbol, opts: &RenderOptions) -> Result<Vec<u8>, RenderError> {
    let palette = Palette::from_options(opts)?;
    let layout = Layout::new(symbol, opts);
    let size = layout.pixels();

    let mut eps = String::new();
    eps.push_str("%!PS-Adobe-3.0 EPSF-3.0\n");
    eps.push_str("%%Creator: adw-qrcode\n");
    let _ = writeln!(eps, "%%BoundingBox: 0 0 {} {}", size, size);
    eps.push_str("%%EndComments\ngsave\n");
    if palette.light[3] != 0 {
        let _ = writeln!(eps, "{} setrgbcolor", rgb_operands(palette.light));
        let _ = writeln!(eps, "0 0 {} {} rectfill", size, size);
    }
    if palette.dark[3] != 0 {
        let _ = writeln!(eps, "{} setrgbcolor", rgb_operands(palette.dark));
        for (x, y, s) in dark_rects(symbol, &layout) {
            let _ = writeln!(eps, "{} {} {} {} rectfill", x, y, s, s);
        }
    }
    eps.push_str("grestore\nshowpage\n%%EOF\n");
    Ok(eps.into_bytes())
}

pub fn render_pdf(symbol: &Symbol, opts: &RenderOptions) -> Result<Vec<u8>, RenderError> {
    let palette = Palette::from_options(opts)?;
    let layout = Layout::new(symbol, opts);
    let size = layout.pixels();

    let mut content = String::new();
    if palette.light[3] != 0 {
        let _ = writeln!(content, "{} rg", rgb_operands(palette.light));
        let _ = writeln!(content, "0 0 {} {} re f", size, size);
    }
    if palette.dark[3] != 0 {
        let _ = writeln!(content, "{} rg", rgb_operands(palette.dark));
        for (x, y, s) in dark_rects(symbol, &layout) {
            let _ = writeln!(content, "{} {} {} {} re", x, y, s, s);
        }
        content.push_str("f\n");
    }

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << >> /Contents 4 0 R >>",
            size, size
        ),
        format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        let _ = write!(pdf, "{} 0 obj\n{}\nendobj\n", i + 1, body);
    }
    let xref = pdf.len();
    let _ = write!(pdf, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = writeln!(pdf, "{:010} 00000 n ", offset);
    }
    let _ = write!(
        pdf,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref
    );
    Ok(pdf.into_bytes())
}

pub fn render(
    symbol: &Symbol,
    format: ExportFormat,
    opts: &RenderOptions,
) -> Result<Vec<u8>, RenderError> {
    match format {
        ExportFormat::Png => render_png(symbol, opts),
        ExportFormat::Svg => render_svg(symbol, opts),
        ExportFormat::Eps => render_eps(symbol, opts),
        ExportFormat::Pdf => render_pdf(symbol, opts),
    }
}

/// Renders fully in memory first, then replaces `path` in one step.
pub fn render_to_file(
    symbol: &Symbol,
    path: &Path,
    format: ExportFormat,
    opts: &RenderOptions,
) -> Result<(), RenderError> {
    let bytes = render(symbol, format, opts)?;
    write_atomic(path, &bytes).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::GenerationOptions;
    use crate::qr::make_symbol;
    use crate::schema::{ErrorLevel, QrMode};

    fn symbol() -> Symbol {
        let opts = GenerationOptions {
            error: ErrorLevel::Medium,
            boost_error: false,
        };
        make_symbol("HELLO", &opts, QrMode::Standard).unwrap()
    }

    fn options() -> RenderOptions {
        RenderOptions {
            dark: "#000000".to_string(),
            light: "#FFFFFF".to_string(),
            scale: 2,
            border: 1,
            data_dark: None,
            data_light: None,
        }
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#000000").unwrap(), [0, 0, 0, 255]);
        assert_eq!(parse_color("#FfF").unwrap(), [255, 255, 255, 255]);
        assert_eq!(parse_color("#11223344").unwrap(), [0x11, 0x22, 0x33, 0x44]);
        assert_eq!(parse_color("Red").unwrap(), [255, 0, 0, 255]);
        assert_eq!(parse_color("transparent").unwrap()[3], 0);
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#gggggg").is_err());
        assert!(parse_color("blurple").is_err());
    }

    #[test]
    fn test_png_size_and_colors() {
        let symbol = symbol();
        let mut opts = options();
        opts.data_dark = Some("#ff0000".to_string());
        let bytes = render_png(&symbol, &opts).unwrap();
        let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
        // 21 modules + 2 * 1 border, scale 2
        assert_eq!(img.width(), 46);
        assert_eq!(img.height(), 46);
        // border is light, top-left finder corner dark
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(2, 2).0, [0, 0, 0, 255]);
        assert!(img.pixels().any(|p| p.0 == [255, 0, 0, 255]));
    }

    #[test]
    fn test_png_is_deterministic() {
        let symbol = symbol();
        let a = render_png(&symbol, &options()).unwrap();
        let b = render_png(&symbol, &options()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_svg_output() {
        let mut opts = options();
        opts.data_dark = Some("#0000ff".to_string());
        let svg = String::from_utf8(render_svg(&symbol(), &opts).unwrap()).unwrap();
        assert!(svg.contains("viewBox=\"0 0 23 23\""));
        assert!(svg.contains("width=\"46\""));
        assert!(svg.contains("<rect width=\"23\" height=\"23\" fill=\"#ffffff\"/>"));
        assert!(svg.contains("fill=\"#0000ff\""));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_eps_output() {
        let eps = String::from_utf8(render_eps(&symbol(), &options()).unwrap()).unwrap();
        assert!(eps.starts_with("%!PS-Adobe-3.0 EPSF-3.0"));
        assert!(eps.contains("%%BoundingBox: 0 0 46 46"));
        assert!(eps.contains("0 0 0 setrgbcolor"));
    }

    #[test]
    fn test_pdf_xref_offsets() {
        let pdf = String::from_utf8(render_pdf(&symbol(), &options()).unwrap()).unwrap();
        assert!(pdf.starts_with("%PDF-1.4"));
        let startxref: usize = pdf
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .unwrap()
            .parse()
            .unwrap();
        assert!(pdf[startxref..].starts_with("xref"));
        let first_offset = pdf.find("1 0 obj").unwrap();
        assert!(pdf.contains(&format!("{:010} 00000 n ", first_offset)));
    }

    #[test]
    fn test_invalid_color_is_reported() {
        let mut opts = options();
        opts.dark = "#zzzzzz".to_string();
        assert!(matches!(
            render_png(&symbol(), &opts),
            Err(RenderError::InvalidColor(_))
        ));
    }
}
