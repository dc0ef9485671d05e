use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use memmap2::Mmap;
use serde::Serialize;
use ttf_parser::Face;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    Sans,
    Serif,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FontSpec {
    pub family: FontFamily,
    pub bold: bool,
    pub italic: bool,
    /// Size in points.
    pub size: f64,
}

impl FontSpec {
    pub fn with_size(self, size: f64) -> FontSpec {
        FontSpec { size, ..self }
    }
}

/// Text measurement capability. Implementations must be usable from the
/// shared singleton, hence `Send + Sync`.
pub trait TextMetrics: Send + Sync {
    /// Advance width of `text` set in `font`, in points.
    fn measure(&self, text: &str, font: &FontSpec) -> f64;
}

/// Approximate base-14 metrics. Deterministic and always available.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinMetrics;

impl BuiltinMetrics {
    fn char_width_1000(ch: char, font: &FontSpec) -> f64 {
        let byte = char_to_winansi(ch);
        let base = if byte >= 32 {
            helvetica_width(byte)
        } else if ch.is_whitespace() {
            helvetica_width(b' ')
        } else {
            // Outside WinAnsi: assume an average lowercase glyph.
            556.0
        };
        let family = match font.family {
            FontFamily::Sans => 1.0,
            FontFamily::Serif => 0.9,
        };
        let weight = if font.bold { 1.06 } else { 1.0 };
        base * family * weight
    }
}

impl TextMetrics for BuiltinMetrics {
    fn measure(&self, text: &str, font: &FontSpec) -> f64 {
        text.chars()
            .map(|ch| Self::char_width_1000(ch, font))
            .sum::<f64>()
            * font.size
            / 1000.0
    }
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi bytes 32..=255.
fn helvetica_width(b: u8) -> f64 {
    match b {
        32 => 278.0,                          // space
        33..=47 => 333.0,                     // punctuation
        48..=57 => 556.0,                     // digits
        58..=64 => 333.0,                     // more punctuation
        73 | 74 => 278.0,                     // I J (narrow uppercase)
        77 => 833.0,                          // M (wide)
        65..=90 => 667.0,                     // uppercase A-Z (average)
        91..=96 => 333.0,                     // brackets etc.
        102 | 105 | 106 | 108 | 116 => 278.0, // narrow lowercase: f i j l t
        109 | 119 => 833.0,                   // m w (wide)
        97..=122 => 556.0,                    // lowercase a-z (average)
        _ => 556.0,
    }
}

struct FaceWidths {
    widths_1000: HashMap<char, f32>,
    /// Used for characters the face has no advance for.
    average_1000: f32,
}

impl FaceWidths {
    fn from_font_data(data: &[u8], face_index: u32) -> Option<FaceWidths> {
        let face = Face::parse(data, face_index).ok()?;
        let units = face.units_per_em() as f32;
        let mut widths_1000 = HashMap::new();
        for byte in 32u8..=255u8 {
            let ch = winansi_to_char(byte);
            if let Some(adv) = face.glyph_index(ch).and_then(|gid| face.glyph_hor_advance(gid)) {
                widths_1000.insert(ch, adv as f32 / units * 1000.0);
            }
        }
        if widths_1000.is_empty() {
            return None;
        }
        let average_1000 = widths_1000.values().sum::<f32>() / widths_1000.len() as f32;
        Some(FaceWidths {
            widths_1000,
            average_1000,
        })
    }

    fn measure_1000(&self, text: &str) -> f64 {
        text.chars()
            .map(|ch| *self.widths_1000.get(&ch).unwrap_or(&self.average_1000) as f64)
            .sum()
    }
}

/// Metrics read from installed TrueType/OpenType faces. Styles that could
/// not be found fall back to [`BuiltinMetrics`].
pub struct FaceMetrics {
    faces: HashMap<(FontFamily, bool, bool), FaceWidths>,
}

impl FaceMetrics {
    /// Locate faces for every family/style combination on this system.
    /// `None` when no usable face is installed at all.
    pub fn from_system() -> Option<FaceMetrics> {
        let t0 = std::time::Instant::now();
        let index = scan_font_dirs();
        let mut faces = HashMap::new();
        for family in [FontFamily::Sans, FontFamily::Serif] {
            for (bold, italic) in [(false, false), (true, false), (false, true), (true, true)] {
                let found = family_candidates(family)
                    .iter()
                    .find_map(|name| find_font_file(&index, name, bold, italic))
                    .and_then(|(path, face_index)| load_face(&path, face_index));
                if let Some(widths) = found {
                    faces.insert((family, bold, italic), widths);
                }
            }
        }
        log::info!(
            "Text metrics: {} of 8 styles resolved from system fonts in {:.1}ms",
            faces.len(),
            t0.elapsed().as_secs_f64() * 1000.0
        );
        (!faces.is_empty()).then_some(FaceMetrics { faces })
    }

    /// Metrics from a single font file used for every family and style.
    pub fn from_font_file(path: &Path) -> Option<FaceMetrics> {
        let widths = load_face(path, 0)?;
        let mut faces = HashMap::new();
        faces.insert((FontFamily::Sans, false, false), widths);
        Some(FaceMetrics { faces })
    }

    fn face_for(&self, font: &FontSpec) -> Option<&FaceWidths> {
        self.faces
            .get(&(font.family, font.bold, font.italic))
            .or_else(|| self.faces.get(&(font.family, font.bold, false)))
            .or_else(|| self.faces.get(&(font.family, false, false)))
            .or_else(|| self.faces.get(&(FontFamily::Sans, false, false)))
    }
}

impl TextMetrics for FaceMetrics {
    fn measure(&self, text: &str, font: &FontSpec) -> f64 {
        match self.face_for(font) {
            Some(face) => face.measure_1000(text) * font.size / 1000.0,
            None => BuiltinMetrics.measure(text, font),
        }
    }
}

static SHARED_METRICS: OnceLock<Box<dyn TextMetrics>> = OnceLock::new();

/// The process-wide text measurement facility, created on first use.
///
/// Uses system faces when available unless `PAGE_RECON_NO_SYSTEM_FONTS` is
/// set, otherwise the built-in approximations.
pub fn shared_metrics() -> &'static dyn TextMetrics {
    SHARED_METRICS
        .get_or_init(|| {
            if std::env::var_os("PAGE_RECON_NO_SYSTEM_FONTS").is_some() {
                return Box::new(BuiltinMetrics);
            }
            match FaceMetrics::from_system() {
                Some(metrics) => Box::new(metrics),
                None => {
                    log::warn!("No system fonts found; using built-in Helvetica approximations");
                    Box::new(BuiltinMetrics)
                }
            }
        })
        .as_ref()
}

fn family_candidates(family: FontFamily) -> &'static [&'static str] {
    match family {
        FontFamily::Sans => &[
            "helvetica",
            "arial",
            "liberation sans",
            "nimbus sans",
            "dejavu sans",
        ],
        FontFamily::Serif => &[
            "times new roman",
            "times",
            "liberation serif",
            "nimbus roman",
            "dejavu serif",
        ],
    }
}

/// (lowercase family name, bold, italic) -> (file path, face index within TTC)
type FontLookup = HashMap<(String, bool, bool), (PathBuf, u32)>;

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn read_font_style(data: &[u8], face_index: u32) -> Option<(String, bool, bool)> {
    let face = Face::parse(data, face_index).ok()?;
    let family = font_family_name(&face)?;
    Some((family, face.is_bold(), face.is_italic()))
}

fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Ok(val) = std::env::var("PAGE_RECON_FONTS") {
        let sep = if cfg!(windows) { ';' } else { ':' };
        for part in val.split(sep) {
            let trimmed = part.trim();
            if !trimmed.is_empty() {
                dirs.push(PathBuf::from(trimmed));
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        } else {
            dirs.push("C:\\Windows\\Fonts".into());
        }
    }

    dirs
}

fn is_font_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc")
    )
}

fn is_font_collection(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttc"))
}

fn map_file(path: &Path) -> Option<Mmap> {
    let file = std::fs::File::open(path).ok()?;
    // SAFETY: font files are opened read-only; a concurrent truncation would at
    // worst make ttf-parser reject the face.
    unsafe { Mmap::map(&file) }.ok()
}

fn scan_font_dirs() -> FontLookup {
    let mut index = FontLookup::new();
    let mut visited: std::collections::HashSet<PathBuf> = std::collections::HashSet::new();
    let mut files_scanned = 0u32;

    let mut stack = font_directories();
    while let Some(dir) = stack.pop() {
        if !visited.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if !is_font_file(&path) {
                continue;
            }
            let Some(data) = map_file(&path) else {
                continue;
            };
            files_scanned += 1;
            let face_count = if is_font_collection(&path) {
                ttf_parser::fonts_in_collection(&data).unwrap_or(1)
            } else {
                1
            };
            for face_idx in 0..face_count {
                if let Some((family, bold, italic)) = read_font_style(&data, face_idx) {
                    index
                        .entry((family.to_lowercase(), bold, italic))
                        .or_insert((path.clone(), face_idx));
                }
            }
        }
    }

    log::debug!("Font scan: {} files parsed -> {} entries", files_scanned, index.len());
    index
}

fn find_font_file(index: &FontLookup, family: &str, bold: bool, italic: bool) -> Option<(PathBuf, u32)> {
    index.get(&(family.to_lowercase(), bold, italic)).cloned()
}

fn load_face(path: &Path, face_index: u32) -> Option<FaceWidths> {
    let data = map_file(path)?;
    let widths = FaceWidths::from_font_data(&data, face_index);
    if widths.is_none() {
        log::warn!("Unusable font face {} #{}", path.display(), face_index);
    }
    widths
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
/// Bytes 0x80-0x9F are remapped; all others map directly to their Unicode codepoint.
fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi bytes for PDF string encoding.
/// Unmappable characters become `?`.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match char_to_winansi(c) {
            0 => b'?',
            b => b,
        })
        .collect()
}
