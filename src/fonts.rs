use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::OnceLock;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref, Str};
use ttf_parser::Face;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Weight {
    Regular,
    Bold,
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    /// WinAnsi widths for bytes 32..=255, used by the base-14 fallback.
    widths_1000: Vec<f32>,
    pub(crate) ascender_ratio: f32,
    char_to_gid: Option<HashMap<char, u16>>,
    char_widths_1000: Option<HashMap<char, f32>>,
}

impl FontEntry {
    fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(w) = self.char_widths_1000.as_ref().and_then(|m| m.get(&ch)) {
            return *w;
        }
        match char_to_winansi(ch) {
            0 => self.widths_1000[(b'?' - 32) as usize],
            byte => self.widths_1000[(byte - 32) as usize],
        }
    }

    pub(crate) fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    /// Bytes for a `Tj` operand: glyph ids for embedded fonts, WinAnsi otherwise.
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

pub(crate) struct FontSet {
    pub(crate) regular: FontEntry,
    pub(crate) bold: FontEntry,
}

impl FontSet {
    pub(crate) fn get(&self, weight: Weight) -> &FontEntry {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }

    /// Helvetica metrics without writing anything, for measuring text outside
    /// of a document.
    #[cfg(test)]
    pub(crate) fn helvetica_metrics() -> Self {
        Self {
            regular: builtin_entry("F1".into(), Ref::new(1), Weight::Regular),
            bold: builtin_entry("F2".into(), Ref::new(2), Weight::Bold),
        }
    }
}

/// (lowercase family name, bold) -> (file path, face index within TTC)
type FontLookup = HashMap<(String, bool), (PathBuf, u32)>;

static FONT_INDEX: OnceLock<FontLookup> = OnceLock::new();

fn font_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    if let Ok(val) = std::env::var("ARCHIFOLIO_FONTS") {
        let sep = if cfg!(windows) { ';' } else { ':' };
        dirs.extend(
            val.split(sep)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        );
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
        let windir = std::env::var("WINDIR").unwrap_or_else(|_| "C:\\Windows".into());
        dirs.push(PathBuf::from(windir).join("Fonts"));
    }

    dirs
}

fn is_font_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"))
        .unwrap_or(false)
}

/// Family name from name ID 1; it tells "Inter Display" apart from "Inter".
fn font_family_name(face: &Face) -> Option<String> {
    face.names()
        .into_iter()
        .filter(|n| n.name_id == ttf_parser::name_id::FAMILY && n.is_unicode())
        .find_map(|n| n.to_string())
}

fn scan_font_dirs() -> FontLookup {
    let t0 = std::time::Instant::now();
    let mut index = FontLookup::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut stack = font_directories();
    let mut files = 0u32;

    while let Some(dir) = stack.pop() {
        if !visited.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for path in entries.flatten().map(|e| e.path()) {
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if !is_font_file(&path) {
                continue;
            }
            let Ok(file) = std::fs::File::open(&path) else {
                continue;
            };
            // SAFETY: font files are opened read-only and only parsed here.
            let Ok(data) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            files += 1;
            let faces = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
            for face_index in 0..faces {
                let Ok(face) = Face::parse(&data, face_index) else {
                    continue;
                };
                if face.is_italic() {
                    continue;
                }
                if let Some(family) = font_family_name(&face) {
                    index
                        .entry((family.to_lowercase(), face.is_bold()))
                        .or_insert((path.clone(), face_index));
                }
            }
        }
    }

    log::info!(
        "Font scan: {:.1}ms, {} files parsed → {} faces",
        t0.elapsed().as_secs_f64() * 1000.0,
        files,
        index.len(),
    );
    index
}

fn find_font_file(family: &str, weight: Weight) -> Option<(PathBuf, u32)> {
    let index = FONT_INDEX.get_or_init(scan_font_dirs);
    let key = family.trim().to_lowercase();
    index.get(&(key, weight == Weight::Bold)).cloned()
}

/// Map a Unicode char to its WinAnsi (Windows-1252) byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007E | 0x00A0..=0x00FF => c as u8,
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

/// WinAnsi bytes for a base-14 font. Characters outside the code page become `?`.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match char_to_winansi(c) {
            0 => b'?',
            b => b,
        })
        .collect()
}

/// Big-endian 2-byte glyph ids for an Identity-H CIDFont.
fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    text.chars()
        .flat_map(|ch| char_to_gid.get(&ch).copied().unwrap_or(0).to_be_bytes())
        .collect()
}

/// Helvetica / Helvetica-Bold AFM advance widths for ASCII 32..=126.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722,
    722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722,
    667, 944, 667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556,
    556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500,
    500, 334, 260, 334, 584,
];

const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, 975, 722, 722, 722,
    722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722,
    667, 944, 667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556, 333, 611,
    611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556,
    500, 389, 280, 389, 584,
];

/// Widths for WinAnsi bytes 32..=255. The upper half is approximated from the
/// base letters, which is close enough for wrapping accented Latin text.
fn helvetica_widths(weight: Weight) -> Vec<f32> {
    let ascii = match weight {
        Weight::Regular => &HELVETICA_ASCII,
        Weight::Bold => &HELVETICA_BOLD_ASCII,
    };
    (32u8..=255u8)
        .map(|b| match b {
            32..=126 => ascii[(b - 32) as usize] as f32,
            0x96 | 0x80 => 556.0,              // en dash, euro
            0x97 => 1000.0,                    // em dash
            0xC0..=0xDF => 722.0,              // accented capitals
            0xEC..=0xEF => 278.0,              // ì í î ï
            0xE0..=0xFF => ascii[(b'a' - 32) as usize] as f32,
            _ => 556.0,
        })
        .collect()
}

fn builtin_entry(pdf_name: String, font_ref: Ref, weight: Weight) -> FontEntry {
    FontEntry {
        pdf_name,
        font_ref,
        widths_1000: helvetica_widths(weight),
        ascender_ratio: 0.718,
        char_to_gid: None,
        char_widths_1000: None,
    }
}

fn identity_system_info() -> pdf_writer::types::SystemInfo<'static> {
    pdf_writer::types::SystemInfo {
        registry: Str(b"Adobe"),
        ordering: Str(b"Identity"),
        supplement: 0,
    }
}

struct EmbeddedMetrics {
    ascender_ratio: f32,
    char_to_gid: HashMap<char, u16>,
    char_widths_1000: HashMap<char, f32>,
}

/// Embed a TrueType/OpenType face as a Type0 font with Identity-H encoding,
/// subset to the characters in `used_chars`.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    family: &str,
    font_data: &[u8],
    face_index: u32,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<EmbeddedMetrics> {
    let face = Face::parse(font_data, face_index).ok()?;
    let units = face.units_per_em() as f32;
    let to_1000 = |v: f32| v / units * 1000.0;

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut char_widths_1000 = HashMap::new();
    for &ch in used_chars {
        if let Some(gid) = face.glyph_index(ch) {
            char_to_gid.insert(ch, remapper.remap(gid.0));
            let adv = face.glyph_hor_advance(gid).unwrap_or(0) as f32;
            char_widths_1000.insert(ch, to_1000(adv));
        }
    }

    let subset = subsetter::subset(font_data, face_index, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {family}: {e}, embedding full font");
        font_data.to_vec()
    });

    let descriptor_ref = alloc();
    let data_ref = alloc();
    let cid_ref = alloc();
    let cmap_ref = alloc();
    let ps_name = family.replace(' ', "");

    let data_len = i32::try_from(subset.len()).ok()?;
    pdf.stream(data_ref, &subset).pair(Name(b"Length1"), data_len);

    let bb = face.global_bounding_box();
    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(Rect::new(
            to_1000(bb.x_min as f32),
            to_1000(bb.y_min as f32),
            to_1000(bb.x_max as f32),
            to_1000(bb.y_max as f32),
        ))
        .italic_angle(0.0)
        .ascent(to_1000(face.ascender() as f32))
        .descent(to_1000(face.descender() as f32))
        .cap_height(face.capital_height().map_or(700.0, |h| to_1000(h as f32)))
        .stem_v(80.0)
        .font_file2(data_ref);

    {
        let mut cid = pdf.cid_font(cid_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2)
            .base_font(Name(ps_name.as_bytes()))
            .system_info(identity_system_info())
            .font_descriptor(descriptor_ref)
            .default_width(0.0)
            .cid_to_gid_map_predefined(Name(b"Identity"));
        let mut gid_widths: Vec<(u16, f32)> = char_to_gid
            .iter()
            .map(|(ch, &gid)| (gid, char_widths_1000[ch]))
            .collect();
        gid_widths.sort_by_key(|&(gid, _)| gid);
        gid_widths.dedup_by_key(|&mut (gid, _)| gid);
        if !gid_widths.is_empty() {
            let mut widths = cid.widths();
            for (gid, w) in gid_widths {
                widths.consecutive(gid, [w]);
            }
        }
    }

    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(Name(cmap_name.as_bytes()), identity_system_info());
    for (&ch, &gid) in &char_to_gid {
        cmap.pair(gid, ch);
    }
    pdf.stream(cmap_ref, cmap.finish().as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_ref)
        .to_unicode(cmap_ref);

    Some(EmbeddedMetrics {
        ascender_ratio: face.ascender() as f32 / units,
        char_to_gid,
        char_widths_1000,
    })
}

fn register_font(
    pdf: &mut Pdf,
    family: Option<&str>,
    weight: Weight,
    pdf_name: String,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &HashSet<char>,
) -> FontEntry {
    let font_ref = alloc();

    let embedded = family.and_then(|family| {
        let Some((path, face_index)) = find_font_file(family, weight) else {
            log::warn!("Font not found: {family} {weight:?}, using Helvetica");
            return None;
        };
        log::debug!("Embedding {family} {weight:?} from {}", path.display());
        let data = std::fs::read(&path).ok()?;
        embed_truetype(pdf, font_ref, family, &data, face_index, used_chars, alloc)
    });

    match embedded {
        Some(m) => FontEntry {
            pdf_name,
            font_ref,
            widths_1000: helvetica_widths(weight),
            ascender_ratio: m.ascender_ratio,
            char_to_gid: Some(m.char_to_gid),
            char_widths_1000: Some(m.char_widths_1000),
        },
        None => {
            let base: &[u8] = match weight {
                Weight::Regular => b"Helvetica",
                Weight::Bold => b"Helvetica-Bold",
            };
            pdf.type1_font(font_ref)
                .base_font(Name(base))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            builtin_entry(pdf_name, font_ref, weight)
        }
    }
}

/// Registers the regular and bold faces used by every layout.
pub(crate) fn register_fonts(
    pdf: &mut Pdf,
    family: Option<&str>,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &HashSet<char>,
) -> FontSet {
    let t0 = std::time::Instant::now();
    let regular = register_font(pdf, family, Weight::Regular, "F1".into(), alloc, used_chars);
    let bold = register_font(pdf, family, Weight::Bold, "F2".into(), alloc, used_chars);
    log::debug!(
        "register_fonts: {} → {:.1}ms",
        family.unwrap_or("Helvetica"),
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    FontSet { regular, bold }
}
