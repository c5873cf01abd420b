//! PDF assembly: fonts and images are registered first, then every record is
//! placed through the layout template, then the page tree is written.

mod cursor;
mod layout;
mod templates;

use std::collections::HashSet;
use std::time::Instant;

use pdf_writer::{Filter, Name, Pdf, Rect, Ref, TextStr};

use crate::config::{ExportConfig, FooterStyle};
use crate::error::{EmbedError, Error, FetchError};
use crate::fonts::register_fonts;
use crate::locale::FieldLabels;
use crate::model::{Bitmap, BitmapData, ImageSlot, Layout, NormalizedRecord};

use cursor::{PageCursor, PageGeometry};
use layout::MM;
use templates::{DrawContext, ImageRef};

/// Optional detail fields, in the order they are dropped when space runs out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Client,
    Service,
    Category,
    Amount,
    Status,
}

impl Field {
    pub fn label(self, labels: &FieldLabels) -> &str {
        match self {
            Field::Client => &labels.client,
            Field::Service => &labels.service,
            Field::Category => &labels.category,
            Field::Amount => &labels.amount,
            Field::Status => &labels.status,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlaceholderReason {
    Fetch(FetchError),
    Embed(EmbedError),
}

/// What ended up in a record's image slot.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageOutcome {
    Embedded,
    Placeholder(PlaceholderReason),
    /// The layout has no image slot, or the record carried no image.
    NoImage,
}

/// Where one record was drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub record_id: String,
    pub page: u32,
    /// Top edge of the block in mm from the top of the page.
    pub top: f32,
    pub height: f32,
    pub image: ImageOutcome,
    pub date_label: String,
    pub omitted_fields: Vec<Field>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderReport {
    pub layout: Layout,
    pub pages: u32,
    /// Page number printed in each page's footer, in page order.
    pub footer_numbers: Vec<u32>,
    /// One entry per input record, in input order.
    pub placements: Vec<Placement>,
}

pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub report: RenderReport,
}

/// Every character any page can show, so embedded fonts can be subset.
fn collect_used_chars(records: &[NormalizedRecord], config: &ExportConfig, layout: Layout) -> HashSet<char> {
    let mut used: HashSet<char> = HashSet::new();
    let mut add = |s: &str| used.extend(s.chars());

    add("0123456789 .,:/?-\u{2013}\u{2026}\u{b7}");
    let locale = &config.locale;
    add(&locale.currency_symbol);
    add(&locale.ongoing);
    add(&locale.thousands_separator.to_string());
    add(&locale.decimal_separator.to_string());
    for month in &locale.month_names {
        add(month);
    }
    for status in &locale.status_names {
        add(status);
    }
    let l = &locale.labels;
    for label in [&l.client, &l.service, &l.category, &l.amount, &l.status, &l.date, &l.title] {
        add(label);
    }

    let profile = config.profile(layout);
    if let FooterStyle::Text(text) = &profile.footer {
        add(text);
    }
    if let Some(header) = &profile.header {
        add(&header.label);
    }

    for n in records {
        let r = &n.record;
        add(&r.name);
        add(&r.name.to_uppercase());
        for s in [&r.location, &r.client, &r.service, &r.category] {
            add(s);
        }
    }
    used
}

fn pdf_dimension(bitmap: &Bitmap) -> Result<(i32, i32), EmbedError> {
    let (width, height) = (bitmap.pixel_width, bitmap.pixel_height);
    if width == 0 || height == 0 {
        return Err(EmbedError::EmptyBitmap { width, height });
    }
    match (i32::try_from(width), i32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(EmbedError::TooLarge { width, height }),
    }
}

fn check_len(actual: usize, expected: usize) -> Result<(), EmbedError> {
    if actual == expected {
        Ok(())
    } else {
        Err(EmbedError::SampleLength { expected, actual })
    }
}

/// Writes `bitmap` as an image XObject (plus soft mask) and returns its ref.
fn embed_bitmap(
    pdf: &mut Pdf,
    alloc: &mut impl FnMut() -> Ref,
    bitmap: &Bitmap,
) -> Result<Ref, EmbedError> {
    let (w, h) = pdf_dimension(bitmap)?;

    match &bitmap.data {
        BitmapData::Jpeg { data, gray } => {
            let xobj_ref = alloc();
            let mut xobj = pdf.image_xobject(xobj_ref, data);
            xobj.filter(Filter::DctDecode);
            xobj.width(w);
            xobj.height(h);
            if *gray {
                xobj.color_space().device_gray();
            } else {
                xobj.color_space().device_rgb();
            }
            xobj.bits_per_component(8);
            Ok(xobj_ref)
        }
        BitmapData::Rgb { samples, alpha } => {
            let pixels = (bitmap.pixel_width as usize)
                .checked_mul(bitmap.pixel_height as usize)
                .ok_or(EmbedError::TooLarge {
                    width: bitmap.pixel_width,
                    height: bitmap.pixel_height,
                })?;
            check_len(samples.len(), pixels * 3)?;
            if let Some(alpha) = alpha {
                check_len(alpha.len(), pixels)?;
            }

            let smask_ref = match alpha {
                Some(alpha) => {
                    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(alpha, 6);
                    let mask_ref = alloc();
                    let mut mask = pdf.image_xobject(mask_ref, &compressed);
                    mask.filter(Filter::FlateDecode);
                    mask.width(w);
                    mask.height(h);
                    mask.color_space().device_gray();
                    mask.bits_per_component(8);
                    Some(mask_ref)
                }
                None => None,
            };

            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(samples, 6);
            let xobj_ref = alloc();
            let mut xobj = pdf.image_xobject(xobj_ref, &compressed);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
            Ok(xobj_ref)
        }
    }
}

fn pdf_count(n: usize, what: &str) -> Result<i32, Error> {
    i32::try_from(n).map_err(|_| Error::Pdf(format!("too many {what}: {n}")))
}

/// Lays out `records` with `layout` and serializes the document.
///
/// Records keep their input order. Image problems never fail the render;
/// the affected record gets a placeholder and the reason is reported in its
/// [`Placement`].
pub fn render(
    records: &[NormalizedRecord],
    layout: Layout,
    config: &ExportConfig,
) -> Result<RenderedDocument, Error> {
    if records.is_empty() {
        return Err(Error::EmptySelection);
    }

    let t0 = Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    let used_chars = collect_used_chars(records, config, layout);
    let fonts = register_fonts(&mut pdf, config.font_family.as_deref(), &mut alloc, &used_chars);
    let t_fonts = t0.elapsed();

    let mut image_xobjects: Vec<(String, Ref)> = Vec::new();
    let mut images: Vec<ImageRef> = Vec::with_capacity(records.len());
    for n in records {
        let image = match &n.image {
            ImageSlot::Skipped => ImageRef::NotShown,
            _ if !layout.wants_images() => ImageRef::NotShown,
            ImageSlot::Failed(e) => ImageRef::Unavailable(PlaceholderReason::Fetch(e.clone())),
            ImageSlot::Loaded(bitmap) => match embed_bitmap(&mut pdf, &mut alloc, bitmap) {
                Ok(xobj_ref) => {
                    let name = format!("Im{}", image_xobjects.len() + 1);
                    image_xobjects.push((name.clone(), xobj_ref));
                    ImageRef::XObject {
                        name,
                        aspect: bitmap.pixel_width as f32 / bitmap.pixel_height as f32,
                    }
                }
                Err(e) => {
                    log::warn!("Image for project '{}' not embedded: {e}", n.record.name);
                    ImageRef::Unavailable(PlaceholderReason::Embed(e))
                }
            },
        };
        images.push(image);
    }
    let t_images = t0.elapsed();

    let geometry = PageGeometry::A4;
    let profile = config.profile(layout);
    let ctx = DrawContext {
        fonts: &fonts,
        locale: &config.locale,
        geometry,
        content_top: geometry.content_top(profile.header.is_some()),
    };
    let template = templates::for_layout(layout);
    let mut cursor = PageCursor::start(geometry, profile, &fonts);
    let mut placements = Vec::with_capacity(records.len());
    for (n, image) in records.iter().zip(&images) {
        log::debug!(
            "Paginating '{}': page {}, y={:.1}mm, {} blocks on page",
            n.record.id,
            cursor.page_number(),
            cursor.y(),
            cursor.items_on_page()
        );
        placements.push(templates::place(&mut cursor, template, &n.record, image, &ctx));
    }
    let finished = cursor.finish();
    let t_layout = t0.elapsed();

    let page_count = finished.contents.len();
    if page_count == 0 {
        return Err(Error::Pdf("layout produced no pages".into()));
    }
    let page_ids: Vec<Ref> = (0..page_count).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..page_count).map(|_| alloc()).collect();

    for (content, id) in finished.contents.into_iter().zip(&content_ids) {
        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(*id, &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(pdf_count(page_count, "pages")?);

    let font_pairs = [
        (fonts.regular.pdf_name.clone(), fonts.regular.font_ref),
        (fonts.bold.pdf_name.clone(), fonts.bold.font_ref),
    ];
    let media_box = Rect::new(0.0, 0.0, geometry.width * MM, geometry.height * MM);
    for (page_id, content_id) in page_ids.iter().zip(&content_ids) {
        let mut page = pdf.page(*page_id);
        page.media_box(media_box)
            .parent(pages_id)
            .contents(*content_id);
        let mut resources = page.resources();
        {
            let mut fonts = resources.fonts();
            for (name, font_ref) in &font_pairs {
                fonts.pair(Name(name.as_bytes()), *font_ref);
            }
        }
        if !image_xobjects.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in &image_xobjects {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }

    let title = config.document_title();
    pdf.document_info(info_id)
        .title(TextStr(&title))
        .creator(TextStr(&config.app_name))
        .producer(TextStr(concat!("archifolio-pdf ", env!("CARGO_PKG_VERSION"))));

    let report = RenderReport {
        layout,
        pages: pdf_count(page_count, "pages")? as u32,
        footer_numbers: finished.footer_numbers,
        placements,
    };
    let bytes = pdf.finish();
    let t_assembly = t0.elapsed();

    log::info!(
        "Render phases: fonts={:.1}ms, images={:.1}ms, layout={:.1}ms, assembly={:.1}ms ({} pages, {} bytes)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_images - t_fonts).as_secs_f64() * 1000.0,
        (t_layout - t_images).as_secs_f64() * 1000.0,
        (t_assembly - t_layout).as_secs_f64() * 1000.0,
        report.pages,
        bytes.len(),
    );

    Ok(RenderedDocument { bytes, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NormalizedRecord;
    use crate::pdf::templates::test_support::record;

    fn loaded(id: &str, bitmap: Bitmap) -> NormalizedRecord {
        NormalizedRecord {
            record: record(id, "Casa"),
            image: ImageSlot::Loaded(bitmap),
        }
    }

    fn rgb(w: u32, h: u32, samples: usize) -> Bitmap {
        Bitmap {
            pixel_width: w,
            pixel_height: h,
            data: BitmapData::Rgb {
                samples: vec![128; samples],
                alpha: None,
            },
        }
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = render(&[], Layout::Full, &ExportConfig::default()).err();
        assert!(matches!(err, Some(Error::EmptySelection)));
    }

    #[test]
    fn writes_one_page_object_per_page() {
        let records: Vec<_> = (0..7)
            .map(|i| NormalizedRecord::without_image(record(&i.to_string(), "Scuola")))
            .collect();
        let doc = render(&records, Layout::Compact, &ExportConfig::default()).unwrap();
        assert!(doc.bytes.starts_with(b"%PDF"));
        assert_eq!(doc.report.pages, 2);
        assert_eq!(count(&doc.bytes, b"/MediaBox"), 2);
    }

    #[test]
    fn valid_bitmap_is_embedded() {
        let doc = render(&[loaded("1", rgb(2, 2, 12))], Layout::Full, &ExportConfig::default()).unwrap();
        assert_eq!(doc.report.placements[0].image, ImageOutcome::Embedded);
        assert_eq!(count(&doc.bytes, b"/Im1"), 1);
    }

    #[test]
    fn malformed_bitmap_falls_back_to_placeholder() {
        let doc = render(
            &[loaded("1", rgb(2, 2, 5)), loaded("2", rgb(0, 4, 0))],
            Layout::Full,
            &ExportConfig::default(),
        )
        .unwrap();
        assert_eq!(
            doc.report.placements[0].image,
            ImageOutcome::Placeholder(PlaceholderReason::Embed(EmbedError::SampleLength {
                expected: 12,
                actual: 5
            }))
        );
        assert_eq!(
            doc.report.placements[1].image,
            ImageOutcome::Placeholder(PlaceholderReason::Embed(EmbedError::EmptyBitmap {
                width: 0,
                height: 4
            }))
        );
    }

    #[test]
    fn text_only_ignores_loaded_images() {
        let doc = render(&[loaded("1", rgb(2, 2, 12))], Layout::TextOnly, &ExportConfig::default()).unwrap();
        assert_eq!(doc.report.placements[0].image, ImageOutcome::NoImage);
        assert_eq!(count(&doc.bytes, b"/Im1"), 0);
    }

    #[test]
    fn used_chars_cover_record_text() {
        let records = vec![NormalizedRecord::without_image(record("1", "Città"))];
        let used = collect_used_chars(&records, &ExportConfig::default(), Layout::Full);
        for ch in "CITTÀ€–".chars() {
            assert!(used.contains(&ch), "{ch}");
        }
    }
}
