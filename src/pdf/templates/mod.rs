//! Layout strategies. Each template knows how tall a record's block is and
//! how to draw it at a given top edge; pagination is shared in [`place`].

mod compact;
mod full;
mod text_only;

pub(crate) use compact::CompactTemplate;
pub(crate) use full::FullTemplate;
pub(crate) use text_only::TextOnlyTemplate;

use super::cursor::{EPSILON, PageCursor, PageGeometry};
use super::layout::{Canvas, TextStyle, wrap_text};
use super::{Field, ImageOutcome, PlaceholderReason, Placement};
use crate::fonts::FontSet;
use crate::locale::{DateStyle, Locale};
use crate::model::{Layout, ProjectRecord};

pub(crate) const PLACEHOLDER_FILL: [u8; 3] = [245, 245, 245];

/// What the template may draw in a record's image slot.
#[derive(Clone, Debug)]
pub(crate) enum ImageRef {
    /// No image was requested for this record.
    NotShown,
    /// Embedded XObject resource name and its width/height ratio.
    XObject { name: String, aspect: f32 },
    Unavailable(PlaceholderReason),
}

/// Read-only state shared by every block of one document.
pub(crate) struct DrawContext<'a> {
    pub(crate) fonts: &'a FontSet,
    pub(crate) locale: &'a Locale,
    pub(crate) geometry: PageGeometry,
    pub(crate) content_top: f32,
}

impl DrawContext<'_> {
    pub(crate) fn printable_height(&self) -> f32 {
        self.geometry.bottom_limit() - self.content_top
    }

    /// Fixed block height for layouts that place `per_page` blocks per page.
    pub(crate) fn slot_height(&self, per_page: usize) -> f32 {
        self.printable_height() / per_page.max(1) as f32
    }

    pub(crate) fn date_label(&self, record: &ProjectRecord, style: DateStyle) -> String {
        self.locale
            .format_date_range(record.start_date, record.end_date, record.status, style)
    }
}

/// Left edge and width of a text column, in mm.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TextColumn {
    pub(crate) x: f32,
    pub(crate) width: f32,
}

pub(crate) struct DrawnBlock {
    pub(crate) image: ImageOutcome,
    pub(crate) omitted: Vec<Field>,
}

pub(crate) trait Template {
    fn layout(&self) -> Layout;

    fn items_per_page(&self) -> Option<usize> {
        self.layout().items_per_page()
    }

    fn date_style(&self) -> DateStyle {
        DateStyle::Numeric
    }

    /// Height in mm the block for `record` occupies, including its spacing.
    fn required_height(&self, record: &ProjectRecord, ctx: &DrawContext) -> f32;

    fn draw(
        &self,
        canvas: &mut Canvas,
        top: f32,
        record: &ProjectRecord,
        image: &ImageRef,
        ctx: &DrawContext,
    ) -> DrawnBlock;
}

pub(crate) fn for_layout(layout: Layout) -> &'static dyn Template {
    match layout {
        Layout::Full => &FullTemplate,
        Layout::Compact => &CompactTemplate,
        Layout::TextOnly => &TextOnlyTemplate,
    }
}

/// Measure, break if needed, draw, advance.
pub(crate) fn place(
    cursor: &mut PageCursor,
    template: &dyn Template,
    record: &ProjectRecord,
    image: &ImageRef,
    ctx: &DrawContext,
) -> Placement {
    let required = template.required_height(record, ctx);
    cursor.check_new_page(required, template.items_per_page());
    let top = cursor.y();
    let drawn = template.draw(cursor.canvas(), top, record, image, ctx);
    cursor.advance(required);

    Placement {
        record_id: record.id.clone(),
        page: cursor.page_number(),
        top,
        height: required,
        image: drawn.image,
        date_label: ctx.date_label(record, template.date_style()),
        omitted_fields: drawn.omitted,
    }
}

/// Draws the record image scaled to fit inside the box, or the placeholder.
pub(crate) fn draw_thumbnail(
    canvas: &mut Canvas,
    image: &ImageRef,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
) -> ImageOutcome {
    match image {
        ImageRef::NotShown => ImageOutcome::NoImage,
        ImageRef::XObject { name, aspect } => {
            let (dw, dh) = if *aspect > w / h {
                (w, w / aspect)
            } else {
                (h * aspect, h)
            };
            canvas.image(name, x + (w - dw) / 2.0, y + (h - dh) / 2.0, dw, dh);
            ImageOutcome::Embedded
        }
        ImageRef::Unavailable(reason) => {
            canvas.fill_rect(x, y, w, h, PLACEHOLDER_FILL);
            ImageOutcome::Placeholder(reason.clone())
        }
    }
}

/// How many lines of `line_height` mm fit with the first baseline at
/// `baseline` and no baseline below `bottom`.
pub(crate) fn lines_that_fit(baseline: f32, bottom: f32, line_height: f32) -> usize {
    if baseline > bottom + EPSILON {
        return 0;
    }
    ((bottom - baseline + EPSILON) / line_height).floor() as usize + 1
}

/// Draws labelled fields one after another from `baseline`. A field that only
/// partly fits above `bottom` is cut with an ellipsis and every field after it
/// is left out. Empty values are skipped without counting as omitted.
pub(crate) fn draw_fields(
    canvas: &mut Canvas,
    ctx: &DrawContext,
    style: &TextStyle,
    column: TextColumn,
    mut baseline: f32,
    bottom: f32,
    fields: Vec<(Field, String)>,
) -> Vec<Field> {
    let font = ctx.fonts.get(style.weight);
    let mut omitted = Vec::new();
    for (field, value) in fields {
        if value.trim().is_empty() {
            continue;
        }
        let room = lines_that_fit(baseline, bottom, style.line_height());
        if room == 0 {
            omitted.push(field);
            continue;
        }
        let text = format!("{}: {}", field.label(&ctx.locale.labels), value);
        let lines = clamp_lines(wrap_text(&text, column.width, font, style.size), room);
        baseline = canvas.text_lines(ctx.fonts, style, column.x, baseline, &lines);
    }
    omitted
}

/// Keeps at most `max` lines, marking the cut with an ellipsis.
pub(crate) fn clamp_lines(mut lines: Vec<String>, max: usize) -> Vec<String> {
    if lines.len() > max {
        lines.truncate(max);
        if let Some(last) = lines.last_mut() {
            last.push('\u{2026}');
        }
    }
    lines
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::config::LayoutProfile;
    use crate::error::FetchError;

    #[test]
    fn placeholder_for_unavailable_image() {
        let mut canvas = Canvas::new(297.0);
        let reason = PlaceholderReason::Fetch(FetchError::MissingSource);
        let outcome = draw_thumbnail(
            &mut canvas,
            &ImageRef::Unavailable(reason.clone()),
            20.0,
            20.0,
            80.0,
            60.0,
        );
        assert_eq!(outcome, ImageOutcome::Placeholder(reason));
    }

    #[test]
    fn clamp_marks_truncation() {
        let lines = vec!["a".to_string(), "b".into(), "c".into()];
        assert_eq!(clamp_lines(lines.clone(), 2), vec!["a", "b\u{2026}"]);
        assert_eq!(clamp_lines(lines, 5).len(), 3);
    }

    #[test]
    fn counts_lines_above_the_bottom() {
        assert_eq!(lines_that_fit(10.0, 20.0, 4.0), 3);
        assert_eq!(lines_that_fit(10.0, 18.0, 4.0), 3);
        assert_eq!(lines_that_fit(20.0, 20.0, 4.0), 1);
        assert_eq!(lines_that_fit(20.5, 20.0, 4.0), 0);
    }

    #[test]
    fn partly_fitting_field_is_cut_and_the_rest_omitted() {
        let fonts = FontSet::helvetica_metrics();
        let locale = Locale::default();
        let ctx = context(&fonts, &locale);
        let style = TextStyle::new(crate::fonts::Weight::Regular, 9.0, [0, 0, 0]);
        let column = TextColumn { x: 20.0, width: 60.0 };
        let mut canvas = Canvas::new(297.0);
        let fields = vec![
            (Field::Client, "Consorzio di bonifica ".repeat(40)),
            (Field::Service, "Collaudo".to_string()),
            (Field::Status, String::new()),
        ];
        let omitted = draw_fields(&mut canvas, &ctx, &style, column, 30.0, 50.0, fields);
        assert_eq!(omitted, vec![Field::Service]);

        let baselines = canvas.into_baselines();
        assert_eq!(baselines.len(), lines_that_fit(30.0, 50.0, style.line_height()));
        assert!(baselines.iter().all(|&b| b <= 50.0 + 1e-2), "{baselines:?}");
    }

    #[test]
    fn place_fills_fixed_slots_then_breaks() {
        let fonts = FontSet::helvetica_metrics();
        let locale = Locale::default();
        let ctx = context(&fonts, &locale);
        let profile = LayoutProfile::default();
        let mut cursor = PageCursor::start(ctx.geometry, &profile, &fonts);

        let pages: Vec<u32> = (0..7)
            .map(|i| {
                let rec = record(&i.to_string(), "Scuola primaria");
                place(&mut cursor, &FullTemplate, &rec, &ImageRef::NotShown, &ctx).page
            })
            .collect();
        assert_eq!(pages, vec![1, 1, 1, 2, 2, 2, 3]);
    }

    #[test]
    fn slots_tile_the_printable_area() {
        let fonts = FontSet::helvetica_metrics();
        let locale = Locale::default();
        let ctx = context(&fonts, &locale);
        let profile = LayoutProfile::default();
        let mut cursor = PageCursor::start(ctx.geometry, &profile, &fonts);
        let rec = record("1", "Biblioteca");

        let tops: Vec<f32> = (0..6)
            .map(|_| place(&mut cursor, &CompactTemplate, &rec, &ImageRef::NotShown, &ctx).top)
            .collect();
        let slot = ctx.slot_height(6);
        for (i, top) in tops.iter().enumerate() {
            assert!((top - (ctx.content_top + slot * i as f32)).abs() < 1e-3);
        }
        assert!(tops[5] + slot <= ctx.geometry.bottom_limit() + 1e-3);
    }
}
