use super::{
    DrawContext, DrawnBlock, ImageRef, Template, TextColumn, clamp_lines, draw_fields,
    draw_thumbnail, lines_that_fit,
};
use crate::fonts::Weight;
use crate::locale::DateStyle;
use crate::model::{Layout, ProjectRecord};
use crate::pdf::Field;
use crate::pdf::layout::{Canvas, TextStyle, wrap_text};

const IMAGE_W: f32 = 80.0;
const IMAGE_H: f32 = 60.0;
const GUTTER: f32 = 8.0;
const BOTTOM_PADDING: f32 = 4.0;
const MAX_TITLE_LINES: usize = 3;
const MAX_META_LINES: usize = 2;

const TITLE: TextStyle = TextStyle::new(Weight::Bold, 11.0, [30, 30, 30]);
const META: TextStyle = TextStyle::new(Weight::Regular, 9.0, [110, 110, 110]);
const FIELD: TextStyle = TextStyle::new(Weight::Regular, 9.0, [60, 60, 60]);

/// Three records per page: large image on the left, details on the right.
pub(crate) struct FullTemplate;

impl Template for FullTemplate {
    fn layout(&self) -> Layout {
        Layout::Full
    }

    fn required_height(&self, _record: &ProjectRecord, ctx: &DrawContext) -> f32 {
        ctx.slot_height(3)
    }

    fn draw(
        &self,
        canvas: &mut Canvas,
        top: f32,
        record: &ProjectRecord,
        image: &ImageRef,
        ctx: &DrawContext,
    ) -> DrawnBlock {
        let slot = ctx.slot_height(3);
        let left = ctx.geometry.margin;
        let image_h = IMAGE_H.min(slot - 2.0 * BOTTOM_PADDING);
        let image = draw_thumbnail(canvas, image, left, top, IMAGE_W, image_h);

        let column = TextColumn {
            x: left + IMAGE_W + GUTTER,
            width: ctx.geometry.content_width() - IMAGE_W - GUTTER,
        };
        let bottom = top + slot - BOTTOM_PADDING;

        // The meta line keeps one line of room below the title.
        let mut baseline = top + TITLE.ascent(ctx.fonts);
        let title_room = lines_that_fit(
            baseline,
            bottom - 1.0 - META.line_height(),
            TITLE.line_height(),
        );
        let title_lines = clamp_lines(
            wrap_text(
                &record.name.to_uppercase(),
                column.width,
                ctx.fonts.get(TITLE.weight),
                TITLE.size,
            ),
            title_room.clamp(1, MAX_TITLE_LINES),
        );
        baseline = canvas.text_lines(ctx.fonts, &TITLE, column.x, baseline, &title_lines);
        baseline += 1.0;

        let date = ctx.date_label(record, DateStyle::Numeric);
        let meta = match record.location.trim() {
            "" => date,
            location => format!("{location} \u{b7} {date}"),
        };
        let meta_room = lines_that_fit(baseline, bottom, META.line_height());
        let meta_lines = clamp_lines(
            wrap_text(&meta, column.width, ctx.fonts.get(META.weight), META.size),
            meta_room.min(MAX_META_LINES),
        );
        baseline = canvas.text_lines(ctx.fonts, &META, column.x, baseline, &meta_lines);
        baseline += 3.0;

        let locale = ctx.locale;
        let fields = vec![
            (Field::Client, record.client.clone()),
            (Field::Service, record.service.clone()),
            (Field::Category, record.category.clone()),
            (Field::Amount, locale.format_amount(record.amount)),
            (Field::Status, locale.status_name(record.status).to_string()),
        ];
        let omitted = draw_fields(canvas, ctx, &FIELD, column, baseline, bottom, fields);

        DrawnBlock { image, omitted }
    }
}
