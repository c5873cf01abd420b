use super::{
    DrawContext, DrawnBlock, ImageRef, Template, TextColumn, clamp_lines, draw_fields,
    draw_thumbnail,
};
use crate::fonts::Weight;
use crate::locale::DateStyle;
use crate::model::{Layout, ProjectRecord};
use crate::pdf::Field;
use crate::pdf::layout::{Canvas, TextStyle, wrap_text};

const THUMB_W: f32 = 40.0;
const THUMB_H: f32 = 30.0;
const GUTTER: f32 = 6.0;
const BOTTOM_PADDING: f32 = 5.0;
const RULE_COLOR: [u8; 3] = [220, 220, 220];

const TITLE: TextStyle = TextStyle::new(Weight::Bold, 10.0, [30, 30, 30]);
const DETAIL: TextStyle = TextStyle::new(Weight::Regular, 8.5, [90, 90, 90]);

/// Six records per page with a small thumbnail and a separator rule.
pub(crate) struct CompactTemplate;

impl Template for CompactTemplate {
    fn layout(&self) -> Layout {
        Layout::Compact
    }

    fn required_height(&self, _record: &ProjectRecord, ctx: &DrawContext) -> f32 {
        ctx.slot_height(6)
    }

    fn draw(
        &self,
        canvas: &mut Canvas,
        top: f32,
        record: &ProjectRecord,
        image: &ImageRef,
        ctx: &DrawContext,
    ) -> DrawnBlock {
        let slot = ctx.slot_height(6);
        let g = ctx.geometry;
        let thumb_h = THUMB_H.min(slot - BOTTOM_PADDING - 2.0);
        let image = draw_thumbnail(canvas, image, g.margin, top, THUMB_W, thumb_h);

        let column = TextColumn {
            x: g.margin + THUMB_W + GUTTER,
            width: g.content_width() - THUMB_W - GUTTER,
        };
        let title_lines = clamp_lines(
            wrap_text(&record.name, column.width, ctx.fonts.get(TITLE.weight), TITLE.size),
            2,
        );
        let mut baseline = top + TITLE.ascent(ctx.fonts);
        baseline = canvas.text_lines(ctx.fonts, &TITLE, column.x, baseline, &title_lines);

        let date = ctx.date_label(record, DateStyle::Numeric);
        baseline = canvas.text_lines(ctx.fonts, &DETAIL, column.x, baseline, &[date]);
        baseline += 1.0;

        let fields = vec![
            (Field::Client, record.client.clone()),
            (Field::Service, record.service.clone()),
        ];
        let omitted = draw_fields(
            canvas,
            ctx,
            &DETAIL,
            column,
            baseline,
            top + slot - BOTTOM_PADDING,
            fields,
        );

        let rule_y = top + slot - BOTTOM_PADDING / 2.0;
        canvas.line(g.margin, rule_y, g.width - g.margin, rule_y, 0.2, RULE_COLOR);

        DrawnBlock { image, omitted }
    }
}
