use super::{DrawContext, DrawnBlock, ImageRef, Template, clamp_lines};
use crate::fonts::Weight;
use crate::locale::DateStyle;
use crate::model::{Layout, ProjectRecord};
use crate::pdf::ImageOutcome;
use crate::pdf::layout::{Align, Canvas, TextStyle, wrap_text};

const LABEL_W: f32 = 38.0;
const RULE_OFFSET: f32 = 42.0;
const VALUE_OFFSET: f32 = 46.0;
const PADDING: f32 = 4.0;
const ROW_GAP: f32 = 1.5;
const RULE_COLOR: [u8; 3] = [200, 200, 200];

const LABEL: TextStyle = TextStyle::new(Weight::Regular, 8.5, [120, 120, 120]);
const VALUE: TextStyle = TextStyle::new(Weight::Regular, 10.0, [30, 30, 30]);
const TITLE: TextStyle = TextStyle::new(Weight::Bold, 10.0, [30, 30, 30]);

struct Row {
    label: Vec<String>,
    value: Vec<String>,
    style: TextStyle,
    height: f32,
}

impl Row {
    fn label_height(&self) -> f32 {
        self.label.len() as f32 * LABEL.line_height()
    }

    /// Height with a single value line.
    fn min_height(&self) -> f32 {
        self.label_height().max(self.style.line_height())
    }

    fn fit_height(&mut self) {
        self.height = self
            .label_height()
            .max(self.value.len() as f32 * self.style.line_height())
            .max(self.style.line_height());
    }
}

/// Label/value table per record, as tall as its wrapped text.
pub(crate) struct TextOnlyTemplate;

impl TextOnlyTemplate {
    fn rows(&self, record: &ProjectRecord, ctx: &DrawContext) -> Vec<Row> {
        let labels = &ctx.locale.labels;
        let value_w = ctx.geometry.content_width() - VALUE_OFFSET;
        let rows = [
            (&labels.date, ctx.date_label(record, DateStyle::LongMonth), VALUE),
            (&labels.client, record.client.clone(), VALUE),
            (&labels.title, record.name.clone(), TITLE),
            (&labels.service, record.service.clone(), VALUE),
        ]
        .into_iter()
        .map(|(label, value, style)| {
            let mut row = Row {
                label: wrap_text(label, LABEL_W, ctx.fonts.get(LABEL.weight), LABEL.size),
                value: wrap_text(&value, value_w, ctx.fonts.get(style.weight), style.size),
                style,
                height: 0.0,
            };
            row.fit_height();
            row
        })
        .collect();
        Self::fit_to(rows, ctx.printable_height())
    }

    /// Drops value lines from the first row that overflows `max_height`, and
    /// from every row after it, so the block fits on one page.
    fn fit_to(mut rows: Vec<Row>, max_height: f32) -> Vec<Row> {
        let minimum = Self::measure_with(&rows, Row::min_height);
        let mut spare = (max_height - minimum).max(0.0);
        for row in &mut rows {
            let extra = row.height - row.min_height();
            if extra > spare {
                let room = ((row.min_height() + spare) / row.style.line_height()).floor() as usize;
                row.value = clamp_lines(std::mem::take(&mut row.value), room.max(1));
                row.fit_height();
            }
            spare = (spare - (row.height - row.min_height())).max(0.0);
        }
        rows
    }

    fn measure(rows: &[Row]) -> f32 {
        Self::measure_with(rows, |r| r.height)
    }

    fn measure_with(rows: &[Row], height: impl Fn(&Row) -> f32) -> f32 {
        let body: f32 = rows.iter().map(height).sum();
        let gaps = ROW_GAP * rows.len().saturating_sub(1) as f32;
        2.0 * PADDING + body + gaps
    }
}

impl Template for TextOnlyTemplate {
    fn layout(&self) -> Layout {
        Layout::TextOnly
    }

    fn date_style(&self) -> DateStyle {
        DateStyle::LongMonth
    }

    fn required_height(&self, record: &ProjectRecord, ctx: &DrawContext) -> f32 {
        Self::measure(&self.rows(record, ctx))
    }

    fn draw(
        &self,
        canvas: &mut Canvas,
        top: f32,
        record: &ProjectRecord,
        _image: &ImageRef,
        ctx: &DrawContext,
    ) -> DrawnBlock {
        let rows = self.rows(record, ctx);
        let height = Self::measure(&rows);
        let left = ctx.geometry.margin;

        let mut y = top + PADDING;
        for row in &rows {
            let mut baseline = y + LABEL.ascent(ctx.fonts);
            for line in &row.label {
                canvas.text(ctx.fonts, &LABEL, left, baseline, line, Align::Left);
                baseline += LABEL.line_height();
            }
            let baseline = y + row.style.ascent(ctx.fonts);
            canvas.text_lines(ctx.fonts, &row.style, left + VALUE_OFFSET, baseline, &row.value);
            y += row.height + ROW_GAP;
        }

        let rule_x = left + RULE_OFFSET;
        canvas.line(rule_x, top + PADDING, rule_x, top + height - PADDING, 0.3, RULE_COLOR);

        DrawnBlock {
            image: ImageOutcome::NoImage,
            omitted: Vec::new(),
        }
    }
}
