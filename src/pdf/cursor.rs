use pdf_writer::Content;

use super::layout::{Align, Canvas, TextStyle};
use crate::config::{FooterStyle, LayoutProfile};
use crate::fonts::{FontSet, Weight};

/// Tolerance when comparing a block's bottom edge with the page limit.
pub(crate) const EPSILON: f32 = 0.001;

const HEADER_BAND: f32 = 20.0;
const FOOTER_TEXT_COLOR: [u8; 3] = [90, 90, 90];
const FOOTER_RULE_COLOR: [u8; 3] = [200, 200, 200];

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PageGeometry {
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) margin: f32,
}

impl PageGeometry {
    pub(crate) const A4: PageGeometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        margin: 20.0,
    };

    pub(crate) fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Blocks must end at or above this line.
    pub(crate) fn bottom_limit(&self) -> f32 {
        self.height - self.margin
    }

    /// Where the first block of a page starts.
    pub(crate) fn content_top(&self, has_header: bool) -> f32 {
        if has_header {
            self.margin + HEADER_BAND
        } else {
            self.margin
        }
    }
}

/// Pages produced by [`PageCursor::finish`].
pub(crate) struct FinishedPages {
    pub(crate) contents: Vec<Content>,
    /// Footer number drawn on each page, in page order.
    pub(crate) footer_numbers: Vec<u32>,
}

/// Tracks the current page and vertical position while records are placed.
///
/// Invariant: `content_top <= y`, and `items_on_page` counts the blocks
/// placed since the last page break.
pub(crate) struct PageCursor<'a> {
    geometry: PageGeometry,
    profile: &'a LayoutProfile,
    fonts: &'a FontSet,
    page_number: u32,
    y: f32,
    items_on_page: usize,
    canvas: Canvas,
    finished: Vec<Content>,
    footer_numbers: Vec<u32>,
}

impl<'a> PageCursor<'a> {
    /// Opens page 1 and draws its header.
    pub(crate) fn start(geometry: PageGeometry, profile: &'a LayoutProfile, fonts: &'a FontSet) -> Self {
        let mut cursor = Self {
            geometry,
            profile,
            fonts,
            page_number: 1,
            y: geometry.content_top(profile.header.is_some()),
            items_on_page: 0,
            canvas: Canvas::new(geometry.height),
            finished: Vec::new(),
            footer_numbers: Vec::new(),
        };
        cursor.draw_header();
        cursor
    }

    pub(crate) fn page_number(&self) -> u32 {
        self.page_number
    }

    pub(crate) fn y(&self) -> f32 {
        self.y
    }

    pub(crate) fn items_on_page(&self) -> usize {
        self.items_on_page
    }

    pub(crate) fn canvas(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// Starts a new page when the current one already holds `items_per_page`
    /// blocks or when a block of `required` mm would cross the bottom limit.
    /// An empty page never breaks, so an oversized block is drawn anyway.
    ///
    /// Returns whether a break happened. At most one break per call.
    pub(crate) fn check_new_page(&mut self, required: f32, items_per_page: Option<usize>) -> bool {
        if self.items_on_page == 0 {
            return false;
        }
        let full = items_per_page.is_some_and(|cap| self.items_on_page >= cap);
        let overflow = self.y + required > self.geometry.bottom_limit() + EPSILON;
        if !(full || overflow) {
            return false;
        }

        log::debug!(
            "Page {} closed with {} blocks (y={:.1}mm, next block {:.1}mm)",
            self.page_number,
            self.items_on_page,
            self.y,
            required
        );
        self.draw_footer();
        let page = std::mem::replace(&mut self.canvas, Canvas::new(self.geometry.height));
        self.finished.push(page.into_content());
        self.page_number += 1;
        self.y = self.geometry.content_top(self.profile.header.is_some());
        self.items_on_page = 0;
        self.draw_header();
        true
    }

    /// Records a placed block of `height` mm.
    pub(crate) fn advance(&mut self, height: f32) {
        self.y += height;
        self.items_on_page += 1;
    }

    /// Draws the footer of the last page and hands back all page streams.
    pub(crate) fn finish(mut self) -> FinishedPages {
        self.draw_footer();
        self.finished.push(self.canvas.into_content());
        FinishedPages {
            contents: self.finished,
            footer_numbers: self.footer_numbers,
        }
    }

    fn draw_header(&mut self) {
        let Some(header) = &self.profile.header else {
            return;
        };
        let g = self.geometry;
        let rule_y = g.margin + 5.0;
        let style = TextStyle::new(Weight::Regular, 9.0, header.rule_color);
        let label = header.label_for(self.page_number);
        self.canvas.text(
            self.fonts,
            &style,
            g.width - g.margin,
            rule_y - 2.0,
            &label,
            Align::Right,
        );
        self.canvas
            .line(g.margin, rule_y, g.width - g.margin, rule_y, 0.3, header.rule_color);
    }

    fn draw_footer(&mut self) {
        let g = self.geometry;
        let style = TextStyle::new(Weight::Regular, 9.0, FOOTER_TEXT_COLOR);
        match &self.profile.footer {
            FooterStyle::PageNumber => {
                let label = self.page_number.to_string();
                self.canvas.text(
                    self.fonts,
                    &style,
                    g.width / 2.0,
                    g.height - g.margin / 2.0,
                    &label,
                    Align::Center,
                );
            }
            FooterStyle::Text(text) => {
                let rule_y = g.bottom_limit() + 8.0;
                self.canvas
                    .line(g.margin, rule_y, g.width - g.margin, rule_y, 0.2, FOOTER_RULE_COLOR);
                self.canvas
                    .text(self.fonts, &style, g.width - g.margin, rule_y + 4.0, text, Align::Right);
            }
        }
        self.footer_numbers.push(self.page_number);
    }
}
