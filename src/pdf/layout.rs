use pdf_writer::{Content, Name, Str};

use crate::fonts::{FontEntry, FontSet, Weight};

/// Points per millimetre. Layout math is done in millimetres from the top-left
/// corner of the page; the canvas converts to PDF user space.
pub(crate) const MM: f32 = 72.0 / 25.4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Align {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct TextStyle {
    pub(crate) weight: Weight,
    pub(crate) size: f32, // points
    pub(crate) color: [u8; 3],
}

impl TextStyle {
    pub(crate) const fn new(weight: Weight, size: f32, color: [u8; 3]) -> Self {
        Self {
            weight,
            size,
            color,
        }
    }

    /// Distance between consecutive baselines, in mm.
    pub(crate) fn line_height(&self) -> f32 {
        self.size * 1.15 / MM
    }

    /// Distance from the top of a text box to the first baseline, in mm.
    pub(crate) fn ascent(&self, fonts: &FontSet) -> f32 {
        self.size * fonts.get(self.weight).ascender_ratio / MM
    }
}

fn split_long_word(word: &str, max_pt: f32, font: &FontEntry, size: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for ch in word.chars() {
        let mut candidate = piece.clone();
        candidate.push(ch);
        if !piece.is_empty() && font.text_width(&candidate, size) > max_pt {
            pieces.push(std::mem::take(&mut piece));
            piece.push(ch);
        } else {
            piece = candidate;
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Greedy word wrap to `max_width` mm. Explicit newlines start a new line;
/// words wider than the column are broken between characters.
pub(crate) fn wrap_text(text: &str, max_width: f32, font: &FontEntry, size: f32) -> Vec<String> {
    let max_pt = max_width * MM;
    let space_w = font.text_width(" ", size);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_w = 0.0f32;

        for word in paragraph.split_whitespace() {
            let ww = font.text_width(word, size);
            if ww > max_pt {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let mut pieces = split_long_word(word, max_pt, font, size);
                if let Some(last) = pieces.pop() {
                    lines.extend(pieces);
                    current_w = font.text_width(&last, size);
                    current = last;
                }
                continue;
            }

            if current.is_empty() {
                current.push_str(word);
                current_w = ww;
            } else if current_w + space_w + ww > max_pt {
                lines.push(std::mem::replace(&mut current, word.to_string()));
                current_w = ww;
            } else {
                current.push(' ');
                current.push_str(word);
                current_w += space_w + ww;
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// One page's content stream, addressed in millimetres from the top-left.
pub(crate) struct Canvas {
    content: Content,
    page_height: f32,
}

fn rgb(color: [u8; 3]) -> (f32, f32, f32) {
    (
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
    )
}

impl Canvas {
    pub(crate) fn new(page_height: f32) -> Self {
        Self {
            content: Content::new(),
            page_height,
        }
    }

    fn y_pt(&self, y: f32) -> f32 {
        (self.page_height - y) * MM
    }

    pub(crate) fn text(
        &mut self,
        fonts: &FontSet,
        style: &TextStyle,
        x: f32,
        baseline: f32,
        text: &str,
        align: Align,
    ) {
        if text.is_empty() {
            return;
        }
        let font = fonts.get(style.weight);
        let width_pt = font.text_width(text, style.size);
        let x_pt = match align {
            Align::Left => x * MM,
            Align::Center => x * MM - width_pt / 2.0,
            Align::Right => x * MM - width_pt,
        };
        let (r, g, b) = rgb(style.color);
        let y_pt = self.y_pt(baseline);
        self.content
            .set_fill_rgb(r, g, b)
            .begin_text()
            .set_font(Name(font.pdf_name.as_bytes()), style.size)
            .next_line(x_pt, y_pt)
            .show(Str(&font.encode(text)))
            .end_text();
    }

    /// Draws left-aligned lines starting at `baseline`; returns the baseline
    /// that would follow the last line.
    pub(crate) fn text_lines(
        &mut self,
        fonts: &FontSet,
        style: &TextStyle,
        x: f32,
        baseline: f32,
        lines: &[String],
    ) -> f32 {
        let mut y = baseline;
        for line in lines {
            self.text(fonts, style, x, y, line, Align::Left);
            y += style.line_height();
        }
        y
    }

    pub(crate) fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: [u8; 3]) {
        let (r, g, b) = rgb(color);
        let (y1, y2) = (self.y_pt(y1), self.y_pt(y2));
        self.content
            .save_state()
            .set_stroke_rgb(r, g, b)
            .set_line_width(width * MM)
            .move_to(x1 * MM, y1)
            .line_to(x2 * MM, y2)
            .stroke()
            .restore_state();
    }

    pub(crate) fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: [u8; 3]) {
        let (r, g, b) = rgb(color);
        let bottom = self.y_pt(y + h);
        self.content
            .save_state()
            .set_fill_rgb(r, g, b)
            .rect(x * MM, bottom, w * MM, h * MM)
            .fill_nonzero()
            .restore_state();
    }

    pub(crate) fn image(&mut self, name: &str, x: f32, y: f32, w: f32, h: f32) {
        let bottom = self.y_pt(y + h);
        self.content
            .save_state()
            .transform([w * MM, 0.0, 0.0, h * MM, x * MM, bottom])
            .x_object(Name(name.as_bytes()))
            .restore_state();
    }

    pub(crate) fn into_content(self) -> Content {
        self.content
    }
}

#[cfg(test)]
impl Canvas {
    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.content.finish().as_slice().to_vec()
    }

    /// Every text baseline drawn so far, in mm from the top of the page.
    pub(crate) fn into_baselines(self) -> Vec<f32> {
        let page_height = self.page_height;
        let bytes = self.into_bytes();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter_map(|line| {
                let mut tokens = line.split_whitespace().rev();
                if tokens.next()? != "Td" {
                    return None;
                }
                let y_pt: f32 = tokens.next()?.parse().ok()?;
                Some(page_height - y_pt / MM)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fonts() -> FontSet {
        FontSet::helvetica_metrics()
    }

    #[test]
    fn short_text_is_one_line() {
        let f = fonts();
        assert_eq!(wrap_text("Villa al mare", 100.0, &f.regular, 9.0), vec!["Villa al mare"]);
    }

    #[test]
    fn empty_text_has_no_lines() {
        let f = fonts();
        assert!(wrap_text("", 50.0, &f.regular, 9.0).is_empty());
        assert!(wrap_text("   ", 50.0, &f.regular, 9.0).is_empty());
    }

    #[test]
    fn wraps_on_word_boundaries_within_width() {
        let f = fonts();
        let text = "Restauro e consolidamento strutturale di un edificio storico vincolato";
        let width = 40.0;
        let lines = wrap_text(text, width, &f.regular, 9.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(f.regular.text_width(line, 9.0) <= width * MM + 1e-3, "{line}");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn breaks_overlong_words() {
        let f = fonts();
        let word = "x".repeat(200);
        let lines = wrap_text(&word, 20.0, &f.regular, 9.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn honours_newlines() {
        let f = fonts();
        assert_eq!(wrap_text("a\nb", 100.0, &f.regular, 9.0), vec!["a", "b"]);
    }

    #[test]
    fn baselines_read_back_in_millimetres() {
        let f = fonts();
        let style = TextStyle::new(Weight::Regular, 9.0, [0, 0, 0]);
        let mut canvas = Canvas::new(297.0);
        let lines = vec!["uno".to_string(), "due".into()];
        let next = canvas.text_lines(&f, &style, 20.0, 50.0, &lines);
        let baselines = canvas.into_baselines();
        assert_eq!(baselines.len(), 2);
        assert!((baselines[0] - 50.0).abs() < 1e-2);
        assert!((baselines[1] - (50.0 + style.line_height())).abs() < 1e-2);
        assert!((next - (50.0 + 2.0 * style.line_height())).abs() < 1e-4);
    }

    #[test]
    fn line_height_scales_with_size() {
        let small = TextStyle::new(Weight::Regular, 8.0, [0, 0, 0]);
        let big = TextStyle::new(Weight::Regular, 16.0, [0, 0, 0]);
        assert!((big.line_height() - 2.0 * small.line_height()).abs() < 1e-5);
    }
}
