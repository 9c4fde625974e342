use crate::error::Result;
use crate::step::{split, split_lines};
use crate::text::TextLayoutMeasurer;
use crate::theme::Theme;
use std::fmt::Write;

pub const CANVAS_WIDTH: i32 = 840;
pub const BOX_X: i32 = 40;
pub const BOX_WIDTH: i32 = 760;
pub const FIRST_BOX_Y: i32 = 60;
pub const SPACING: i32 = 32;
pub const PADDING_TOP: i32 = 30;
pub const PADDING_BOTTOM: i32 = 30;
pub const PADDING_LEFT: i32 = 30;
pub const PADDING_RIGHT: i32 = 15;
pub const HEADER_LINE_HEIGHT: i32 = 22;
pub const BODY_LINE_HEIGHT: i32 = 18;
pub const HEADER_FONT_SIZE: f32 = 14.0;
pub const BODY_FONT_SIZE: f32 = 12.0;
const CAPTION_Y: i32 = 30;
const FIRST_LINE_INDENT: i32 = 20;
const ARROW_CLEARANCE: i32 = 11;

/// Geometry and wrapped text of one drawn step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub header_lines: Vec<String>,
    pub body_lines: Vec<String>,
}

impl LayoutBox {
    pub fn center_x(&self) -> i32 {
        self.x + self.width / 2
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connector {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

#[derive(Debug, Clone)]
pub struct SvgDiagram {
    pub svg: String,
    pub width: i32,
    pub height: i32,
    pub boxes: Vec<LayoutBox>,
    pub connectors: Vec<Connector>,
}

pub struct SvgDiagramBuilder<'a> {
    theme: &'a Theme,
    measurer: TextLayoutMeasurer,
}

impl<'a> SvgDiagramBuilder<'a> {
    pub fn new(theme: &'a Theme, measurer: TextLayoutMeasurer) -> Self {
        Self { theme, measurer }
    }

    pub fn build(&self, steps: &[String], caption: &str) -> Result<SvgDiagram> {
        let theme = self.theme;
        let mut body = String::new();

        let _ = write!(
            body,
            "<text x=\"{}\" y=\"{CAPTION_Y}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" font-weight=\"bold\" fill=\"{}\">{}</text>",
            CANVAS_WIDTH / 2,
            escape_xml(&theme.font_family),
            theme.caption_font_size,
            theme.text_color,
            escape_xml(caption)
        );
        let _ = write!(
            body,
            "<defs><marker id=\"arrowhead\" markerWidth=\"10\" markerHeight=\"7\" refX=\"5\" refY=\"3.5\" orient=\"auto\"><polygon points=\"0 0, 10 3.5, 0 7\" fill=\"{}\"/></marker></defs>",
            theme.edge_color
        );

        let mut boxes = Vec::with_capacity(steps.len());
        let mut current_y = FIRST_BOX_Y;
        for step in steps {
            let (header_lines, body_lines) = self.wrap_step(step)?;
            let height = box_height_for(header_lines.len(), body_lines.len());
            let layout = LayoutBox {
                x: BOX_X,
                y: current_y,
                width: BOX_WIDTH,
                height,
                header_lines,
                body_lines,
            };
            body.push_str(&self.box_svg(&layout));
            current_y += height + SPACING;
            boxes.push(layout);
        }

        let mut connectors = Vec::with_capacity(boxes.len().saturating_sub(1));
        for (idx, pair) in boxes.windows(2).enumerate() {
            let next_height = self.box_height(&steps[idx + 1])?;
            let connector = Connector {
                x1: pair[0].center_x(),
                y1: pair[0].bottom(),
                x2: pair[1].center_x(),
                y2: pair[1].bottom() - next_height - ARROW_CLEARANCE,
            };
            let _ = write!(
                body,
                "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"2\" marker-end=\"url(#arrowhead)\"/>",
                connector.x1, connector.y1, connector.x2, connector.y2, theme.edge_color
            );
            connectors.push(connector);
        }

        let height = self.canvas_height(steps)?;
        let width = CANVAS_WIDTH;
        tracing::debug!(boxes = boxes.len(), width, height, "laid out svg diagram");

        let mut svg = String::with_capacity(body.len() + 160);
        let _ = write!(
            svg,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
        );
        svg.push_str(&body);
        svg.push_str("</svg>");

        Ok(SvgDiagram {
            svg,
            width,
            height,
            boxes,
            connectors,
        })
    }

    /// Wrapped header and body lines of one step. The body is wrapped one
    /// paragraph at a time and slightly narrower than the header.
    pub fn wrap_step(&self, raw: &str) -> Result<(Vec<String>, Vec<String>)> {
        let family = self.theme.font_family.as_str();
        let text = split(raw);
        let header_lines = match text.header.as_deref() {
            Some(header) => {
                self.measurer
                    .wrap(header, family, HEADER_FONT_SIZE, BOX_WIDTH as f32)?
            }
            None => Vec::new(),
        };
        let mut body_lines = Vec::new();
        for paragraph in split_lines(&text.body) {
            body_lines.extend(self.measurer.wrap(
                &paragraph,
                family,
                BODY_FONT_SIZE,
                (BOX_WIDTH - PADDING_RIGHT) as f32,
            )?);
        }
        Ok((header_lines, body_lines))
    }

    /// Height of the box drawn for `raw`, computed from scratch.
    pub fn box_height(&self, raw: &str) -> Result<i32> {
        let (header_lines, body_lines) = self.wrap_step(raw)?;
        Ok(box_height_for(header_lines.len(), body_lines.len()))
    }

    /// Sum of box heights and gaps plus top and bottom padding.
    pub fn canvas_height(&self, steps: &[String]) -> Result<i32> {
        let mut total = 0;
        for (idx, step) in steps.iter().enumerate() {
            total += self.box_height(step)?;
            if idx + 1 < steps.len() {
                total += SPACING;
            }
        }
        Ok(total + PADDING_TOP + PADDING_BOTTOM)
    }

    fn box_svg(&self, layout: &LayoutBox) -> String {
        let theme = self.theme;
        let family = escape_xml(&theme.font_family);
        let center_x = layout.center_x();
        let mut out = String::new();

        let _ = write!(
            out,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"8\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
            layout.x, layout.y, layout.width, layout.height, theme.box_fill, theme.box_stroke
        );
        let _ = write!(
            out,
            "<text x=\"{center_x}\" y=\"{}\" text-anchor=\"middle\" font-family=\"{family}\" fill=\"{}\">",
            layout.y + PADDING_TOP,
            theme.text_color
        );
        for (idx, line) in layout.header_lines.iter().enumerate() {
            let dy = if idx == 0 { 0 } else { HEADER_LINE_HEIGHT };
            let _ = write!(
                out,
                "<tspan x=\"{center_x}\" dy=\"{dy}\" font-size=\"{HEADER_FONT_SIZE}\" font-weight=\"bold\">{}</tspan>",
                escape_xml(line)
            );
        }
        let left_x = layout.x + PADDING_LEFT;
        for (idx, line) in layout.body_lines.iter().enumerate() {
            if idx == 0 {
                let _ = write!(
                    out,
                    "<tspan x=\"{left_x}\" dy=\"{}\" dx=\"{FIRST_LINE_INDENT}\"",
                    BODY_LINE_HEIGHT * 2
                );
            } else {
                let _ = write!(out, "<tspan x=\"{left_x}\" dy=\"{BODY_LINE_HEIGHT}\"");
            }
            let _ = write!(
                out,
                " font-size=\"{BODY_FONT_SIZE}\" text-anchor=\"start\" font-family=\"{family}\" font-weight=\"normal\">{}</tspan>",
                escape_xml(line)
            );
        }
        out.push_str("</text>");
        out
    }
}

/// Padding is counted twice on purpose: top padding above the text and the
/// same amount again below it.
fn box_height_for(header_lines: usize, body_lines: usize) -> i32 {
    PADDING_TOP
        + header_lines as i32 * HEADER_LINE_HEIGHT
        + body_lines as i32 * BODY_LINE_HEIGHT
        + PADDING_BOTTOM
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(theme: &Theme) -> SvgDiagramBuilder<'_> {
        SvgDiagramBuilder::new(theme, TextLayoutMeasurer::fast())
    }

    fn steps(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn header_and_body_set_box_height() {
        let theme = Theme::classic();
        let diagram = builder(&theme)
            .build(&steps(&["**Step One**\nDo the first thing."]), "Demo")
            .unwrap();
        let layout = &diagram.boxes[0];
        assert_eq!(layout.header_lines, vec!["Step One"]);
        assert_eq!(layout.body_lines, vec!["Do the first thing."]);
        assert_eq!(layout.height, 30 + 22 + 18 + 30);
        assert_eq!(layout.y, FIRST_BOX_Y);
    }

    #[test]
    fn body_paragraphs_wrap_separately() {
        let theme = Theme::classic();
        let diagram = builder(&theme)
            .build(&steps(&["**H**\nline one\nline two"]), "Demo")
            .unwrap();
        let layout = &diagram.boxes[0];
        assert_eq!(layout.body_lines, vec!["line one", "line two"]);
        assert_eq!(layout.height, 118);
    }

    #[test]
    fn canvas_height_bounds_all_boxes() {
        let theme = Theme::classic();
        let input = steps(&["**A**\nfirst", "second without header", "**C**"]);
        let diagram = builder(&theme).build(&input, "Demo").unwrap();
        let heights: i32 = diagram.boxes.iter().map(|b| b.height).sum();
        assert_eq!(diagram.height, heights + 2 * SPACING + PADDING_TOP + PADDING_BOTTOM);
        let last = diagram.boxes.last().unwrap();
        assert_eq!(last.bottom(), diagram.height);
        assert!(diagram.svg.contains(&format!("viewBox=\"0 0 840 {}\"", diagram.height)));
    }

    #[test]
    fn boxes_never_overlap() {
        let theme = Theme::classic();
        let long = "word ".repeat(200);
        let input = steps(&["**A**\nshort", format!("**B**\n{long}").as_str(), "c"]);
        let diagram = builder(&theme).build(&input, "Demo").unwrap();
        for pair in diagram.boxes.windows(2) {
            assert!(pair[1].y >= pair[0].bottom() + SPACING);
            assert!(pair[1].y + pair[1].height / 2 > pair[0].y + pair[0].height / 2);
        }
        assert!(diagram.boxes[1].body_lines.len() > 1);
    }

    #[test]
    fn recomputed_height_matches_drawn_height() {
        let theme = Theme::classic();
        let b = builder(&theme);
        let long = "several words that wrap ".repeat(40);
        let input = steps(&["**Head**\nbody", format!("**Long header**\n{long}").as_str(), "tail"]);
        let diagram = b.build(&input, "Demo").unwrap();
        for (step, layout) in input.iter().zip(&diagram.boxes) {
            assert_eq!(b.box_height(step).unwrap(), layout.height);
        }
    }

    #[test]
    fn connectors_end_just_above_next_box() {
        let theme = Theme::classic();
        let diagram = builder(&theme)
            .build(&steps(&["**A**\na", "**B**\nb", "**C**\nc"]), "Demo")
            .unwrap();
        assert_eq!(diagram.connectors.len(), 2);
        for (idx, connector) in diagram.connectors.iter().enumerate() {
            assert_eq!(connector.y1, diagram.boxes[idx].bottom());
            assert_eq!(connector.y2, diagram.boxes[idx + 1].y - ARROW_CLEARANCE);
            assert_eq!(connector.x1, BOX_X + BOX_WIDTH / 2);
        }
        assert_eq!(diagram.svg.matches("marker-end=\"url(#arrowhead)\"").count(), 2);
        assert_eq!(diagram.svg.matches("<marker ").count(), 1);
    }

    #[test]
    fn caption_only_diagram_is_valid() {
        let theme = Theme::classic();
        let diagram = builder(&theme).build(&[], "Only caption").unwrap();
        assert!(diagram.boxes.is_empty());
        assert!(diagram.connectors.is_empty());
        assert_eq!(diagram.height, PADDING_TOP + PADDING_BOTTOM);
        assert!(diagram.svg.contains("Only caption"));
    }

    #[test]
    fn first_body_line_is_indented_two_lines_down() {
        let theme = Theme::classic();
        let diagram = builder(&theme)
            .build(&steps(&["**H**\nbody one&#xA;body two"]), "Demo")
            .unwrap();
        assert_eq!(diagram.boxes[0].body_lines, vec!["body one", "body two"]);
        assert!(diagram.svg.contains("<tspan x=\"70\" dy=\"36\" dx=\"20\""));
        assert!(diagram.svg.contains("<tspan x=\"70\" dy=\"18\""));
    }

    #[test]
    fn text_is_escaped() {
        let theme = Theme::classic();
        let diagram = builder(&theme)
            .build(&steps(&["a < b & c"]), "x > y")
            .unwrap();
        assert!(diagram.svg.contains("a &lt; b &amp; c"));
        assert!(diagram.svg.contains("x &gt; y"));
    }
}
