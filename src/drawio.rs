//! Editable drawio (mxGraph) export.
//!
//! Box heights here come from a line-count heuristic, not from measured text:
//! the diagram editor re-flows the HTML labels itself once the file is opened.

use crate::ids::IdSource;
use crate::step::{bold_to_html, split_lines};
use crate::svg::escape_xml;
use crate::theme::Theme;
use chrono::{DateTime, Utc};
use std::fmt::Write;

const BOX_X: i32 = 40;
const BOX_WIDTH: i32 = 760;
const CAPTION_Y: i32 = 30;
const CAPTION_HEIGHT: i32 = 30;
const FIRST_BOX_Y: i32 = 85;
const BASE_HEIGHT: i32 = 80;
const EXTRA_LINE_HEIGHT: i32 = 20;
const VERTICAL_SPACING: i32 = 32;

const HOST: &str = "Electron";
const AGENT: &str = concat!("stepchart/", env!("CARGO_PKG_VERSION"));
const EDITOR_VERSION: &str = "24.6.1";
const PAGE_NAME: &str = "Page-1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawioBox {
    pub id: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawioEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone)]
pub struct DrawioDocument {
    pub xml: String,
    pub caption_id: String,
    pub boxes: Vec<DrawioBox>,
    pub edges: Vec<DrawioEdge>,
}

impl DrawioDocument {
    pub fn into_bytes(self) -> Vec<u8> {
        self.xml.into_bytes()
    }
}

pub struct MxGraphDiagramBuilder<'a> {
    theme: &'a Theme,
    ids: &'a dyn IdSource,
    modified: DateTime<Utc>,
}

impl<'a> MxGraphDiagramBuilder<'a> {
    pub fn new(theme: &'a Theme, ids: &'a dyn IdSource) -> Self {
        Self {
            theme,
            ids,
            modified: Utc::now(),
        }
    }

    /// Pins the `modified` stamp of the envelope.
    pub fn modified_at(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = modified;
        self
    }

    pub fn build(&self, steps: &[String], caption: &str) -> DrawioDocument {
        let caption_id = self.ids.node_id();

        let mut boxes = Vec::with_capacity(steps.len());
        let mut y = FIRST_BOX_Y;
        for step in steps {
            let height = step_height(step);
            boxes.push(DrawioBox {
                id: self.ids.node_id(),
                x: BOX_X,
                y,
                width: BOX_WIDTH,
                height,
            });
            y += height + VERTICAL_SPACING;
        }

        let edges: Vec<DrawioEdge> = boxes
            .windows(2)
            .map(|pair| DrawioEdge {
                id: self.ids.node_id(),
                source: pair[0].id.clone(),
                target: pair[1].id.clone(),
            })
            .collect();

        let xml = self.write_xml(steps, caption, &caption_id, &boxes, &edges);
        tracing::debug!(boxes = boxes.len(), edges = edges.len(), "built drawio document");

        DrawioDocument {
            xml,
            caption_id,
            boxes,
            edges,
        }
    }

    fn write_xml(
        &self,
        steps: &[String],
        caption: &str,
        caption_id: &str,
        boxes: &[DrawioBox],
        edges: &[DrawioEdge],
    ) -> String {
        let theme = self.theme;
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            xml,
            "<mxfile host=\"{HOST}\" agent=\"{AGENT}\" modified=\"{}\" etag=\"{}\" version=\"{EDITOR_VERSION}\" type=\"device\">",
            self.modified.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            escape_xml(&self.ids.revision()),
        );
        let _ = writeln!(
            xml,
            "  <diagram name=\"{PAGE_NAME}\" id=\"{}\">",
            self.ids.node_id()
        );
        let _ = writeln!(
            xml,
            "    <mxGraphModel dx=\"1046\" dy=\"781\" grid=\"0\" gridSize=\"10\" guides=\"1\" tooltips=\"1\" connect=\"1\" arrows=\"1\" fold=\"1\" page=\"1\" pageScale=\"1\" pageWidth=\"827\" pageHeight=\"1169\" background=\"{}\" math=\"0\" shadow=\"0\">",
            theme.background
        );
        xml.push_str("      <root>\n");
        xml.push_str("        <mxCell id=\"0\" />\n");
        xml.push_str("        <mxCell id=\"1\" parent=\"0\" />\n");

        let _ = writeln!(
            xml,
            "        <mxCell id=\"{caption_id}\" value=\"{}\" style=\"text;html=1;align=center;verticalAlign=middle;whiteSpace=wrap;rounded=0;fontFamily={};fontStyle=1;fontSize={};fontColor={};\" vertex=\"1\" parent=\"1\">",
            escape_xml(caption),
            escape_xml(&theme.font_family),
            theme.caption_font_size,
            theme.text_color,
        );
        let _ = writeln!(
            xml,
            "          <mxGeometry x=\"{BOX_X}\" y=\"{CAPTION_Y}\" width=\"{BOX_WIDTH}\" height=\"{CAPTION_HEIGHT}\" as=\"geometry\" />"
        );
        xml.push_str("        </mxCell>\n");

        for (step, node) in steps.iter().zip(boxes) {
            let _ = writeln!(
                xml,
                "        <mxCell id=\"{}\" value=\"{}\" style=\"rounded=1;html=1;labelBackgroundColor=none;fillColor={};strokeColor={};spacingLeft=20;spacingRight=20;spacingBottom=10;spacingTop=10;whiteSpace=wrap;\" vertex=\"1\" parent=\"1\">",
                node.id,
                escape_xml(&step_label_html(step, theme)),
                theme.box_fill,
                theme.box_stroke,
            );
            let _ = writeln!(
                xml,
                "          <mxGeometry x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" as=\"geometry\" />",
                node.x, node.y, node.width, node.height
            );
            xml.push_str("        </mxCell>\n");
        }

        for edge in edges {
            let _ = writeln!(
                xml,
                "        <mxCell id=\"{}\" style=\"edgeStyle=orthogonalEdgeStyle;rounded=1;orthogonalLoop=1;jettySize=auto;html=1;exitX=0.5;exitY=1;exitDx=0;exitDy=0;entryX=0.5;entryY=0;entryDx=0;entryDy=0;curved=1;strokeColor={};sourcePerimeterSpacing=0;strokeWidth=4;\" edge=\"1\" parent=\"1\" source=\"{}\" target=\"{}\">",
                edge.id, theme.edge_color, edge.source, edge.target
            );
            xml.push_str("          <mxGeometry relative=\"1\" as=\"geometry\" />\n");
            xml.push_str("        </mxCell>\n");
        }

        xml.push_str("      </root>\n");
        xml.push_str("    </mxGraphModel>\n");
        xml.push_str("  </diagram>\n");
        xml.push_str("</mxfile>\n");
        xml
    }
}

/// Height of a step box: 80 plus 20 for every line after the first.
///
/// Lines are counted on the raw text, bold markers included.
pub fn step_height(raw: &str) -> i32 {
    let line_count = split_lines(raw).len() as i32;
    BASE_HEIGHT.max(BASE_HEIGHT + (line_count - 1) * EXTRA_LINE_HEIGHT)
}

/// HTML label of a step box: first line as a bold header paragraph, the
/// remaining lines joined by spaces into one body paragraph.
pub fn step_label_html(raw: &str, theme: &Theme) -> String {
    let lines: Vec<String> = split_lines(raw).iter().map(|line| bold_to_html(line)).collect();
    let Some((header, body)) = lines.split_first() else {
        return String::new();
    };

    let mut html = String::new();
    let _ = write!(
        html,
        "<p style=\"line-height: 140%;\"><font color=\"{}\" size=\"1\"><b style=\"font-size: 14px;\">{header}</b></font></p>",
        theme.text_color
    );
    if !body.is_empty() {
        let _ = write!(
            html,
            "<p style=\"line-height: 140%;\"><span style=\"color: {}; text-align: left; background-color: initial;\">{}</span></p>",
            theme.text_color,
            body.join(" ")
        );
    }
    html.push_str("<p></p>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use chrono::TimeZone;

    fn steps(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn height_grows_twenty_per_extra_line() {
        assert_eq!(step_height("single"), 80);
        assert_eq!(step_height(""), 80);
        assert_eq!(step_height("**Head**\nbody"), 100);
        assert_eq!(step_height("a&#xA;b&#xA;c"), 120);
    }

    #[test]
    fn boxes_stack_with_fixed_spacing() {
        let theme = Theme::classic();
        let ids = SequentialIds::new();
        let doc = MxGraphDiagramBuilder::new(&theme, &ids).build(
            &steps(&["one", "**two**\nsecond line\nthird line", "three"]),
            "Caption",
        );
        let ys: Vec<i32> = doc.boxes.iter().map(|b| b.y).collect();
        assert_eq!(ys, vec![85, 85 + 80 + 32, 85 + 80 + 32 + 120 + 32]);
        for pair in doc.boxes.windows(2) {
            assert!(pair[1].y >= pair[0].y + pair[0].height + VERTICAL_SPACING);
        }
    }

    #[test]
    fn edges_link_consecutive_boxes() {
        let theme = Theme::classic();
        let ids = SequentialIds::new();
        let doc = MxGraphDiagramBuilder::new(&theme, &ids).build(&steps(&["a", "b", "c"]), "C");
        assert_eq!(doc.edges.len(), 2);
        for (idx, edge) in doc.edges.iter().enumerate() {
            assert_eq!(edge.source, doc.boxes[idx].id);
            assert_eq!(edge.target, doc.boxes[idx + 1].id);
        }
    }

    #[test]
    fn single_step_has_no_edges() {
        let theme = Theme::classic();
        let ids = SequentialIds::new();
        let doc = MxGraphDiagramBuilder::new(&theme, &ids).build(&steps(&["only"]), "C");
        assert_eq!(doc.boxes.len(), 1);
        assert!(doc.edges.is_empty());
    }

    #[test]
    fn envelope_carries_timestamp_and_declaration() {
        let theme = Theme::classic();
        let ids = SequentialIds::new();
        let when = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let doc = MxGraphDiagramBuilder::new(&theme, &ids)
            .modified_at(when)
            .build(&[], "Empty");
        assert!(doc.xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(doc.xml.contains("modified=\"2024-05-06T07:08:09.000Z\""));
        assert!(doc.boxes.is_empty());
        assert!(doc.edges.is_empty());
    }

    #[test]
    fn label_html_has_header_body_and_trailing_paragraph() {
        let html = step_label_html("**Step One**\nDo the\nfirst thing.", &Theme::classic());
        assert!(html.starts_with("<p style=\"line-height: 140%;\"><font color=\"#363634\" size=\"1\"><b style=\"font-size: 14px;\"><b>Step One</b></b>"));
        assert!(html.contains(">Do the first thing.</span></p>"));
        assert!(html.ends_with("<p></p>"));
    }

    #[test]
    fn label_html_for_blank_step_is_empty() {
        assert_eq!(step_label_html("\n\n", &Theme::classic()), "");
    }

    #[test]
    fn caption_is_escaped_in_attribute() {
        let theme = Theme::classic();
        let ids = SequentialIds::new();
        let doc = MxGraphDiagramBuilder::new(&theme, &ids).build(&[], "A \"quoted\" <caption>");
        assert!(doc.xml.contains("value=\"A &quot;quoted&quot; &lt;caption&gt;\""));
    }

    #[test]
    fn font_family_is_escaped_in_style() {
        let theme = Theme {
            font_family: "Foo \"Bar\" & Co".to_string(),
            ..Theme::classic()
        };
        let ids = SequentialIds::new();
        let doc = MxGraphDiagramBuilder::new(&theme, &ids).build(&["**A**".to_string()], "Cap");
        let parsed = roxmltree::Document::parse(&doc.xml).unwrap();
        let caption = parsed
            .descendants()
            .find(|n| n.attribute("id") == Some(doc.caption_id.as_str()))
            .unwrap();
        assert!(caption.attribute("style").unwrap().contains("fontFamily=Foo \"Bar\" & Co;"));
    }
}
