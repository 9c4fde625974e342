use crate::error::Result;
use crate::svg::{Connector, SvgDiagram};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub caption: String,
    pub width: i32,
    pub height: i32,
    pub boxes: Vec<BoxDump>,
    pub connectors: Vec<ConnectorDump>,
}

#[derive(Debug, Serialize)]
pub struct BoxDump {
    pub index: usize,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub header_lines: Vec<String>,
    pub body_lines: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ConnectorDump {
    pub from: usize,
    pub to: usize,
    pub points: [[i32; 2]; 2],
}

impl LayoutDump {
    pub fn from_diagram(diagram: &SvgDiagram, caption: &str) -> Self {
        let boxes = diagram
            .boxes
            .iter()
            .enumerate()
            .map(|(index, layout)| BoxDump {
                index,
                x: layout.x,
                y: layout.y,
                width: layout.width,
                height: layout.height,
                header_lines: layout.header_lines.clone(),
                body_lines: layout.body_lines.clone(),
            })
            .collect();

        let connectors = diagram
            .connectors
            .iter()
            .enumerate()
            .map(|(index, Connector { x1, y1, x2, y2 })| ConnectorDump {
                from: index,
                to: index + 1,
                points: [[*x1, *y1], [*x2, *y2]],
            })
            .collect();

        Self {
            caption: caption.to_string(),
            width: diagram.width,
            height: diagram.height,
            boxes,
            connectors,
        }
    }
}

pub fn write_layout_dump(path: &Path, diagram: &SvgDiagram, caption: &str) -> Result<()> {
    let dump = LayoutDump::from_diagram(diagram, caption);
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
