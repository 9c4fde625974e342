//! Step list in, drawio + PNG out.

use crate::config::Config;
use crate::drawio::MxGraphDiagramBuilder;
use crate::error::{Error, Result};
use crate::ids::{IdSource, RandomIds};
use crate::render::render_png;
use crate::storage::{ArtifactStore, edit_link};
use crate::svg::{SvgDiagram, SvgDiagramBuilder};
use crate::text::TextLayoutMeasurer;
use crate::theme::Theme;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct GeneratedDiagram {
    pub drawio: Vec<u8>,
    pub svg: SvgDiagram,
    pub png: Vec<u8>,
}

/// Everything the chat transport needs to answer one request.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub file_name: String,
    pub caption: String,
    pub diagram: GeneratedDiagram,
    pub edit_link: Option<String>,
}

/// Holds only read-only settings; every `generate` call builds its own
/// builders, so one pipeline can be shared across threads.
#[derive(Clone)]
pub struct DiagramPipeline {
    theme: Theme,
    measurer: TextLayoutMeasurer,
    ids: Arc<dyn IdSource>,
}

impl DiagramPipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            theme: config.theme.clone(),
            measurer: TextLayoutMeasurer::new(config.render.fast_text_metrics),
            ids: Arc::new(RandomIds),
        }
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_measurer(mut self, measurer: TextLayoutMeasurer) -> Self {
        self.measurer = measurer;
        self
    }

    pub fn generate(&self, steps: &[String], caption: &str) -> Result<GeneratedDiagram> {
        if steps.is_empty() {
            return Err(Error::EmptyInput);
        }

        let drawio = MxGraphDiagramBuilder::new(&self.theme, self.ids.as_ref())
            .build(steps, caption)
            .into_bytes();
        let svg = SvgDiagramBuilder::new(&self.theme, self.measurer).build(steps, caption)?;
        let png = render_png(&svg.svg)?;

        tracing::debug!(
            steps = steps.len(),
            drawio_bytes = drawio.len(),
            png_bytes = png.len(),
            "generated diagram"
        );
        Ok(GeneratedDiagram { drawio, svg, png })
    }

    /// Generates both artifacts and only then persists the drawio file, so a
    /// failed request leaves nothing behind in the store.
    pub fn deliver(
        &self,
        store: &ArtifactStore,
        steps: &[String],
        caption: &str,
        external_url: Option<&str>,
    ) -> Result<Delivery> {
        let diagram = self.generate(steps, caption)?;
        let file_name = store.save(&diagram.drawio, self.ids.as_ref())?;
        let edit_link = external_url.map(|base| edit_link(base, &file_name));
        Ok(Delivery {
            file_name,
            caption: caption.to_string(),
            diagram,
            edit_link,
        })
    }
}

impl Default for DiagramPipeline {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
