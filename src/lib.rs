#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod drawio;
pub mod error;
pub mod ids;
pub mod layout_dump;
pub mod pipeline;
pub mod render;
pub mod response;
pub mod step;
pub mod storage;
pub mod svg;
pub mod text;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, load_config};
pub use error::{Error, Result};
pub use pipeline::{Delivery, DiagramPipeline, GeneratedDiagram};
pub use response::{AlgorithmData, AlgorithmSource, parse_algorithm_response};
pub use storage::ArtifactStore;
