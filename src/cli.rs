use crate::config::{Config, load_config, normalize_url};
use crate::layout_dump::write_layout_dump;
use crate::pipeline::DiagramPipeline;
use crate::render::{write_output_png, write_output_svg};
use crate::response::{AlgorithmData, AlgorithmSource, JsonFileSource, parse_algorithm_response};
use crate::storage::{ArtifactStore, CONTENT_TYPE, Sweeper};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "stepchart",
    version,
    about = "Render step lists as drawio documents and PNG previews"
)]
pub struct Args {
    /// Config JSON file
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding generated .drawio files
    #[arg(long = "storage-dir", global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Public base URL used to build editor links
    #[arg(long = "external-url", global = true)]
    pub external_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render an answer ({"caption", "steps"} JSON) into PNG + drawio
    Render {
        /// Answer file or '-' for stdin
        #[arg(short = 'i', long = "input")]
        input: Option<PathBuf>,

        /// Directory for the PNG preview (and SVG / layout dump)
        #[arg(short = 'o', long = "output", default_value = ".")]
        output: PathBuf,

        /// Also write the intermediate SVG
        #[arg(long = "svg")]
        svg: bool,

        /// Also write the computed layout as JSON
        #[arg(long = "dump-layout")]
        dump_layout: bool,
    },
    /// Stored artifact access
    Files {
        #[command(subcommand)]
        action: FilesCommand,
    },
    /// Manual cleanup of stale artifacts
    Cleanup {
        #[command(subcommand)]
        action: CleanupCommand,
    },
    /// Run the periodic sweeper until stdin is closed
    Sweep,
}

#[derive(Subcommand, Debug)]
pub enum FilesCommand {
    /// Print a stored .drawio file to stdout
    Get { file_name: String },
}

#[derive(Subcommand, Debug)]
pub enum CleanupCommand {
    /// Delete stale files now
    Run,
    /// Count stale files
    Status,
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())
        .with_context(|| format!("loading config {:?}", args.config))?;
    if let Some(dir) = args.storage_dir {
        config.storage.dir = dir;
    }
    if args.external_url.is_some() {
        config.storage.external_url = normalize_url(args.external_url);
    }
    let store = ArtifactStore::new(config.storage.dir.clone());

    match args.command {
        Command::Render {
            input,
            output,
            svg,
            dump_layout,
        } => render(&config, &store, input.as_deref(), &output, svg, dump_layout),
        Command::Files {
            action: FilesCommand::Get { file_name },
        } => {
            let bytes = store.load(&file_name)?;
            tracing::info!(file = %file_name, content_type = CONTENT_TYPE, bytes = bytes.len(), "serving artifact");
            io::stdout().lock().write_all(&bytes)?;
            Ok(())
        }
        Command::Cleanup { action } => cleanup(&config, &store, action),
        Command::Sweep => {
            let sweeper = Sweeper::spawn(store, config.cleanup.clone())?;
            let mut sink = Vec::new();
            io::stdin().read_to_end(&mut sink)?;
            sweeper.stop();
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn render(
    config: &Config,
    store: &ArtifactStore,
    input: Option<&Path>,
    output: &Path,
    write_svg: bool,
    dump_layout: bool,
) -> Result<()> {
    let data = read_answer(input)?;
    let pipeline = DiagramPipeline::new(config);
    let delivery = pipeline
        .deliver(
            store,
            &data.steps,
            &data.caption,
            config.storage.external_url.as_deref(),
        )
        .context("could not process the request")?;

    std::fs::create_dir_all(output)?;
    write_output_png(&delivery.diagram.png, &output.join("diagram.png"))?;
    if write_svg {
        write_output_svg(&delivery.diagram.svg.svg, Some(&output.join("diagram.svg")))?;
    }
    if dump_layout {
        write_layout_dump(&output.join("layout.json"), &delivery.diagram.svg, &data.caption)?;
    }

    println!("{}", store.root().join(&delivery.file_name).display());
    if let Some(link) = delivery.edit_link {
        println!("Edit: {link}");
    }
    Ok(())
}

fn cleanup(config: &Config, store: &ArtifactStore, action: CleanupCommand) -> Result<()> {
    let max_age = config.cleanup.max_age();
    let report = match action {
        CleanupCommand::Run => {
            let deleted = store.cleanup(max_age)?;
            serde_json::json!({ "message": "Cleanup completed", "deletedFiles": deleted })
        }
        CleanupCommand::Status => {
            let stale = store.stale_count(max_age)?;
            serde_json::json!({
                "oldFilesCount": stale,
                "maxAgeMinutes": config.cleanup.max_age_minutes,
            })
        }
    };
    println!("{report}");
    Ok(())
}

fn read_answer(path: Option<&Path>) -> Result<AlgorithmData> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return JsonFileSource::new(path)
            .fetch("")
            .with_context(|| format!("reading {}", path.display()));
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(parse_algorithm_response(&buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_render_with_global_overrides() {
        let args = Args::try_parse_from([
            "stepchart",
            "render",
            "-i",
            "answer.json",
            "--svg",
            "--storage-dir",
            "/tmp/store",
        ])
        .unwrap();
        assert_eq!(args.storage_dir, Some(PathBuf::from("/tmp/store")));
        match args.command {
            Command::Render { input, svg, dump_layout, .. } => {
                assert_eq!(input, Some(PathBuf::from("answer.json")));
                assert!(svg);
                assert!(!dump_layout);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn answer_file_is_read_through_json_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answer.json");
        std::fs::write(&path, r#"{Caption: "Demo", steps: ["**A**\nfirst",],}"#).unwrap();
        let data = read_answer(Some(&path)).unwrap();
        assert_eq!(data.caption, "Demo");
        assert_eq!(data.steps, vec!["**A**\nfirst"]);
    }

    #[test]
    fn missing_answer_file_names_the_path() {
        let err = read_answer(Some(Path::new("/nonexistent/answer.json"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/answer.json"));
    }

    #[test]
    fn parses_files_get() {
        let args = Args::try_parse_from(["stepchart", "files", "get", "a.drawio"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Files { action: FilesCommand::Get { ref file_name } } if file_name == "a.drawio"
        ));
    }
}
