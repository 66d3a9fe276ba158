use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;
use serde::{Deserialize, Serialize};
use simplelog::{Config, LevelFilter, WriteLogger};

use folio::pdf::{
    CachingDataSource, Command, DataSource, DisplayRequest, DocumentBackend, DocumentRef, FileFetch, PageGeometry,
    PassThrough, PdfViewer, Size, SystemClock, ViewerConfig, ViewerStatus, wheel,
};
use folio::settings;
use folio::sim::{RecordingHost, SimBackend, SimDocument};

/// Replay a viewer scenario against the in-memory backend
#[derive(Parser, Debug)]
#[command(name = "folio", version, about)]
struct Args {
    /// Scenario file (YAML, or JSON by extension)
    scenario: PathBuf,

    /// Settings file, defaults to the user config directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read documents from JSON files under this directory instead of the scenario
    #[arg(long)]
    documents_dir: Option<PathBuf>,

    #[arg(long, default_value = "folio.log")]
    log_file: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default = "default_container")]
    container: Container,
    #[serde(default)]
    documents: BTreeMap<String, SimDocument>,
    steps: Vec<Step>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
struct Container {
    width: f32,
    height: f32,
}

fn default_container() -> Container {
    Container {
        width: 800.0,
        height: 600.0,
    }
}

fn default_target() -> String {
    "main".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Step {
    Show {
        url: String,
        #[serde(default)]
        modified_ts: i64,
        #[serde(default = "default_target")]
        target: String,
    },
    Resize(Container),
    ZoomIn,
    ZoomOut,
    FitWidth,
    FitPage,
    ZoomPreset(f32),
    PageUp,
    PageDown,
    GoToPage(u32),
    Scroll(f32),
    /// Raw wheel event, normalized like a browser wheel
    Wheel {
        #[serde(default)]
        detail: f32,
        #[serde(default)]
        wheel_delta: f32,
        #[serde(default)]
        zoom: bool,
    },
    Wait(u64),
}

#[derive(Debug, Serialize)]
struct Summary {
    status: ViewerStatus,
    alerts: Vec<String>,
    errors: Vec<String>,
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let content = fs::read_to_string(path).with_context(|| format!("reading scenario {}", path.display()))?;
    let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let scenario = if is_json {
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
    } else {
        serde_yaml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
    };
    Ok(scenario)
}

fn run<D: DataSource>(scenario: Scenario, config: ViewerConfig, data_source: D) -> Result<Summary> {
    let Container { width, height } = scenario.container;
    let mut backend = SimBackend::new(Size::new(width, height));
    for (url, document) in scenario.documents {
        backend = backend.with_document(url, document);
    }
    let control = backend.control();
    let mut viewer = PdfViewer::new(backend, data_source, RecordingHost::default(), config, SystemClock::new());
    viewer.add_page_ready_listener(|page| info!("Page {page} ready"));

    for step in scenario.steps {
        info!("Step {step:?}");
        match step {
            Step::Show {
                url,
                modified_ts,
                target,
            } => {
                let container = viewer.backend().container_size();
                let geometry =
                    PageGeometry::new(container.width, container.height, viewer.state().zoom.descriptor());
                let request = DisplayRequest::new(DocumentRef::new(url, modified_ts, target), geometry);
                viewer.show(request);
            }
            Step::Resize(Container { width, height }) => {
                control.set_container(width, height);
                viewer.apply_command(Command::Resize);
            }
            Step::ZoomIn => viewer.apply_command(Command::ZoomIn),
            Step::ZoomOut => viewer.apply_command(Command::ZoomOut),
            Step::FitWidth => viewer.apply_command(Command::FitWidth),
            Step::FitPage => viewer.apply_command(Command::FitPage),
            Step::ZoomPreset(scale) => viewer.apply_command(Command::ZoomPreset(scale)),
            Step::PageUp => viewer.apply_command(Command::PageUp),
            Step::PageDown => viewer.apply_command(Command::PageDown),
            Step::GoToPage(page) => viewer.apply_command(Command::GoToPage(page)),
            Step::Scroll(offset) => {
                control.scroll_to(offset);
                viewer.apply_command(Command::Scroll { offset });
            }
            Step::Wheel {
                detail,
                wheel_delta,
                zoom,
            } => {
                if detail == 0.0 && wheel_delta == 0.0 {
                    bail!("wheel step needs a detail or wheel_delta");
                }
                viewer.apply_command(Command::Wheel {
                    delta: wheel::normalize(detail, wheel_delta),
                    zoom_modifier: zoom,
                });
            }
            Step::Wait(millis) => thread::sleep(Duration::from_millis(millis)),
        }
        viewer.poll();
    }

    Ok(Summary {
        status: viewer.status(),
        alerts: viewer.host().alerts.clone(),
        errors: viewer.host().errors.clone(),
    })
}

fn main() -> Result<()> {
    better_panic::install();
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&args.log_file).with_context(|| format!("creating {}", args.log_file.display()))?,
    )?;

    info!("Starting folio");

    let settings = settings::load_settings(args.config.as_deref());
    let config = settings.viewer_config()?;
    let scenario = load_scenario(&args.scenario)?;

    let summary = match args.documents_dir {
        Some(dir) => run(
            scenario,
            config,
            CachingDataSource::new(FileFetch::new(dir), settings.cache_size),
        )?,
        None => run(scenario, config, PassThrough)?,
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    info!("Shutting down folio");
    Ok(())
}
