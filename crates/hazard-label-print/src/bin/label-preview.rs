use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use hazard_label::{
    CanvasSize, HmisRating, LabelSpec, Orientation, PaperSize, PhysicalSize, SignalWord,
    ThermalPrint, SCREEN_DPI,
};
use hazard_label_embedded_graphics::{encode_png, EgTextMeasurer, LabelSurface, RasterCapturer};
use hazard_label_print::{
    AgentDevice, BrowserPrintAgent, DesktopPrint, DownloadPng, NeverCancel, Notification,
    NotificationLevel, PdfExport, PrintAgent, PrintDispatcher, PrintJobConfig, PrintJobReport,
    SystemPresenter, TileRequest,
};
use hazard_label_render::LabelComposer;
use hazard_label_render_web::preview_document;
use serde::{Deserialize, Serialize};

const DEFAULT_OUT_DIR: &str = "target/label-preview";

#[derive(Clone, Debug)]
struct Args {
    input: Option<String>,
    config: Option<String>,
    out_dir: String,
    open_browser: bool,
    send: bool,
    png_scale: Option<u32>,
    sheet: Option<(u32, u32)>,
    paper: Option<PaperSize>,
    margin: Option<f64>,
    dpi: Option<u32>,
    darkness: Option<u8>,
    copies: Option<u32>,
    threshold: Option<u8>,
    landscape: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
struct PreviewConfig {
    png_scale: u32,
    label_width_in: Option<f64>,
    label_height_in: Option<f64>,
    sheet_rows: u32,
    sheet_columns: u32,
    paper: PaperSize,
    margin_in: f64,
    desktop: bool,
    pdf: bool,
    thermal: ThermalPrint,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            png_scale: 3,
            label_width_in: None,
            label_height_in: None,
            sheet_rows: 0,
            sheet_columns: 0,
            paper: PaperSize::Letter,
            margin_in: 0.125,
            desktop: true,
            pdf: true,
            thermal: ThermalPrint::default(),
        }
    }
}

impl PreviewConfig {
    fn apply_args(mut self, args: &Args) -> Self {
        if let Some(scale) = args.png_scale {
            self.png_scale = scale;
        }
        if let Some((rows, columns)) = args.sheet {
            self.sheet_rows = rows;
            self.sheet_columns = columns;
        }
        if let Some(paper) = args.paper {
            self.paper = paper;
        }
        if let Some(margin) = args.margin {
            self.margin_in = margin;
        }
        if let Some(dpi) = args.dpi {
            self.thermal.dpi = dpi;
        }
        if let Some(darkness) = args.darkness {
            self.thermal.darkness = darkness;
        }
        if let Some(copies) = args.copies {
            self.thermal.copies = copies;
        }
        if let Some(threshold) = args.threshold {
            self.thermal.threshold = threshold;
        }
        if args.landscape {
            self.thermal.orientation = Orientation::Landscape;
        }
        self
    }

    fn normalized(mut self) -> Self {
        self.png_scale = self.png_scale.clamp(1, 8);
        self.margin_in = self.margin_in.max(0.0);
        self
    }

    fn physical(&self, canvas: CanvasSize) -> Result<PhysicalSize, String> {
        let derived = PhysicalSize::from_pixels(canvas.width, canvas.height, SCREEN_DPI)
            .map_err(|e| e.to_string())?;
        Ok(PhysicalSize::new(
            self.label_width_in.unwrap_or(derived.width_in),
            self.label_height_in.unwrap_or(derived.height_in),
        ))
    }

    /// Thermal settings printing at the same size as the other channels.
    fn thermal_job(&self, physical: PhysicalSize) -> ThermalPrint {
        let mut thermal = self.thermal.clone();
        thermal.label_size.get_or_insert(physical);
        thermal
    }
}

/// Agent chosen at the command line.
enum CliAgent {
    Browser(BrowserPrintAgent),
    Offline,
}

impl PrintAgent for CliAgent {
    async fn detect(&self) -> Option<AgentDevice> {
        match self {
            Self::Browser(agent) => agent.detect().await,
            Self::Offline => None,
        }
    }

    async fn send(
        &self,
        device: &AgentDevice,
        script: &str,
    ) -> Result<(), hazard_label::LabelError> {
        match self {
            Self::Browser(agent) => agent.send(device, script).await,
            Self::Offline => Err(hazard_label::LabelError::DeviceCommunicationFailure {
                message: "print agent disabled".to_string(),
            }),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run(env::args().collect()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Vec<String>) -> Result<(), String> {
    let cli = parse_args(args)?;
    let spec = match &cli.input {
        Some(path) => load_spec(path).await?,
        None => sample_spec(),
    };
    spec.validate().map_err(|e| e.to_string())?;

    let cfg = match &cli.config {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| format!("{}: {}", path, e))?;
            serde_json::from_str::<PreviewConfig>(&text)
                .map_err(|e| format!("invalid preview config: {}", e))?
        }
        None => PreviewConfig::default(),
    }
    .apply_args(&cli)
    .normalized();

    let out_dir = PathBuf::from(&cli.out_dir);
    tokio::fs::create_dir_all(&out_dir)
        .await
        .map_err(|e| format!("{}: {}", out_dir.display(), e))?;

    let page = LabelComposer::default()
        .with_text_measurer(EgTextMeasurer::shared())
        .compose(&spec);
    let warnings = page_warnings(&page.metrics);
    let mut surface = LabelSurface::new("label", page);

    let preview_png = RasterCapturer::new()
        .capture(&mut surface, 1)
        .and_then(|raster| encode_png(&raster))
        .map_err(|e| e.to_string())?;
    let preview = preview_document(
        &spec.product_name,
        surface.page(),
        Some(&preview_png),
        &warnings,
    )
    .map_err(|e| e.to_string())?;
    write_file(&out_dir, "preview.html", preview.as_bytes()).await?;

    let agent = if cli.send {
        CliAgent::Browser(BrowserPrintAgent::default())
    } else {
        CliAgent::Offline
    };
    let presenter = if cli.open_browser {
        SystemPresenter::new(&out_dir)
    } else {
        SystemPresenter::new(&out_dir).write_only()
    };
    let mut dispatcher = PrintDispatcher::new(agent, presenter);
    let notifications: Arc<Mutex<Vec<Notification>>> = Arc::default();
    let sink = Arc::clone(&notifications);
    dispatcher.set_notification_sink(move |notification| {
        if let Ok(mut list) = sink.lock() {
            list.push(notification);
        }
    });

    let physical = cfg.physical(spec.canvas)?;
    let mut jobs = vec![PrintJobConfig::Download(DownloadPng {
        scale: cfg.png_scale,
    })];
    if cfg.pdf {
        jobs.push(PrintJobConfig::Pdf(PdfExport {
            physical,
            tiles: None,
        }));
    }
    if cfg.sheet_rows > 0 && cfg.sheet_columns > 0 {
        jobs.push(PrintJobConfig::Pdf(PdfExport {
            physical,
            tiles: Some(TileRequest {
                rows: cfg.sheet_rows,
                columns: cfg.sheet_columns,
                margin_inches: cfg.margin_in,
                paper: cfg.paper,
            }),
        }));
    }
    if cfg.desktop {
        jobs.push(PrintJobConfig::Desktop(DesktopPrint { physical }));
    }
    jobs.push(PrintJobConfig::Thermal(cfg.thermal_job(physical)));

    let mut failures = Vec::new();
    for job in &jobs {
        let mut report = dispatcher
            .dispatch(&mut surface, &spec, job, &NeverCancel)
            .await;
        if let Some(err) = report.error() {
            failures.push(format!("{}: {}", report.channel().as_str(), err));
        }
        save_artifact(&out_dir, job, &mut report).await?;
    }

    let notifications = notifications
        .lock()
        .map(|list| list.clone())
        .unwrap_or_default();
    for notification in &notifications {
        let marker = match notification.level {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "ok",
            NotificationLevel::Error => "error",
        };
        println!(
            "[{}] {}: {}",
            marker,
            notification.channel.as_str(),
            notification.message
        );
    }
    println!(
        "wrote label outputs to {} (jobs={}, warnings={})",
        out_dir.display(),
        jobs.len(),
        warnings.len()
    );

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures.join("; "))
    }
}

async fn load_spec(path: &str) -> Result<LabelSpec, String> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("{}: {}", path, e))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid label spec: {}", e))
}

fn sample_spec() -> LabelSpec {
    LabelSpec::new("Isopropyl Alcohol", CanvasSize::default())
        .with_manufacturer("Acme Chemical")
        .with_identifier("CAS 67-63-0")
        .with_identifier("UN1219")
        .with_signal_word(SignalWord::Danger)
        .with_rating(HmisRating::new(2, 3, 0, "B"))
        .with_hazard_statement("H225 Highly flammable liquid and vapour")
        .with_hazard_statement("H319 Causes serious eye irritation")
        .with_hazard_statement("H336 May cause drowsiness or dizziness")
        .with_pictogram("GHS02")
        .with_pictogram("GHS07")
        .with_ppe("safety glasses")
        .with_ppe("nitrile gloves")
}

fn page_warnings(metrics: &hazard_label_render::PageMetrics) -> Vec<String> {
    let mut warnings = Vec::new();
    if metrics.statements_dropped > 0 {
        warnings.push(format!(
            "{} hazard statement(s) did not fit",
            metrics.statements_dropped
        ));
    }
    if metrics.pictograms_dropped > 0 {
        warnings.push(format!(
            "{} pictogram(s) did not fit",
            metrics.pictograms_dropped
        ));
    }
    if metrics.truncated_runs > 0 {
        warnings.push(format!("{} text run(s) truncated", metrics.truncated_runs));
    }
    warnings
}

async fn save_artifact(
    out_dir: &Path,
    job: &PrintJobConfig,
    report: &mut PrintJobReport,
) -> Result<(), String> {
    let Some(artifact) = report.take_artifact() else {
        return Ok(());
    };
    let file_name = match job {
        PrintJobConfig::Pdf(PdfExport { tiles: Some(_), .. }) => {
            artifact.file_name.replace(".pdf", "-sheet.pdf")
        }
        _ => artifact.file_name,
    };
    write_file(out_dir, &file_name, &artifact.bytes).await
}

async fn write_file(out_dir: &Path, file_name: &str, bytes: &[u8]) -> Result<(), String> {
    let path = out_dir.join(file_name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| format!("{}: {}", path.display(), e))
}

fn parse_sheet(value: &str) -> Option<(u32, u32)> {
    let (rows, columns) = value.split_once(['x', 'X'])?;
    Some((rows.trim().parse().ok()?, columns.trim().parse().ok()?))
}

fn parse_args(args: Vec<String>) -> Result<Args, String> {
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h") {
        return Err("help requested".to_string());
    }

    let has_positional_input = args.get(1).is_some_and(|v| !v.starts_with("--"));

    let mut cfg = Args {
        input: if has_positional_input {
            Some(args[1].clone())
        } else {
            None
        },
        config: None,
        out_dir: DEFAULT_OUT_DIR.to_string(),
        open_browser: false,
        send: false,
        png_scale: None,
        sheet: None,
        paper: None,
        margin: None,
        dpi: None,
        darkness: None,
        copies: None,
        threshold: None,
        landscape: false,
    };

    let mut i = if has_positional_input { 2usize } else { 1usize };
    while i < args.len() {
        let flag = args[i].as_str();
        if matches!(flag, "--open" | "--send" | "--landscape") {
            match flag {
                "--open" => cfg.open_browser = true,
                "--send" => cfg.send = true,
                _ => cfg.landscape = true,
            }
            i += 1;
            continue;
        }

        let v = args
            .get(i + 1)
            .ok_or_else(|| format!("{} requires a value", flag))?;
        match flag {
            "--config" => cfg.config = Some(v.clone()),
            "--out" => cfg.out_dir = v.clone(),
            "--png-scale" => {
                cfg.png_scale = Some(
                    v.parse::<u32>()
                        .map_err(|_| format!("invalid --png-scale value '{}'", v))?,
                )
            }
            "--sheet" => {
                cfg.sheet =
                    Some(parse_sheet(v).ok_or_else(|| format!("invalid --sheet value '{}'", v))?)
            }
            "--paper" => {
                let paper = PaperSize::parse(v)
                    .ok_or_else(|| format!("invalid --paper value '{}'", v))?;
                cfg.paper = Some(paper)
            }
            "--margin" => {
                cfg.margin = Some(
                    v.parse::<f64>()
                        .map_err(|_| format!("invalid --margin value '{}'", v))?,
                )
            }
            "--dpi" => {
                cfg.dpi = Some(
                    v.parse::<u32>()
                        .map_err(|_| format!("invalid --dpi value '{}'", v))?,
                )
            }
            "--darkness" => {
                cfg.darkness = Some(
                    v.parse::<u8>()
                        .map_err(|_| format!("invalid --darkness value '{}'", v))?,
                )
            }
            "--copies" => {
                cfg.copies = Some(
                    v.parse::<u32>()
                        .map_err(|_| format!("invalid --copies value '{}'", v))?,
                )
            }
            "--threshold" => {
                cfg.threshold = Some(
                    v.parse::<u8>()
                        .map_err(|_| format!("invalid --threshold value '{}'", v))?,
                )
            }
            other => return Err(format!("unknown option '{}'", other)),
        }
        i += 2;
    }

    if cfg.out_dir.is_empty() {
        return Err("--out must not be empty".to_string());
    }
    if cfg.png_scale == Some(0) {
        return Err("--png-scale must be > 0".to_string());
    }
    if cfg.margin.is_some_and(|m| m < 0.0) {
        return Err("--margin must be >= 0".to_string());
    }

    Ok(cfg)
}

fn help_text() -> &'static str {
    r#"label-preview - compose a hazard label and write every print channel's output

USAGE:
  cargo run -p hazard-label-print --bin label-preview -- [label.json] [options]

OUTPUTS (in --out):
  preview.html                 layout and capture side by side
  safety-label-<slug>-<n>x.png PNG download
  safety-label-<slug>.pdf      single label PDF
  safety-label-<slug>-sheet.pdf tiled sheet (with --sheet)
  safety-label-<slug>-print.html desktop print page
  safety-label-<slug>.zpl      thermal command script
  safety-label-<slug>-zpl.html thermal simulation (when no agent answers)

OPTIONS:
  --config <file>             JSON preview config (fields default when omitted)
  --out <dir>                 output directory (default: target/label-preview)
  --open                      open generated pages in the browser
  --send                      send the thermal script to the print agent on 127.0.0.1:9100
  --png-scale <n>             PNG download multiplier (default: 3)
  --sheet <rows>x<cols>       also export a tiled sheet PDF
  --paper <name>              letter|legal|a4|<w>x<h> in inches (default: letter)
  --margin <in>               sheet margin in inches (default: 0.125)
  --dpi <n>                   thermal printer resolution (default: 203)
  --darkness <n>              thermal darkness 0-30 (default: 15)
  --copies <n>                thermal copies (default: 1)
  --threshold <n>             monochrome luminance threshold (default: 140)
  --landscape                 rotate the label for landscape feed

Without a label file a built-in sample label is used.
"#
}
