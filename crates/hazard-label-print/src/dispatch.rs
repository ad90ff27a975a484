//! Print job orchestration across the desktop, PDF, thermal, and download
//! channels.

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use hazard_label::{
    assemble, encode, plan_sheet, scale_for_dpi, to_dots, EncodedBitmap, LabelError, LabelSpec,
    Orientation, PaperSize, PhysicalSize, RasterBuffer, ThermalPrint, TileGrid, SCREEN_DPI,
};
use hazard_label_embedded_graphics::{encode_png, resample, LabelSurface, RasterCapturer};
use hazard_label_render_web::{
    desktop_print_document, simulation_document, SimulationView, DEFAULT_SETTLE_MS,
};

use crate::agent::{AgentDevice, PrintAgent};
use crate::pdf::{single_label_pdf, tiled_sheet_pdf};
use crate::present::{Document, DocumentKind, Presenter};

/// Cancellation hook polled between job stages.
pub trait CancelToken {
    fn is_cancelled(&self) -> bool;
}

/// Never-cancel token for default call paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl CancelToken for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl CancelToken for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

/// Lifecycle of one print job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Capturing,
    Encoding,
    Transmitting,
    Simulating,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Why a job ended in [`JobState::Failed`].
#[derive(Clone, Debug, PartialEq)]
pub enum JobError {
    Label(LabelError),
    Cancelled,
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(err) => write!(f, "{}", err),
            Self::Cancelled => write!(f, "print job cancelled"),
        }
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Label(err) => Some(err),
            Self::Cancelled => None,
        }
    }
}

impl From<LabelError> for JobError {
    fn from(err: LabelError) -> Self {
        Self::Label(err)
    }
}

/// Desktop print dialog settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DesktopPrint {
    pub physical: PhysicalSize,
}

/// Grid request for a tiled sheet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileRequest {
    pub rows: u32,
    pub columns: u32,
    pub margin_inches: f64,
    pub paper: PaperSize,
}

/// PDF export settings. Without `tiles` the page is the label itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PdfExport {
    pub physical: PhysicalSize,
    pub tiles: Option<TileRequest>,
}

/// PNG download at a resolution multiplier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DownloadPng {
    pub scale: u32,
}

/// Settings for one print action. Built per action and consumed once.
#[derive(Clone, Debug, PartialEq)]
pub enum PrintJobConfig {
    Desktop(DesktopPrint),
    Pdf(PdfExport),
    Thermal(ThermalPrint),
    Download(DownloadPng),
}

impl PrintJobConfig {
    pub fn channel(&self) -> Channel {
        match self {
            Self::Desktop(_) => Channel::Desktop,
            Self::Pdf(_) => Channel::Pdf,
            Self::Thermal(_) => Channel::Thermal,
            Self::Download(_) => Channel::Download,
        }
    }
}

/// Output channel of a job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Desktop,
    Pdf,
    Thermal,
    Download,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Pdf => "pdf",
            Self::Thermal => "thermal",
            Self::Download => "download",
        }
    }
}

/// File produced by a job for the caller to save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

/// How a completed job reached the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    Presented(DocumentKind),
    Saved,
    Transmitted { device: String },
    Simulated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// User-facing outcome message. Each job emits exactly one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub channel: Channel,
    pub message: String,
}

/// Record of a finished job.
#[derive(Clone, Debug, PartialEq)]
pub struct PrintJobReport {
    channel: Channel,
    transitions: Vec<JobState>,
    delivery: Option<Delivery>,
    artifact: Option<Artifact>,
    error: Option<JobError>,
}

impl PrintJobReport {
    fn new(channel: Channel) -> Self {
        Self {
            channel,
            transitions: vec![JobState::Idle],
            delivery: None,
            artifact: None,
            error: None,
        }
    }

    fn enter(&mut self, state: JobState) {
        log::debug!("{} job: {:?} -> {:?}", self.channel.as_str(), self.state(), state);
        self.transitions.push(state);
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn state(&self) -> JobState {
        self.transitions.last().copied().unwrap_or(JobState::Idle)
    }

    /// Every state the job passed through, starting at `Idle`.
    pub fn transitions(&self) -> &[JobState] {
        &self.transitions
    }

    pub fn delivery(&self) -> Option<&Delivery> {
        self.delivery.as_ref()
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    pub fn take_artifact(&mut self) -> Option<Artifact> {
        self.artifact.take()
    }

    pub fn error(&self) -> Option<&JobError> {
        self.error.as_ref()
    }

    pub fn is_completed(&self) -> bool {
        self.state() == JobState::Completed
    }
}

/// Dispatcher tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Target resolution for desktop and PDF captures.
    pub print_dpi: u32,
    /// Upper bound on the capture supersampling factor.
    pub max_capture_scale: u32,
    /// Delay before the desktop page opens the print dialog.
    pub settle_ms: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            print_dpi: 300,
            max_capture_scale: 8,
            settle_ms: DEFAULT_SETTLE_MS,
        }
    }
}

impl DispatchConfig {
    pub fn with_print_dpi(mut self, print_dpi: u32) -> Self {
        self.print_dpi = print_dpi;
        self
    }

    pub fn with_max_capture_scale(mut self, max_capture_scale: u32) -> Self {
        self.max_capture_scale = max_capture_scale;
        self
    }

    pub fn with_settle_ms(mut self, settle_ms: u32) -> Self {
        self.settle_ms = settle_ms;
        self
    }
}

/// `safety-label-<slug>.pdf`
pub fn pdf_file_name(spec: &LabelSpec) -> String {
    format!("safety-label-{}.pdf", spec.slug())
}

/// `safety-label-<slug>-<scale>x.png`
pub fn png_file_name(spec: &LabelSpec, scale: u32) -> String {
    format!("safety-label-{}-{}x.png", spec.slug(), scale)
}

/// `safety-label-<slug>.zpl`
pub fn zpl_file_name(spec: &LabelSpec) -> String {
    format!("safety-label-{}.zpl", spec.slug())
}

type NotificationCallback = Arc<Mutex<Box<dyn FnMut(Notification) + Send + 'static>>>;
type NotificationSink = Option<NotificationCallback>;

/// Routes a captured label to the channel named by its job config.
pub struct PrintDispatcher<A, P> {
    agent: A,
    presenter: P,
    capturer: RasterCapturer,
    cfg: DispatchConfig,
    notification_sink: NotificationSink,
}

impl<A, P> fmt::Debug for PrintDispatcher<A, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrintDispatcher")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

impl<A, P> PrintDispatcher<A, P>
where
    A: PrintAgent,
    P: Presenter,
{
    pub fn new(agent: A, presenter: P) -> Self {
        Self {
            agent,
            presenter,
            capturer: RasterCapturer::new(),
            cfg: DispatchConfig::default(),
            notification_sink: None,
        }
    }

    pub fn with_config(mut self, cfg: DispatchConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn config(&self) -> DispatchConfig {
        self.cfg
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Register or replace the notification sink.
    pub fn set_notification_sink<F>(&mut self, sink: F)
    where
        F: FnMut(Notification) + Send + 'static,
    {
        self.notification_sink = Some(Arc::new(Mutex::new(Box::new(sink))));
    }

    fn notify(&self, notification: Notification) {
        let Some(sink) = &self.notification_sink else {
            return;
        };
        if let Ok(mut sink) = sink.lock() {
            sink(notification);
        }
    }

    /// Runs one job to a terminal state. Failures are never retried.
    pub async fn dispatch<C>(
        &self,
        surface: &mut LabelSurface,
        spec: &LabelSpec,
        job: &PrintJobConfig,
        cancel: &C,
    ) -> PrintJobReport
    where
        C: CancelToken + ?Sized,
    {
        let mut report = PrintJobReport::new(job.channel());
        let outcome = match job {
            PrintJobConfig::Desktop(desktop) => {
                self.run_desktop(&mut report, surface, spec, desktop, cancel)
                    .await
            }
            PrintJobConfig::Pdf(pdf) => self.run_pdf(&mut report, surface, spec, pdf, cancel).await,
            PrintJobConfig::Thermal(thermal) => {
                self.run_thermal(&mut report, surface, spec, thermal, cancel)
                    .await
            }
            PrintJobConfig::Download(download) => {
                self.run_download(&mut report, surface, spec, download, cancel)
                    .await
            }
        };

        match outcome {
            Ok(()) => {
                report.enter(JobState::Completed);
                let notification = self.success_notification(&report, spec);
                log::info!(
                    "{} job for '{}' completed",
                    report.channel.as_str(),
                    spec.product_name
                );
                self.notify(notification);
            }
            Err(err) => {
                report.enter(JobState::Failed);
                log::error!(
                    "{} job for '{}' failed: {}",
                    report.channel.as_str(),
                    spec.product_name,
                    err
                );
                self.notify(Notification {
                    level: NotificationLevel::Error,
                    channel: report.channel,
                    message: failure_message(&err),
                });
                report.error = Some(err);
            }
        }
        report
    }

    fn success_notification(&self, report: &PrintJobReport, spec: &LabelSpec) -> Notification {
        let (level, message) = match (&report.delivery, &report.artifact) {
            (Some(Delivery::Simulated), _) => (
                NotificationLevel::Info,
                "No print agent detected; opened a print simulation instead".to_string(),
            ),
            (Some(Delivery::Transmitted { device }), _) => (
                NotificationLevel::Success,
                format!("Sent '{}' to {}", spec.product_name, device),
            ),
            (Some(Delivery::Presented(_)), _) => (
                NotificationLevel::Success,
                format!("Opened print dialog for '{}'", spec.product_name),
            ),
            (_, Some(artifact)) => (
                NotificationLevel::Success,
                format!("Saved {}", artifact.file_name),
            ),
            _ => (
                NotificationLevel::Success,
                format!("Finished '{}'", spec.product_name),
            ),
        };
        Notification {
            level,
            channel: report.channel,
            message,
        }
    }

    fn capture_scale(
        &self,
        surface: &LabelSurface,
        physical: PhysicalSize,
    ) -> Result<u32, LabelError> {
        let page = surface.page();
        let width_dots = to_dots(physical.width_in, self.cfg.print_dpi)?;
        let height_dots = to_dots(physical.height_in, self.cfg.print_dpi)?;
        let scale =
            scale_for_dpi(page.width, width_dots).max(scale_for_dpi(page.height, height_dots));
        Ok(scale.min(self.cfg.max_capture_scale.max(1)))
    }

    async fn capture<C>(
        &self,
        report: &mut PrintJobReport,
        surface: &mut LabelSurface,
        spec: &LabelSpec,
        scale: u32,
        cancel: &C,
    ) -> Result<RasterBuffer, JobError>
    where
        C: CancelToken + ?Sized,
    {
        checkpoint(cancel)?;
        spec.validate()?;
        report.enter(JobState::Capturing);
        let raster = self.capturer.capture(surface, scale)?;
        tokio::task::yield_now().await;
        checkpoint(cancel)?;
        report.enter(JobState::Encoding);
        Ok(raster)
    }

    async fn run_desktop<C>(
        &self,
        report: &mut PrintJobReport,
        surface: &mut LabelSurface,
        spec: &LabelSpec,
        desktop: &DesktopPrint,
        cancel: &C,
    ) -> Result<(), JobError>
    where
        C: CancelToken + ?Sized,
    {
        let scale = self.capture_scale(surface, desktop.physical)?;
        let raster = self.capture(report, surface, spec, scale, cancel).await?;
        let png = encode_png(&raster)?;
        let html = desktop_print_document(
            &spec.product_name,
            &png,
            desktop.physical,
            self.cfg.settle_ms,
        );
        checkpoint(cancel)?;
        self.presenter.present(&Document {
            kind: DocumentKind::DesktopPrint,
            file_name: format!("safety-label-{}-print.html", spec.slug()),
            html,
        })?;
        report.delivery = Some(Delivery::Presented(DocumentKind::DesktopPrint));
        Ok(())
    }

    async fn run_pdf<C>(
        &self,
        report: &mut PrintJobReport,
        surface: &mut LabelSurface,
        spec: &LabelSpec,
        pdf: &PdfExport,
        cancel: &C,
    ) -> Result<(), JobError>
    where
        C: CancelToken + ?Sized,
    {
        let grid: Option<TileGrid> = match pdf.tiles {
            Some(tiles) => Some(plan_sheet(
                tiles.paper.size(),
                pdf.physical,
                tiles.margin_inches,
                tiles.rows,
                tiles.columns,
            )?),
            None => None,
        };
        let scale = self.capture_scale(surface, pdf.physical)?;
        let raster = self.capture(report, surface, spec, scale, cancel).await?;
        let bytes = match &grid {
            Some(grid) => tiled_sheet_pdf(&raster, grid)?,
            None => single_label_pdf(&raster, pdf.physical)?,
        };
        checkpoint(cancel)?;
        report.artifact = Some(Artifact {
            file_name: pdf_file_name(spec),
            media_type: "application/pdf",
            bytes,
        });
        report.delivery = Some(Delivery::Saved);
        Ok(())
    }

    async fn run_download<C>(
        &self,
        report: &mut PrintJobReport,
        surface: &mut LabelSurface,
        spec: &LabelSpec,
        download: &DownloadPng,
        cancel: &C,
    ) -> Result<(), JobError>
    where
        C: CancelToken + ?Sized,
    {
        let raster = self
            .capture(report, surface, spec, download.scale, cancel)
            .await?;
        let bytes = encode_png(&raster)?;
        checkpoint(cancel)?;
        report.artifact = Some(Artifact {
            file_name: png_file_name(spec, download.scale),
            media_type: "image/png",
            bytes,
        });
        report.delivery = Some(Delivery::Saved);
        Ok(())
    }

    async fn run_thermal<C>(
        &self,
        report: &mut PrintJobReport,
        surface: &mut LabelSurface,
        spec: &LabelSpec,
        thermal: &ThermalPrint,
        cancel: &C,
    ) -> Result<(), JobError>
    where
        C: CancelToken + ?Sized,
    {
        thermal.validate()?;
        let page = surface.page();
        let physical = match thermal.label_size {
            Some(size) => size,
            None => PhysicalSize::from_pixels(page.width, page.height, SCREEN_DPI)?,
        };
        let width_dots = to_dots(physical.width_in, thermal.dpi)?;
        let height_dots = to_dots(physical.height_in, thermal.dpi)?;
        let scale =
            scale_for_dpi(page.width, width_dots).max(scale_for_dpi(page.height, height_dots));

        let raster = self.capture(report, surface, spec, scale, cancel).await?;
        let (raster, target_w, target_h) = match thermal.orientation {
            Orientation::Portrait => (raster, width_dots, height_dots),
            Orientation::Landscape => (raster.rotated_cw(), height_dots, width_dots),
        };
        let sized = resample(&raster, target_w, target_h)?;
        drop(raster);
        let bitmap = encode(&sized, thermal.threshold)?;
        let script = assemble(&bitmap, thermal, target_w, target_h)?.to_text();
        tokio::task::yield_now().await;
        checkpoint(cancel)?;

        report.artifact = Some(Artifact {
            file_name: zpl_file_name(spec),
            media_type: "text/plain",
            bytes: script.clone().into_bytes(),
        });

        match self.agent.detect().await {
            Some(device) => {
                checkpoint(cancel)?;
                report.enter(JobState::Transmitting);
                self.transmit(&device, &script).await?;
                report.delivery = Some(Delivery::Transmitted {
                    device: device_label(&device),
                });
            }
            None => {
                log::warn!(
                    "no print agent for '{}'; presenting thermal simulation",
                    spec.product_name
                );
                checkpoint(cancel)?;
                report.enter(JobState::Simulating);
                let preview = encode_png(&bitmap_preview(&bitmap))?;
                let html = simulation_document(&SimulationView {
                    title: &spec.product_name,
                    preview_png: &preview,
                    script_text: &script,
                    script_crc32: crc32fast::hash(script.as_bytes()),
                    config: thermal,
                    width_dots: target_w,
                    height_dots: target_h,
                });
                self.presenter.present(&Document {
                    kind: DocumentKind::ThermalSimulation,
                    file_name: format!("safety-label-{}-zpl.html", spec.slug()),
                    html,
                })?;
                report.delivery = Some(Delivery::Simulated);
            }
        }
        Ok(())
    }

    async fn transmit(&self, device: &AgentDevice, script: &str) -> Result<(), LabelError> {
        self.agent.send(device, script).await.map_err(|err| match err {
            LabelError::DeviceCommunicationFailure { .. } => err,
            other => LabelError::DeviceCommunicationFailure {
                message: other.to_string(),
            },
        })
    }
}

fn checkpoint<C>(cancel: &C) -> Result<(), JobError>
where
    C: CancelToken + ?Sized,
{
    if cancel.is_cancelled() {
        Err(JobError::Cancelled)
    } else {
        Ok(())
    }
}

fn device_label(device: &AgentDevice) -> String {
    if device.name.is_empty() {
        device.uid.clone()
    } else {
        device.name.clone()
    }
}

fn failure_message(err: &JobError) -> String {
    match err {
        JobError::Cancelled => "Print cancelled".to_string(),
        JobError::Label(LabelError::PopupBlocked { hint }) => {
            format!("Could not open a print window: {}", hint)
        }
        JobError::Label(LabelError::DeviceCommunicationFailure { message }) => {
            format!("Printer communication failed: {}", message)
        }
        JobError::Label(err) => format!("Print failed: {}", err),
    }
}

/// What the printer would burn, as black on white RGBA.
pub fn bitmap_preview(bitmap: &EncodedBitmap) -> RasterBuffer {
    let mut raster = RasterBuffer::filled(bitmap.width(), bitmap.height(), [255, 255, 255, 255]);
    for y in 0..bitmap.height() {
        for x in 0..bitmap.width() {
            if bitmap.is_black(x, y) {
                raster.set_pixel(x, y, [0, 0, 0, 255]);
            }
        }
    }
    raster
}
