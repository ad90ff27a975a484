use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use hazard_label::{
    CanvasSize, HmisRating, LabelError, LabelSpec, Orientation, PaperSize, PhysicalSize,
    ThermalPrint,
};
use hazard_label_embedded_graphics::{EgTextMeasurer, LabelSurface, SurfaceStyle};
use hazard_label_print::{
    AgentDevice, Delivery, DesktopPrint, Document, DocumentKind, DownloadPng, JobError, JobState,
    NeverCancel, Notification, NotificationLevel, PdfExport, Presenter, PrintAgent,
    PrintDispatcher, PrintJobConfig, TileRequest,
};
use hazard_label_render::LabelComposer;

#[derive(Default)]
struct StubAgent {
    device: Option<AgentDevice>,
    fail_send: bool,
    sent: Mutex<Vec<String>>,
}

impl StubAgent {
    fn online() -> Self {
        Self {
            device: Some(AgentDevice {
                name: "ZD421".to_string(),
                uid: "usb-1".to_string(),
                ..AgentDevice::default()
            }),
            ..Self::default()
        }
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("lock should pass").clone()
    }
}

impl PrintAgent for StubAgent {
    async fn detect(&self) -> Option<AgentDevice> {
        self.device.clone()
    }

    async fn send(&self, _device: &AgentDevice, script: &str) -> Result<(), LabelError> {
        self.sent
            .lock()
            .expect("lock should pass")
            .push(script.to_string());
        if self.fail_send {
            Err(LabelError::DeviceCommunicationFailure {
                message: "printer offline".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
struct RecordingPresenter {
    blocked: bool,
    documents: Mutex<Vec<Document>>,
}

impl RecordingPresenter {
    fn documents(&self) -> Vec<Document> {
        self.documents.lock().expect("lock should pass").clone()
    }
}

impl Presenter for RecordingPresenter {
    fn present(&self, document: &Document) -> Result<(), LabelError> {
        if self.blocked {
            return Err(LabelError::PopupBlocked {
                hint: "allow pop-ups for this site".to_string(),
            });
        }
        self.documents
            .lock()
            .expect("lock should pass")
            .push(document.clone());
        Ok(())
    }
}

fn acetone() -> LabelSpec {
    LabelSpec::new("Acetone", CanvasSize::new(288, 192))
        .with_manufacturer("Acme Chemical")
        .with_rating(HmisRating::new(1, 3, 0, "B"))
        .with_hazard_statement("H225")
        .with_hazard_statement("H319")
        .with_pictogram("GHS02")
        .with_pictogram("GHS07")
        .with_ppe("goggles")
}

fn surface_for(spec: &LabelSpec) -> LabelSurface {
    let page = LabelComposer::default()
        .with_text_measurer(EgTextMeasurer::shared())
        .compose(spec);
    LabelSurface::new("label", page)
}

fn dispatcher(
    agent: StubAgent,
    presenter: RecordingPresenter,
) -> (
    PrintDispatcher<StubAgent, RecordingPresenter>,
    Arc<Mutex<Vec<Notification>>>,
) {
    let notifications = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&notifications);
    let mut dispatcher = PrintDispatcher::new(agent, presenter);
    dispatcher.set_notification_sink(move |n| {
        if let Ok(mut list) = sink.lock() {
            list.push(n);
        }
    });
    (dispatcher, notifications)
}

fn single_notification(notifications: &Arc<Mutex<Vec<Notification>>>) -> Notification {
    let list = notifications.lock().expect("lock should pass");
    assert_eq!(list.len(), 1, "{list:?}");
    list[0].clone()
}

const THREE_BY_TWO: PhysicalSize = PhysicalSize::new(3.0, 2.0);

#[tokio::test]
async fn thermal_job_transmits_to_detected_agent() {
    let spec = acetone();
    let mut surface = surface_for(&spec);
    let (dispatcher, notifications) =
        dispatcher(StubAgent::online(), RecordingPresenter::default());

    let report = dispatcher
        .dispatch(
            &mut surface,
            &spec,
            &PrintJobConfig::Thermal(ThermalPrint::default()),
            &NeverCancel,
        )
        .await;

    assert_eq!(
        report.transitions(),
        [
            JobState::Idle,
            JobState::Capturing,
            JobState::Encoding,
            JobState::Transmitting,
            JobState::Completed
        ]
    );
    let sent = dispatcher.agent().sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("^XA\n^LH0,0\n^PW609\n^LL406"));
    assert!(sent[0].ends_with("^FS^XZ"));
    assert_eq!(
        report.delivery(),
        Some(&Delivery::Transmitted {
            device: "ZD421".to_string()
        })
    );
    assert_eq!(surface.style(), SurfaceStyle::default());
    let notification = single_notification(&notifications);
    assert_eq!(notification.level, NotificationLevel::Success);
    assert!(notification.message.contains("ZD421"));
}

#[tokio::test]
async fn thermal_job_without_agent_presents_simulation() {
    let spec = acetone();
    let mut surface = surface_for(&spec);
    let (dispatcher, notifications) =
        dispatcher(StubAgent::default(), RecordingPresenter::default());

    let report = dispatcher
        .dispatch(
            &mut surface,
            &spec,
            &PrintJobConfig::Thermal(ThermalPrint::default()),
            &NeverCancel,
        )
        .await;

    assert_eq!(
        report.transitions(),
        [
            JobState::Idle,
            JobState::Capturing,
            JobState::Encoding,
            JobState::Simulating,
            JobState::Completed
        ]
    );
    let documents = dispatcher.presenter().documents();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].kind, DocumentKind::ThermalSimulation);
    assert_eq!(documents[0].file_name, "safety-label-acetone-zpl.html");
    assert!(documents[0].html.contains("CRC-32"));
    assert!(documents[0].html.contains("^PW609"));

    let artifact = report.artifact().expect("script artifact should be kept");
    assert_eq!(artifact.file_name, "safety-label-acetone.zpl");
    let crc = format!("{:08x}", crc32fast::hash(&artifact.bytes));
    assert!(documents[0].html.contains(&crc));

    assert_eq!(single_notification(&notifications).level, NotificationLevel::Info);
}

#[tokio::test]
async fn failed_transmission_is_not_retried() {
    let spec = acetone();
    let mut surface = surface_for(&spec);
    let agent = StubAgent {
        fail_send: true,
        ..StubAgent::online()
    };
    let (dispatcher, notifications) = dispatcher(agent, RecordingPresenter::default());

    let report = dispatcher
        .dispatch(
            &mut surface,
            &spec,
            &PrintJobConfig::Thermal(ThermalPrint::default()),
            &NeverCancel,
        )
        .await;

    assert_eq!(report.state(), JobState::Failed);
    assert_eq!(dispatcher.agent().sent().len(), 1);
    assert!(matches!(
        report.error(),
        Some(JobError::Label(LabelError::DeviceCommunicationFailure { message }))
            if message == "printer offline"
    ));
    assert_eq!(single_notification(&notifications).level, NotificationLevel::Error);
}

#[tokio::test]
async fn landscape_thermal_swaps_label_geometry() {
    let spec = acetone();
    let mut surface = surface_for(&spec);
    let (dispatcher, _) = dispatcher(StubAgent::online(), RecordingPresenter::default());
    let job = PrintJobConfig::Thermal(
        ThermalPrint::default().with_orientation(Orientation::Landscape),
    );

    let report = dispatcher
        .dispatch(&mut surface, &spec, &job, &NeverCancel)
        .await;

    assert!(report.is_completed());
    let sent = dispatcher.agent().sent();
    assert!(sent[0].contains("^PW406\n^LL609\n^FWR"));
}

#[tokio::test]
async fn thermal_label_size_overrides_canvas_derived_size() {
    let spec = acetone();
    let mut surface = surface_for(&spec);
    let (dispatcher, _) = dispatcher(StubAgent::online(), RecordingPresenter::default());
    let job = PrintJobConfig::Thermal(
        ThermalPrint::default().with_label_size(PhysicalSize::new(4.0, 6.0)),
    );

    let report = dispatcher
        .dispatch(&mut surface, &spec, &job, &NeverCancel)
        .await;

    assert!(report.is_completed());
    let sent = dispatcher.agent().sent();
    assert!(sent[0].contains("^PW812\n^LL1218\n^FWN"));
}

#[tokio::test]
async fn incompatible_sheet_fails_before_capture() {
    let spec = acetone();
    let mut surface = surface_for(&spec);
    let (dispatcher, _) = dispatcher(StubAgent::default(), RecordingPresenter::default());
    let job = PrintJobConfig::Pdf(PdfExport {
        physical: PhysicalSize::new(9.0, 2.0),
        tiles: Some(TileRequest {
            rows: 2,
            columns: 2,
            margin_inches: 0.125,
            paper: PaperSize::Letter,
        }),
    });

    let report = dispatcher
        .dispatch(&mut surface, &spec, &job, &NeverCancel)
        .await;

    assert_eq!(report.transitions(), [JobState::Idle, JobState::Failed]);
    assert!(matches!(
        report.error(),
        Some(JobError::Label(LabelError::IncompatibleSizing { axis: "width", .. }))
    ));
}

#[tokio::test]
async fn pdf_export_produces_named_artifact() {
    let spec = acetone();
    let mut surface = surface_for(&spec);
    let (dispatcher, notifications) =
        dispatcher(StubAgent::default(), RecordingPresenter::default());
    let job = PrintJobConfig::Pdf(PdfExport {
        physical: THREE_BY_TWO,
        tiles: Some(TileRequest {
            rows: 100,
            columns: 100,
            margin_inches: 0.125,
            paper: PaperSize::Letter,
        }),
    });

    let mut report = dispatcher
        .dispatch(&mut surface, &spec, &job, &NeverCancel)
        .await;

    assert_eq!(
        report.transitions(),
        [
            JobState::Idle,
            JobState::Capturing,
            JobState::Encoding,
            JobState::Completed
        ]
    );
    let artifact = report.take_artifact().expect("pdf artifact should exist");
    assert_eq!(artifact.file_name, "safety-label-acetone.pdf");
    assert_eq!(artifact.media_type, "application/pdf");
    assert!(artifact.bytes.starts_with(b"%PDF-"));
    assert_eq!(
        single_notification(&notifications).message,
        "Saved safety-label-acetone.pdf"
    );
}

#[tokio::test]
async fn download_uses_resolution_suffix() {
    let spec = acetone();
    let mut surface = surface_for(&spec);
    let (dispatcher, _) = dispatcher(StubAgent::default(), RecordingPresenter::default());

    let report = dispatcher
        .dispatch(
            &mut surface,
            &spec,
            &PrintJobConfig::Download(DownloadPng { scale: 2 }),
            &NeverCancel,
        )
        .await;

    let artifact = report.artifact().expect("png artifact should exist");
    assert_eq!(artifact.file_name, "safety-label-acetone-2x.png");
    assert!(artifact.bytes.starts_with(b"\x89PNG"));
}

#[tokio::test]
async fn desktop_print_presents_page_sized_document() {
    let spec = acetone();
    let mut surface = surface_for(&spec);
    let (dispatcher, _) = dispatcher(StubAgent::default(), RecordingPresenter::default());

    let report = dispatcher
        .dispatch(
            &mut surface,
            &spec,
            &PrintJobConfig::Desktop(DesktopPrint {
                physical: THREE_BY_TWO,
            }),
            &NeverCancel,
        )
        .await;

    assert!(report.is_completed());
    let documents = dispatcher.presenter().documents();
    assert_eq!(documents[0].kind, DocumentKind::DesktopPrint);
    assert!(documents[0]
        .html
        .contains("@page { size: 3in 2in; margin: 0 }"));
}

#[tokio::test]
async fn blocked_popup_fails_and_restores_surface() {
    let spec = acetone();
    let mut surface = surface_for(&spec);
    let presenter = RecordingPresenter {
        blocked: true,
        ..RecordingPresenter::default()
    };
    let (dispatcher, notifications) = dispatcher(StubAgent::default(), presenter);

    let report = dispatcher
        .dispatch(
            &mut surface,
            &spec,
            &PrintJobConfig::Desktop(DesktopPrint {
                physical: THREE_BY_TWO,
            }),
            &NeverCancel,
        )
        .await;

    assert_eq!(report.state(), JobState::Failed);
    assert!(matches!(
        report.error(),
        Some(JobError::Label(LabelError::PopupBlocked { .. }))
    ));
    assert_eq!(surface.style(), SurfaceStyle::default());
    assert!(single_notification(&notifications)
        .message
        .contains("allow pop-ups"));
}

#[tokio::test]
async fn cancelled_job_ends_failed() {
    let spec = acetone();
    let mut surface = surface_for(&spec);
    let (dispatcher, _) = dispatcher(StubAgent::online(), RecordingPresenter::default());
    let cancel = AtomicBool::new(true);

    let report = dispatcher
        .dispatch(
            &mut surface,
            &spec,
            &PrintJobConfig::Thermal(ThermalPrint::default()),
            &cancel,
        )
        .await;

    assert_eq!(report.transitions(), [JobState::Idle, JobState::Failed]);
    assert_eq!(report.error(), Some(&JobError::Cancelled));
    assert!(dispatcher.agent().sent().is_empty());
}

#[tokio::test]
async fn invalid_label_is_rejected() {
    let spec = LabelSpec::new("   ", CanvasSize::new(288, 192));
    let mut surface = surface_for(&spec);
    let (dispatcher, _) = dispatcher(StubAgent::default(), RecordingPresenter::default());

    let report = dispatcher
        .dispatch(
            &mut surface,
            &spec,
            &PrintJobConfig::Download(DownloadPng { scale: 1 }),
            &NeverCancel,
        )
        .await;

    assert!(matches!(
        report.error(),
        Some(JobError::Label(LabelError::InvalidLabel {
            field: "product_name",
            ..
        }))
    ));
}
