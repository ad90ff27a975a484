//! Print channels for `hazard-label`: desktop print pages, PDF export,
//! thermal printing through a local agent, and PNG downloads.

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod agent;
mod dispatch;
mod pdf;
mod present;

pub use agent::{
    AgentDevice, BrowserPrintAgent, NoAgent, PrintAgent, DEFAULT_AGENT_ADDR,
    DEFAULT_DETECT_TIMEOUT,
};
pub use dispatch::{
    bitmap_preview, pdf_file_name, png_file_name, zpl_file_name, Artifact, CancelToken, Channel,
    Delivery, DesktopPrint, DispatchConfig, DownloadPng, JobError, JobState, NeverCancel,
    Notification, NotificationLevel, PdfExport, PrintDispatcher, PrintJobConfig, PrintJobReport,
    TileRequest,
};
pub use pdf::{single_label_pdf, tiled_sheet_pdf};
pub use present::{Document, DocumentKind, Presenter, SystemPresenter};
