//! Hazard label composition and print encoding.
//!
//! This crate holds the pure half of the pipeline: the label data model,
//! pictogram resolution, proportional layout, physical unit conversion,
//! sheet tiling, monochrome bitmap packing and thermal command assembly.
//! Nothing here performs I/O; rendering lives in `hazard-label-render` and
//! its backends, and channel dispatch lives in `hazard-label-print`.
//!
//! ```
//! use hazard_label::{LayoutEngine, LabelSpec, HmisRating, CanvasSize};
//!
//! let spec = LabelSpec::new("Acetone", CanvasSize::new(288, 192))
//!     .with_rating(HmisRating::new(2, 3, 0, "A"));
//! let geometry = LayoutEngine::default().layout(&spec);
//! assert_eq!(geometry.rating_boxes.len(), 4);
//! ```

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

pub mod error;
pub mod label;
pub mod layout;
pub mod monochrome;
pub mod pictogram;
pub mod raster;
pub mod sheet;
pub mod thermal;
pub mod units;

pub use error::LabelError;
pub use label::{CanvasSize, HmisRating, LabelSpec, RatingCategory, SignalWord};
pub use layout::{
    FontSizes, LayoutConfig, LayoutEngine, LayoutGeometry, PixelRect, RatingBox, Zone,
};
pub use monochrome::{encode, EncodedBitmap, MonochromeEncoder, DEFAULT_THRESHOLD};
pub use pictogram::{resolve, Pictogram, PictogramSet};
pub use raster::RasterBuffer;
pub use sheet::{plan as plan_sheet, TileGrid, TileOrigin};
pub use thermal::{
    assemble, CommandScript, CommandSegment, MediaMode, Orientation, SegmentKind, ThermalPrint,
};
pub use units::{scale_for_dpi, to_dots, to_physical, PaperSize, PhysicalSize, SCREEN_DPI};
