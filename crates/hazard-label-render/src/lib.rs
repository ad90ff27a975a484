//! Render IR and label composer for `hazard-label`.

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

mod render_engine;
mod render_ir;

pub use hazard_label::{LabelSpec, LayoutEngine, LayoutGeometry, Pictogram, RatingCategory};
pub use render_engine::{ApproxTextMeasurer, ComposeConfig, LabelComposer, TextMeasurer};
pub use render_ir::{
    DiamondCommand, DrawCommand, LabelPage, PageMetrics, RectCommand, ResolvedTextStyle, Rgb,
    RuleCommand, TextCommand, TextRole,
};
