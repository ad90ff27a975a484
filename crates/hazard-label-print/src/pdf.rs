//! PDF documents sized to the label's physical footprint.

use hazard_label::{LabelError, PhysicalSize, RasterBuffer, TileGrid};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref};

const POINTS_PER_INCH: f64 = 72.0;
const IMAGE_NAME: Name<'static> = Name(b"Im0");

/// One-page PDF whose page box equals `physical`, with the label full-bleed.
pub fn single_label_pdf(
    raster: &RasterBuffer,
    physical: PhysicalSize,
) -> Result<Vec<u8>, LabelError> {
    write_document(raster, physical, physical, core::iter::once((0.0, 0.0)))
}

/// One-page PDF of `grid.paper` with the label stamped at every tile origin.
pub fn tiled_sheet_pdf(raster: &RasterBuffer, grid: &TileGrid) -> Result<Vec<u8>, LabelError> {
    write_document(
        raster,
        grid.paper,
        grid.label,
        grid.origins().map(|origin| (origin.x_in, origin.y_in)),
    )
}

/// Stamps the label image at each `(x, y)` inch offset from the page's top-left.
fn write_document<I>(
    raster: &RasterBuffer,
    page: PhysicalSize,
    label: PhysicalSize,
    placements: I,
) -> Result<Vec<u8>, LabelError>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    if raster.is_empty() || !page.is_positive() || !label.is_positive() {
        return Err(LabelError::InvalidDimensions {
            stage: "pdf",
            width: raster.width(),
            height: raster.height(),
        });
    }

    let mut next_id = 1;
    let mut alloc = || {
        let id = Ref::new(next_id);
        next_id += 1;
        id
    };
    let catalog_id = alloc();
    let pages_id = alloc();
    let page_id = alloc();
    let image_id = alloc();
    let content_id = alloc();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id).kids([page_id]).count(1);

    let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&raster.to_rgb_over_white(), 6);
    {
        let mut image = pdf.image_xobject(image_id, &compressed);
        image.filter(Filter::FlateDecode);
        image.width(raster.width() as i32);
        image.height(raster.height() as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
    }

    let page_w = points(page.width_in);
    let page_h = points(page.height_in);
    let label_w = points(label.width_in);
    let label_h = points(label.height_in);

    let mut content = Content::new();
    let mut stamps = 0usize;
    for (x_in, y_in) in placements {
        // PDF space grows upward from the bottom-left corner.
        let x = points(x_in);
        let y = page_h - points(y_in) - label_h;
        content.save_state();
        content.transform([label_w, 0.0, 0.0, label_h, x, y]);
        content.x_object(IMAGE_NAME);
        content.restore_state();
        stamps += 1;
    }
    pdf.stream(content_id, &content.finish());

    {
        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, page_w, page_h))
            .parent(pages_id)
            .contents(content_id);
        page.resources().x_objects().pair(IMAGE_NAME, image_id);
    }

    log::debug!(
        "pdf {:.2}x{:.2} in with {} stamp(s) of a {}x{} px label",
        page.width_in,
        page.height_in,
        stamps,
        raster.width(),
        raster.height()
    );
    Ok(pdf.finish())
}

fn points(inches: f64) -> f32 {
    (inches * POINTS_PER_INCH) as f32
}
