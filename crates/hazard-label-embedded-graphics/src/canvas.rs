use core::convert::Infallible;

use embedded_graphics::{pixelcolor::Rgb888, prelude::*, primitives::Rectangle};
use image::{Rgba, RgbaImage};

/// Opaque RGBA framebuffer backed by an [`image::RgbaImage`].
#[derive(Clone, Debug)]
pub struct RgbaCanvas {
    image: RgbaImage,
}

impl RgbaCanvas {
    /// White canvas of `width x height`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> Vec<u8> {
        self.image.into_raw()
    }

    fn put(&mut self, point: Point, color: Rgb888) {
        let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) else {
            return;
        };
        if x < self.image.width() && y < self.image.height() {
            self.image
                .put_pixel(x, y, Rgba([color.r(), color.g(), color.b(), 255]));
        }
    }
}

impl OriginDimensions for RgbaCanvas {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

impl DrawTarget for RgbaCanvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.put(point, color);
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };
        let rgba = Rgba([color.r(), color.g(), color.b(), 255]);
        for y in area.top_left.y..=bottom_right.y {
            for x in area.top_left.x..=bottom_right.x {
                self.image.put_pixel(x as u32, y as u32, rgba);
            }
        }
        Ok(())
    }
}

/// Draw target adapter that magnifies every pixel into a `factor x factor`
/// block of the wrapped target.
///
/// Rendering the 1x page through this adapter gives a supersampled capture
/// whose pixels line up exactly with the on-screen preview.
#[derive(Debug)]
pub struct ScaledTarget<'a, D> {
    inner: &'a mut D,
    factor: u32,
}

impl<'a, D> ScaledTarget<'a, D>
where
    D: DrawTarget,
{
    pub fn new(inner: &'a mut D, factor: u32) -> Self {
        Self {
            inner,
            factor: factor.max(1),
        }
    }

    pub fn factor(&self) -> u32 {
        self.factor
    }
}

impl<D> Dimensions for ScaledTarget<'_, D>
where
    D: DrawTarget,
{
    fn bounding_box(&self) -> Rectangle {
        let inner = self.inner.bounding_box();
        let k = self.factor;
        Rectangle::new(
            Point::new(inner.top_left.x / k as i32, inner.top_left.y / k as i32),
            Size::new(inner.size.width / k, inner.size.height / k),
        )
    }
}

impl<D> DrawTarget for ScaledTarget<'_, D>
where
    D: DrawTarget,
{
    type Color = D::Color;
    type Error = D::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let k = self.factor as i32;
        let block = Size::new(self.factor, self.factor);
        for Pixel(point, color) in pixels {
            let top_left = Point::new(point.x.saturating_mul(k), point.y.saturating_mul(k));
            self.inner.fill_solid(&Rectangle::new(top_left, block), color)?;
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let k = self.factor;
        let scaled = Rectangle::new(
            Point::new(
                area.top_left.x.saturating_mul(k as i32),
                area.top_left.y.saturating_mul(k as i32),
            ),
            Size::new(
                area.size.width.saturating_mul(k),
                area.size.height.saturating_mul(k),
            ),
        );
        self.inner.fill_solid(&scaled, color)
    }
}
