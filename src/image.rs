//! Simple RGBA container used to composite frames into an atlas.

use std::io::Write;

use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, ColorType, DynamicImage, ImageResult,
    RgbaImage,
};

use tilegrid::Rect;

const STRIDE: usize = 4;

/// Number of bytes an RGBA8 image of `size` takes, if that fits in memory.
pub fn byte_len(size: (u32, u32)) -> Option<usize> {
    (size.0 as usize)
        .checked_mul(size.1 as usize)?
        .checked_mul(STRIDE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const WHITE: Pixel = Pixel::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Composites this pixel over an opaque background.
    fn over(self, background: Pixel) -> Pixel {
        let alpha = u32::from(self.a);
        let blend = |fg: u8, bg: u8| {
            ((u32::from(fg) * alpha + u32::from(bg) * (255 - alpha) + 127) / 255) as u8
        };

        Pixel {
            r: blend(self.r, background.r),
            g: blend(self.g, background.g),
            b: blend(self.b, background.b),
            a: 255,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    size: (u32, u32),
    data: Vec<u8>,
}

impl Image {
    pub fn new_rgba8<D: Into<Vec<u8>>>(size: (u32, u32), data: D) -> Self {
        let data = data.into();

        assert!(Some(data.len()) == byte_len(size));

        Self { size, data }
    }

    /// Panics if the image can't be addressed in memory; callers with
    /// untrusted sizes check `byte_len` first.
    pub fn new_filled(size: (u32, u32), fill: Pixel) -> Self {
        let len = byte_len(size).expect("image size overflows memory");
        let data = [fill.r, fill.g, fill.b, fill.a]
            .iter()
            .copied()
            .cycle()
            .take(len)
            .collect::<Vec<u8>>();

        Self::new_rgba8(size, data)
    }

    /// Decodes any format the `image` crate understands, flattening
    /// transparency onto `background` so every frame ends up opaque.
    pub fn decode(contents: &[u8], background: Pixel) -> ImageResult<Self> {
        let decoded = image::load_from_memory(contents)?;
        Ok(Self::from_dynamic(decoded, background))
    }

    pub fn from_dynamic(decoded: DynamicImage, background: Pixel) -> Self {
        let has_alpha = decoded.color().has_alpha();
        let buffer = decoded.to_rgba8();
        let size = buffer.dimensions();
        let mut image = Self::new_rgba8(size, buffer.into_raw());

        if has_alpha {
            for pixel in image.data.chunks_exact_mut(STRIDE) {
                let flat = Pixel::new(pixel[0], pixel[1], pixel[2], pixel[3]).over(background);
                pixel.copy_from_slice(&[flat.r, flat.g, flat.b, flat.a]);
            }
        }

        image
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Resamples to exactly `size` with a Lanczos filter. Returns a clone if the
    /// image already has that size.
    pub fn resized(&self, size: (u32, u32)) -> Self {
        if size == self.size {
            return self.clone();
        }

        let buffer = RgbaImage::from_raw(self.size.0, self.size.1, self.data.clone())
            .expect("image buffer always matches its size");
        let resized = image::imageops::resize(&buffer, size.0, size.1, FilterType::Lanczos3);

        Self::new_rgba8(size, resized.into_raw())
    }

    pub fn blit(&mut self, other: &Image, pos: (u32, u32)) {
        assert!(pos.0 + other.size.0 <= self.size.0);
        assert!(pos.1 + other.size.1 <= self.size.1);

        let other_width_bytes = other.size.0 as usize * STRIDE;
        let other_rows = other.data.chunks_exact(other_width_bytes);

        for (other_y, other_row) in other_rows.enumerate() {
            let self_y = pos.1 as usize + other_y;

            let start_px = pos.0 as usize + self.size.0 as usize * self_y;

            let start_in_bytes = STRIDE * start_px;
            let end_in_bytes = start_in_bytes + other_row.len();

            let self_row = &mut self.data[start_in_bytes..end_in_bytes];
            self_row.copy_from_slice(other_row);
        }
    }

    /// Copies out the pixels covered by `rect`.
    pub fn crop(&self, rect: Rect) -> Image {
        let bounds = Rect::new((0, 0), self.size);
        assert!(bounds.contains(&rect));

        let row_bytes = rect.size.0 as usize * STRIDE;
        let mut data = Vec::with_capacity(row_bytes * rect.size.1 as usize);

        for y in rect.pos.1..rect.pos.1 + rect.size.1 {
            let start = STRIDE * (rect.pos.0 as usize + self.size.0 as usize * y as usize);
            data.extend_from_slice(&self.data[start..start + row_bytes]);
        }

        Self::new_rgba8(rect.size, data)
    }

    pub fn encode_png<W: Write>(&self, output: W) -> Result<(), png::EncodingError> {
        let mut encoder = png::Encoder::new(output, self.size.0, self.size.1);
        encoder.set_color(png::ColorType::RGBA);
        encoder.set_depth(png::BitDepth::Eight);

        let mut output_writer = encoder.write_header()?;
        output_writer.write_image_data(&self.data)?;

        // On drop, output_writer will write the last chunk of the PNG file.
        Ok(())
    }

    /// JPEG has no alpha channel, so pixels are composited onto white first.
    pub fn encode_jpeg<W: Write>(&self, mut output: W, quality: u8) -> ImageResult<()> {
        let mut rgb = Vec::with_capacity(self.data.len() / STRIDE * 3);
        for pixel in self.data.chunks_exact(STRIDE) {
            let flat = Pixel::new(pixel[0], pixel[1], pixel[2], pixel[3]).over(Pixel::WHITE);
            rgb.extend_from_slice(&[flat.r, flat.g, flat.b]);
        }

        let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);
        encoder.encode(&rgb, self.size.0, self.size.1, ColorType::Rgb8)
    }
}

#[cfg(test)]
impl Image {
    pub fn get_pixel(&self, pos: (u32, u32)) -> Pixel {
        assert!(pos.0 < self.size.0);
        assert!(pos.1 < self.size.1);

        let start = STRIDE * (pos.0 as usize + pos.1 as usize * self.size.0 as usize);

        Pixel {
            r: self.data[start],
            g: self.data[start + 1],
            b: self.data[start + 2],
            a: self.data[start + 3],
        }
    }

    pub fn set_pixel(&mut self, pos: (u32, u32), pixel: Pixel) {
        assert!(pos.0 < self.size.0);
        assert!(pos.1 < self.size.1);

        let start = STRIDE * (pos.0 as usize + pos.1 as usize * self.size.0 as usize);

        self.data[start] = pixel.r;
        self.data[start + 1] = pixel.g;
        self.data[start + 2] = pixel.b;
        self.data[start + 3] = pixel.a;
    }
}
