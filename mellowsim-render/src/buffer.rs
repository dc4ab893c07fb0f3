use crate::channel::Channel;
use crate::color::Hsv;

/// An RGBA pixel buffer ready for display.
#[derive(Debug, Clone)]
pub struct RenderBuffer {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major order.
    pub pixels: Vec<u8>,
}

impl RenderBuffer {
    /// Convert a region's HSV buffer, hue read on `[0, hue_range]`.
    pub fn from_hsv<T: Channel>(width: u32, height: u32, hsv: &[Hsv<T>], hue_range: f64) -> Self {
        debug_assert_eq!(hsv.len(), width as usize * height as usize);
        let mut pixels = Vec::with_capacity(hsv.len() * 4);
        for px in hsv {
            let [r, g, b] = px.to_rgb8(hue_range);
            pixels.extend_from_slice(&[r, g, b, 255]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hsv_converts_each_pixel() {
        let member = Hsv::<u8>::default();
        let red = Hsv::<u8> {
            hue: 0,
            saturation: 255,
            value: 255,
        };
        let buf = RenderBuffer::from_hsv(2, 1, &[member, red], 180.0);
        assert_eq!((buf.width, buf.height), (2, 1));
        assert_eq!(buf.pixels, vec![0, 0, 0, 255, 255, 0, 0, 255]);
    }
}
