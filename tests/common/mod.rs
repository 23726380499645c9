//! Synthetic code images for integration tests.

#![allow(dead_code)]

use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};
use qrcode::{Color, QrCode};
use rust_qr_scan::{Frame, Rotation};
use rxing::{BarcodeFormat, MultiFormatWriter, Writer};
use std::io::Cursor;

const WHITE: Luma<u8> = Luma([255]);
const BLACK: Luma<u8> = Luma([0]);

/// QR code for `text` with `module` px per module and a 4-module quiet zone
pub fn render_qr(text: &str, module: u32) -> GrayImage {
    let code = QrCode::new(text.as_bytes()).expect("text fits in a QR code");
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let quiet = 4;
    let side = (modules + 2 * quiet) * module;
    GrayImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / module, y / module);
        let inside = mx >= quiet && my >= quiet && mx < quiet + modules && my < quiet + modules;
        if inside && colors[((my - quiet) * modules + (mx - quiet)) as usize] == Color::Dark {
            BLACK
        } else {
            WHITE
        }
    })
}

/// EAN-13 barcode for a 13-digit string (check digit included), drawn by
/// rxing's writer with `module` px per module
pub fn render_ean13(digits: &str, module: u32, height: u32) -> GrayImage {
    // 95 modules plus the writer's 9-module margin on each side
    let width = (95 + 18) * module;
    let drawn = MultiFormatWriter::default()
        .encode(digits, &BarcodeFormat::EAN_13, width as i32, height as i32)
        .expect("valid EAN-13 contents");
    GrayImage::from_fn(drawn.getWidth(), drawn.getHeight(), |x, y| {
        if drawn.get(x, y) { BLACK } else { WHITE }
    })
}

/// `code` centred on a white `width` x `height` canvas
pub fn place_centered(code: &GrayImage, width: u32, height: u32) -> GrayImage {
    let mut canvas = GrayImage::from_pixel(width, height, WHITE);
    let x = (width - code.width()) / 2;
    let y = (height - code.height()) / 2;
    image::imageops::replace(&mut canvas, code, x as i64, y as i64);
    canvas
}

/// Light-on-dark copy
pub fn invert(image: &GrayImage) -> GrayImage {
    let mut out = image.clone();
    image::imageops::invert(&mut out);
    out
}

/// PNG encoding of `image`
pub fn to_png(image: &GrayImage) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(image.clone())
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
        .expect("PNG encoding");
    buf
}

/// Upright camera frame from a grayscale image
pub fn frame_of(image: &GrayImage) -> Frame {
    let (w, h) = image.dimensions();
    Frame::from_luma(image.as_raw().clone(), w as usize, h as usize, Rotation::Deg0)
        .expect("frame buffer matches dimensions")
}
