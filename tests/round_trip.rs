//! Encode text into a code image, then read it back through the still-image
//! path.

mod common;

use common::{invert, place_centered, render_ean13, render_qr, to_png};
use image::DynamicImage;
use image::imageops;
use rust_qr_scan::{HintSet, StillImageDecoder, Symbology, decode_bitmap, decode_bytes, decode_file};

#[test]
fn test_qr_from_png_bytes() {
    let png = to_png(&render_qr("hello round trip", 6));
    let result = decode_bytes(&png, &HintSet::all()).expect("QR should decode");
    assert_eq!(result.text(), "hello round trip");
    assert_eq!(result.symbology(), Symbology::QrCode);
    // Finder pattern centres
    assert_eq!(result.points().len(), 3);
}

#[test]
fn test_qr_from_file() {
    let path = std::env::temp_dir().join(format!("rust_qr_scan_round_trip_{}.png", std::process::id()));
    std::fs::write(&path, to_png(&render_qr("written to disk", 5))).unwrap();

    let result = decode_file(&path, &HintSet::qr_code());
    std::fs::remove_file(&path).ok();
    assert_eq!(result.map(|r| r.into_text()).as_deref(), Some("written to disk"));
}

#[test]
fn test_large_file_is_downsampled_and_still_reads() {
    // (25 + 8) * 32 = 1056 px, sampled by 2
    let code = render_qr("https://example.com/large", 32);
    assert!(code.width() > 960);
    let png = to_png(&code);

    let mut decoder = StillImageDecoder::new().with_max_size(480, 640);
    let result = decoder.decode(rust_qr_scan::ImageSource::Bytes(&png), &HintSet::qr_code());
    assert_eq!(result.map(|r| r.into_text()).as_deref(), Some("https://example.com/large"));
}

#[test]
fn test_inverted_qr_reads() {
    let image = DynamicImage::ImageLuma8(invert(&render_qr("light on dark", 6)));
    let result = decode_bitmap(&image, &HintSet::qr_code()).expect("inverted QR should decode");
    assert_eq!(result.text(), "light on dark");
}

#[test]
fn test_qr_on_larger_canvas() {
    let canvas = place_centered(&render_qr("centred", 5), 400, 300);
    let result = decode_bitmap(&DynamicImage::ImageLuma8(canvas), &HintSet::default());
    assert_eq!(result.map(|r| r.into_text()).as_deref(), Some("centred"));
}

#[test]
fn test_ean13_round_trip() {
    let image = DynamicImage::ImageLuma8(render_ean13("4006381333931", 3, 80));
    let result = decode_bitmap(&image, &HintSet::all()).expect("EAN-13 should decode");
    assert_eq!(result.text(), "4006381333931");
    assert_eq!(result.symbology(), Symbology::Ean13);
    assert_eq!(result.points().len(), 2);
}

#[test]
fn test_upc_a_round_trip() {
    let png = to_png(&render_ean13("0036000291452", 2, 60));
    let result = decode_bytes(&png, &HintSet::all()).expect("UPC-A should decode");
    assert_eq!(result.symbology(), Symbology::UpcA);
    assert_eq!(result.text(), "036000291452");
}

#[test]
fn test_vertical_barcode_reads_via_rotation() {
    let upright = render_ean13("4006381333931", 2, 60);
    let vertical = DynamicImage::ImageLuma8(imageops::rotate90(&upright));
    let result = decode_bitmap(&vertical, &HintSet::one_dimensional()).expect("rotated EAN-13");
    assert_eq!(result.text(), "4006381333931");
}

#[test]
fn test_hints_exclude_symbology() {
    let image = DynamicImage::ImageLuma8(render_ean13("4006381333931", 3, 80));
    assert!(decode_bitmap(&image, &HintSet::qr_code()).is_none());

    let qr = DynamicImage::ImageLuma8(render_qr("qr only", 6));
    assert!(decode_bitmap(&qr, &HintSet::one_dimensional()).is_none());
}
