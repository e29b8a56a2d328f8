mod common;

use std::io::Cursor;

use rand::{rngs::StdRng, SeedableRng};

use qoi_stream::plugin::{TAG_CHANNELS, TAG_COLORSPACE};
use qoi_stream::{
    decode_to_vec, encode_to_vec, Bitmap, Channels, ColorSpace, Encoder, Error, ErrorKind,
    ImageFormat, LoadFlags, QoiFormat,
};

use self::common::ImageGen;

fn random_top_down(seed: u64, width: u32, height: u32) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    ImageGen::new_random(&mut rng).generate(&mut rng, (width * height) as usize)
}

#[test]
fn test_identity() {
    let format = QoiFormat;
    assert_eq!(format.format(), "QOI");
    assert_eq!(format.description(), "Quite Okay Image");
    assert_eq!(format.extension(), "qoi");
    assert_eq!(format.regexpr(), Some("^qoif"));
    assert_eq!(format.mime_type(), "image/qoi");
    assert!(format.supports_export_depth(32));
    assert!(!format.supports_export_depth(24));
    assert!(!format.supports_export_depth(8));
    assert!(format.supports_no_pixels());
}

#[test]
fn test_validate() {
    let format = QoiFormat;
    assert!(format.validate(&mut &b"qoif\0\0\0\x01"[..]));
    assert!(!format.validate(&mut &b"qoiF"[..]));
    assert!(!format.validate(&mut &b"\x89PNG\r\n"[..]));
    assert!(!format.validate(&mut &b"qo"[..]));
}

#[test]
fn test_save_writes_rows_top_first() {
    let (width, height) = (5, 4);
    let top_down = random_top_down(3, width, height);
    let bitmap = Bitmap::from_top_down(width, height, &top_down).unwrap();

    let mut saved = Vec::new();
    QoiFormat.save(&bitmap, &mut saved).unwrap();

    // a bitmap's wire order is its visual order, the same as the flat encoder's
    assert_eq!(saved, encode_to_vec(&top_down, width, height).unwrap());
    assert_eq!(decode_to_vec(&saved).unwrap().1, top_down);
}

#[test]
fn test_load_fills_scanlines_bottom_up() {
    let (width, height) = (3, 2);
    let top_down = [[10_u8, 20, 30, 255].repeat(3), [40_u8, 50, 60, 128].repeat(3)].concat();
    let encoded = encode_to_vec(&top_down, width, height).unwrap();

    let bitmap = QoiFormat.load(&mut Cursor::new(&encoded), LoadFlags::default()).unwrap();
    assert_eq!((bitmap.width(), bitmap.height(), bitmap.bpp()), (3, 2, 32));
    assert_eq!(bitmap.scanline(0).unwrap(), &top_down[12..]);
    assert_eq!(bitmap.scanline(1).unwrap(), &top_down[..12]);
    assert_eq!(bitmap.pixel(0, 1), Some([10, 20, 30, 255]));
    assert_eq!(bitmap.to_top_down().unwrap(), top_down);
}

#[test]
fn test_roundtrip_keeps_tags() {
    let (width, height) = (33, 17);
    let top_down = random_top_down(4, width, height);
    let encoded = Encoder::new(&top_down, width, height)
        .unwrap()
        .with_channels(Channels::Rgb)
        .with_colorspace(ColorSpace::Linear)
        .encode_to_vec()
        .unwrap();

    let bitmap = QoiFormat.load(&mut Cursor::new(&encoded), LoadFlags::default()).unwrap();
    assert_eq!(bitmap.metadata().get_u8(TAG_CHANNELS), Some(3));
    assert_eq!(bitmap.metadata().get_u8(TAG_COLORSPACE), Some(1));

    let mut saved = Vec::new();
    QoiFormat.save(&bitmap, &mut saved).unwrap();
    assert_eq!(saved, encoded);
}

#[test]
fn test_header_only_load() {
    let top_down = random_top_down(5, 8, 8);
    let encoded = encode_to_vec(&top_down, 8, 8).unwrap();

    // everything past the header is garbage; a header-only load never reads it
    let mut truncated = encoded[..14].to_vec();
    truncated.extend([0xff; 3]);

    let bitmap = QoiFormat.load(&mut Cursor::new(&truncated), LoadFlags::header_only()).unwrap();
    assert!(!bitmap.has_pixels());
    assert_eq!((bitmap.width(), bitmap.height()), (8, 8));
    assert_eq!(bitmap.metadata().get_u8(TAG_CHANNELS), Some(4));
    assert_eq!(bitmap.metadata().get_u8(TAG_COLORSPACE), Some(0));

    let err = QoiFormat.save(&bitmap, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, Error::NoPixels));
}

#[test]
fn test_save_defaults_without_tags() {
    let top_down = [1_u8, 2, 3, 4].repeat(4);
    let bitmap = Bitmap::from_top_down(2, 2, &top_down).unwrap();
    assert!(bitmap.metadata().is_empty());

    let mut saved = Vec::new();
    QoiFormat.save(&bitmap, &mut saved).unwrap();
    assert_eq!(&saved[12..14], &[4, 0]);
}

#[test]
fn test_save_defaults_each_missing_tag() {
    let mut only_colorspace = Bitmap::new(2, 2).unwrap();
    only_colorspace.metadata_mut().set(TAG_COLORSPACE, [1_u8]);
    let mut saved = Vec::new();
    QoiFormat.save(&only_colorspace, &mut saved).unwrap();
    assert_eq!(&saved[12..14], &[4, 1]);

    let mut only_channels = Bitmap::new(2, 2).unwrap();
    only_channels.metadata_mut().set(TAG_CHANNELS, [3_u8]);
    let mut saved = Vec::new();
    QoiFormat.save(&only_channels, &mut saved).unwrap();
    assert_eq!(&saved[12..14], &[3, 0]);
}

#[test]
fn test_save_rejects_bad_tags() {
    let mut bitmap = Bitmap::new(2, 2).unwrap();
    bitmap.metadata_mut().set(TAG_CHANNELS, [7_u8]);
    let err = QoiFormat.save(&bitmap, &mut Vec::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDescriptor);
}

#[test]
fn test_load_errors() {
    let encoded = encode_to_vec(random_top_down(6, 4, 4), 4, 4).unwrap();

    let err = QoiFormat.load(&mut &encoded[..20], LoadFlags::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TruncatedStream);

    let mut bad = encoded.clone();
    bad[0] = b'x';
    let err = QoiFormat.load(&mut &bad[..], LoadFlags::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidDescriptor);
}
