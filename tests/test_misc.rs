mod common;

use std::io::{self, Read};

use qoi_stream::{
    consts::{QOI_OP_DIFF, QOI_OP_RGB, QOI_OP_RUN},
    decode_header, decode_to_vec, encode_to_vec, Channels, ColorSpace, Decoder, Encoder, Error,
    ErrorKind, Header, Result,
};

use self::common::{header_bytes, PADDING};

const ONE_PIXEL_QOI_IMAGE: [u8; 23] = [
    0x71, 0x6f, 0x69, 0x66, // magic
    0x00, 0x00, 0x00, 0x01, // width
    0x00, 0x00, 0x00, 0x01, // height
    0x04, // number of channels
    0x00, // colorspace
    0x55, // QOI_OP_DIFF
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, // padding
];

const ONE_PIXEL_QOI_HEADER: Header =
    Header { width: 1, height: 1, channels: Channels::Rgba, colorspace: ColorSpace::Srgb };

/// Reader that returns one byte per call, to exercise short reads.
struct OneByte<'a>(&'a [u8]);

impl Read for OneByte<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        match (self.0.split_first(), out.first_mut()) {
            (Some((&b, tail)), Some(dst)) => {
                *dst = b;
                self.0 = tail;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

#[test]
fn test_decode_stream_to_exact_sized_buffer() -> Result<()> {
    let mut decoder = Decoder::from_stream(&ONE_PIXEL_QOI_IMAGE[..])?;
    assert_eq!(decoder.header(), &ONE_PIXEL_QOI_HEADER);

    let mut out = vec![0u8; decoder.required_buf_len()];
    let n_written = decoder.decode_to_buf(&mut out)?;
    assert_eq!(n_written, 4);
    // QOI_OP_DIFF 0x55 is +(-1, -1, -1) from opaque black
    assert_eq!(out, [255, 255, 255, 255]);
    Ok(())
}

#[test]
fn test_decode_stream_to_larger_buffer() -> Result<()> {
    let mut decoder = Decoder::from_stream(&ONE_PIXEL_QOI_IMAGE[..])?;
    assert_eq!(decoder.header(), &ONE_PIXEL_QOI_HEADER);

    let mut out = vec![0u8; decoder.required_buf_len() + 16];
    let n_written = decoder.decode_to_buf(&mut out)?;
    assert_eq!(n_written, 4);
    assert_eq!(&out[4..], &[0_u8; 16]);
    Ok(())
}

#[test]
fn test_new_decoder() {
    // a one-byte input can't even hold the header
    let arr = [0u8];
    assert!(qoi_stream::Decoder::new(&arr[..]).is_err());
}

#[test]
fn test_start_with_qoi_op_run() -> Result<()> {
    let header = Header::try_new(3, 1, Channels::Rgba, ColorSpace::Linear)?;
    let mut qoi_data: Vec<_> = header.encode().into_iter().collect();
    qoi_data.extend([QOI_OP_RUN | 1, QOI_OP_RGB, 10, 20, 30]);
    qoi_data.extend([0; 7]);
    qoi_data.push(1);
    let (_, decoded) = decode_to_vec(&qoi_data)?;
    assert_eq!(decoded, vec![0, 0, 0, 255, 0, 0, 0, 255, 10, 20, 30, 255]);
    Ok(())
}

#[test]
fn test_run_past_last_pixel_is_dropped() -> Result<()> {
    // a run of 6 on a 2x1 image: the extra 4 pixels go nowhere
    let mut qoi_data = header_bytes(2, 1, 4, 0);
    qoi_data.push(QOI_OP_RUN | 5);
    qoi_data.extend(PADDING);
    let (_, decoded) = decode_to_vec(&qoi_data)?;
    assert_eq!(decoded, [0, 0, 0, 255, 0, 0, 0, 255]);

    // the end marker is still checked after the dropped pixels
    let last = qoi_data.len() - 1;
    qoi_data[last] = 0;
    let err = decode_to_vec(&qoi_data).unwrap_err();
    assert!(matches!(err, Error::InvalidPadding));
    assert_eq!(err.kind(), ErrorKind::CorruptPadding);
    Ok(())
}

#[test]
fn test_two_pixel_example() -> Result<()> {
    let data = [255_u8, 0, 0, 255, 255, 0, 0, 255];
    let encoded = encode_to_vec(data, 2, 1)?;

    let mut expected = header_bytes(2, 1, 4, 0);
    // red minus opaque black wraps to a -1 red delta, which fits QOI_OP_DIFF
    expected.push(QOI_OP_DIFF | 1 << 4 | 2 << 2 | 2);
    expected.push(QOI_OP_RUN);
    expected.extend(PADDING);
    assert_eq!(encoded, expected);

    let (header, decoded) = decode_to_vec(&encoded)?;
    assert_eq!(header, Header::try_new(2, 1, Channels::Rgba, ColorSpace::Srgb)?);
    assert_eq!(decoded, data);
    Ok(())
}

#[test]
fn test_run_spans_rows() -> Result<()> {
    // 3x3 of one color: one literal, then a run of 8 crossing two row boundaries
    let data = [200_u8, 8, 9, 255].repeat(9);
    let encoded = encode_to_vec(&data, 3, 3)?;
    let mut expected = vec![QOI_OP_RGB, 200, 8, 9, QOI_OP_RUN | 7];
    expected.extend(PADDING);
    assert_eq!(&encoded[14..], expected.as_slice());
    assert_eq!(decode_to_vec(&encoded)?.1, data);
    Ok(())
}

#[test]
fn test_header_fields_pass_through() -> Result<()> {
    let data = [1_u8, 2, 3, 4].repeat(6);
    let encoded = Encoder::new(&data, 2, 3)?
        .with_channels(Channels::Rgb)
        .with_colorspace(ColorSpace::Linear)
        .encode_to_vec()?;
    let header = decode_header(&encoded)?;
    assert_eq!(header.channels, Channels::Rgb);
    assert_eq!(header.colorspace, ColorSpace::Linear);
    // pixels keep their alpha whatever the channels field says
    assert_eq!(decode_to_vec(&encoded)?.1, data);
    Ok(())
}

#[test]
fn test_encode_to_stream_and_decode_from_trickling_reader() -> Result<()> {
    let data: Vec<u8> = (0..64 * 64 * 4).map(|i| (i * 7 % 251) as u8).collect();
    let encoder = Encoder::new(&data, 64, 64)?;
    let mut stream = Vec::new();
    let n = encoder.encode_to_stream(&mut stream)?;
    assert_eq!(n, stream.len());
    assert!(stream.len() > 4096, "needs to span several decode windows");

    let mut decoder = Decoder::from_stream(OneByte(&stream))?;
    assert_eq!(decoder.decode_to_vec()?, data);
    Ok(())
}

#[test]
fn test_trailing_bytes_are_left_alone() -> Result<()> {
    let mut encoded = encode_to_vec([1_u8, 2, 3, 4], 1, 1)?;
    encoded.extend(b"trailing garbage");
    assert_eq!(decode_to_vec(&encoded)?.1, [1, 2, 3, 4]);
    Ok(())
}
