#![no_main]
use libfuzzer_sys::fuzz_target;

use qoi_stream::{decode_header, decode_to_vec, Channels, ColorSpace, Decoder, Header};

fuzz_target!(|input: (u16, u16, bool, bool, &[u8])| {
    let (w, h, is_4, linear, data) = input;
    let (w, h) = (1 + w % 260, 1 + h % 260);
    let channels = if is_4 { 4 } else { 3 };
    let colorspace = u8::from(linear);

    let mut vec = b"qoif".to_vec();
    vec.extend(u32::from(w).to_be_bytes());
    vec.extend(u32::from(h).to_be_bytes());
    vec.extend([channels, colorspace]);
    vec.extend(data);
    vec.extend([0, 0, 0, 0, 0, 0, 0, 1]);

    let header_expected = Header {
        width: u32::from(w),
        height: u32::from(h),
        channels: Channels::try_from(channels).unwrap(),
        colorspace: ColorSpace::try_from(colorspace).unwrap(),
    };
    assert_eq!(decode_header(&vec).unwrap(), header_expected);

    let flat = decode_to_vec(&vec);
    if let Ok((header, out)) = &flat {
        assert_eq!(*header, header_expected);
        assert_eq!(out.len(), header.n_bytes());
    }

    // a reader that hands out a few bytes at a time must give the same answer
    let streamed = Decoder::from_stream(ChunkedReader(&vec)).and_then(|mut d| d.decode_to_vec());
    match (flat, streamed) {
        (Ok((_, a)), Ok(b)) => assert_eq!(a, b),
        (Err(a), Err(b)) => assert_eq!(a.kind(), b.kind()),
        _ => panic!("flat and streamed decodes disagree"),
    }
});

struct ChunkedReader<'a>(&'a [u8]);

impl std::io::Read for ChunkedReader<'_> {
    fn read(&mut self, out: &mut [u8]) -> std::io::Result<usize> {
        let n = out.len().min(self.0.len()).min(7);
        out[..n].copy_from_slice(&self.0[..n]);
        self.0 = &self.0[n..];
        Ok(n)
    }
}
