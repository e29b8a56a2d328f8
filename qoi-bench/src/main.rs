use std::cmp::Ordering;
use std::fs::{self, File};
use std::hint::black_box;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, ensure, Context, Result};
use bytemuck::cast_slice;
use log::{debug, info, warn};
use qoi_stream::{Bitmap, Decoder, Encoder, ImageFormat, LoadFlags, QoiFormat};
use structopt::StructOpt;
use walkdir::{DirEntry, WalkDir};

fn timeit<T>(func: impl Fn() -> T) -> (T, Duration) {
    let t0 = Instant::now();
    let out = func();
    let t1 = Instant::now();
    (black_box(out), t1 - t0)
}

fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len() as f64
}

fn find_pngs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let is_png_file = |path: &PathBuf| {
        path.is_file()
            && path.extension().unwrap_or_default().to_string_lossy().to_ascii_lowercase() == "png"
    };

    let mut out = vec![];
    for path in paths {
        if is_png_file(path) {
            out.push(path.clone());
        } else if path.is_dir() {
            out.extend(
                WalkDir::new(path)
                    .follow_links(true)
                    .into_iter()
                    .filter_map(Result::ok)
                    .map(DirEntry::into_path)
                    .filter(is_png_file),
            );
        } else {
            bail!("path doesn't exist: {}", path.to_string_lossy());
        }
    }
    out.sort_unstable();
    Ok(out)
}

/// Expands 8-bit PNG output of any color type to RGBA.
fn to_rgba(buf: &[u8], color_type: png::ColorType) -> Result<Vec<u8>> {
    let out: Vec<u8> = match color_type {
        png::ColorType::Grayscale => buf.iter().flat_map(|&v| [v, v, v, 0xff]).collect(),
        png::ColorType::GrayscaleAlpha => {
            cast_slice::<_, [u8; 2]>(buf).iter().flat_map(|&[v, a]| [v, v, v, a]).collect()
        }
        png::ColorType::Rgb => {
            cast_slice::<_, [u8; 3]>(buf).iter().flat_map(|&[r, g, b]| [r, g, b, 0xff]).collect()
        }
        png::ColorType::Rgba => buf.to_vec(),
        png::ColorType::Indexed => bail!("palette was not expanded"),
    };
    Ok(out)
}

struct Image {
    pub width: u32,
    pub height: u32,
    /// Samples per pixel in the source PNG; the RGBA data always has 4.
    pub channels: u8,
    pub data: Vec<u8>,
}

impl Image {
    fn read_png(filename: &Path) -> Result<Self> {
        let mut decoder = png::Decoder::new(File::open(filename)?);
        let transformations = png::Transformations::normalize_to_color8();
        decoder.set_transformations(transformations);
        let mut reader = decoder.read_info()?;
        let mut whole_buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut whole_buf)?;
        let buf = &whole_buf[..info.buffer_size()];
        ensure!(info.bit_depth == png::BitDepth::Eight, "invalid bit depth: {:?}", info.bit_depth);
        let data = to_rgba(buf, info.color_type)?;
        let channels = info.color_type.samples() as u8;
        debug!("{}: {:?} expanded to rgba", filename.display(), info.color_type);
        Ok(Self { width: info.width, height: info.height, channels, data })
    }

    pub const fn n_pixels(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    pub const fn n_bytes(&self) -> usize {
        self.n_pixels() * 4
    }
}

/// The three ways into the codec: flat slices, the streaming reader/writer
/// API, and the bitmap plugin interface.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Codec {
    Flat,
    Stream,
    Plugin,
}

impl Codec {
    const ALL: [Self; 3] = [Self::Flat, Self::Stream, Self::Plugin];

    const fn name(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Stream => "stream",
            Self::Plugin => "plugin",
        }
    }

    fn encode(self, img: &Image) -> Result<Vec<u8>> {
        match self {
            Self::Flat => Ok(qoi_stream::encode_to_vec(&img.data, img.width, img.height)?),
            Self::Stream => {
                let mut stream = Vec::new();
                let encoder = Encoder::new(&img.data, img.width, img.height)?;
                encoder.encode_to_stream(&mut stream)?;
                Ok(stream)
            }
            Self::Plugin => {
                let bitmap = Bitmap::from_top_down(img.width, img.height, &img.data)?;
                let mut out = Vec::new();
                QoiFormat.save(&bitmap, &mut out)?;
                Ok(out)
            }
        }
    }

    fn decode(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Flat => Ok(qoi_stream::decode_to_vec(data)?.1),
            Self::Stream => {
                let mut decoder = Decoder::from_stream(Cursor::new(data))?;
                Ok(decoder.decode_to_vec()?)
            }
            Self::Plugin => {
                let bitmap = QoiFormat.load(&mut Cursor::new(data), LoadFlags::default())?;
                bitmap.to_top_down().context("bitmap loaded without pixels")
            }
        }
    }
}

struct BenchResult {
    pub codec: &'static str,
    pub ratio: f64,
    pub decode_sec: Vec<f64>,
    pub encode_sec: Vec<f64>,
}

impl BenchResult {
    pub fn new(
        codec: &'static str, ratio: f64, mut decode_sec: Vec<f64>, mut encode_sec: Vec<f64>,
    ) -> Self {
        decode_sec.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        encode_sec.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        Self { codec, ratio, decode_sec, encode_sec }
    }

    pub fn average_decode_sec(&self, use_median: bool) -> f64 {
        if use_median {
            self.decode_sec[self.decode_sec.len() / 2]
        } else {
            mean(&self.decode_sec)
        }
    }

    pub fn average_encode_sec(&self, use_median: bool) -> f64 {
        if use_median {
            self.encode_sec[self.encode_sec.len() / 2]
        } else {
            mean(&self.encode_sec)
        }
    }
}

struct ImageBench {
    results: Vec<BenchResult>,
    n_pixels: usize,
    n_bytes: usize,
}

impl ImageBench {
    pub fn new(img: &Image) -> Self {
        Self { results: vec![], n_pixels: img.n_pixels(), n_bytes: img.n_bytes() }
    }

    pub fn run(&mut self, codec: Codec, img: &Image, sec_allowed: f64) -> Result<()> {
        let (encoded, t_encode) = timeit(|| codec.encode(img));
        let encoded = encoded?;
        let (decoded, t_decode) = timeit(|| codec.decode(&encoded));
        ensure!(decoded? == img.data, "{}: decoded data doesn't roundtrip", codec.name());
        if let Some(first) = self.results.first() {
            // every path writes the same bytes, so the ratio must agree
            let ratio = encoded.len() as f64 / self.n_bytes as f64;
            if (ratio - first.ratio).abs() > f64::EPSILON {
                warn!("{}: output differs from {}", codec.name(), first.codec);
            }
        }

        let n_encode = (sec_allowed / 2. / t_encode.as_secs_f64()).max(2.).ceil() as usize;
        let encode_sec =
            (0..n_encode).map(|_| timeit(|| codec.encode(img)).1.as_secs_f64()).collect();

        let n_decode = (sec_allowed / 2. / t_decode.as_secs_f64()).max(2.).ceil() as usize;
        let decode_sec =
            (0..n_decode).map(|_| timeit(|| codec.decode(&encoded)).1.as_secs_f64()).collect();

        let ratio = encoded.len() as f64 / self.n_bytes as f64;
        self.results.push(BenchResult::new(codec.name(), ratio, decode_sec, encode_sec));
        Ok(())
    }

    pub fn report(&self, use_median: bool) {
        let (w_name, w_col) = (9, 13);
        print!("{:<w$}", "", w = w_name);
        print!("{:>w$}", "ratio:%", w = w_col);
        print!("{:>w$}", "decode:ms", w = w_col);
        print!("{:>w$}", "encode:ms", w = w_col);
        print!("{:>w$}", "decode:Mp/s", w = w_col);
        print!("{:>w$}", "encode:Mp/s", w = w_col);
        println!();
        for r in &self.results {
            let decode_sec = r.average_decode_sec(use_median);
            let encode_sec = r.average_encode_sec(use_median);
            let mpixels = self.n_pixels as f64 / 1e6;

            print!("{:<w$}", r.codec, w = w_name);
            print!("{:>w$.1}", r.ratio * 100., w = w_col);
            print!("{:>w$.2}", decode_sec * 1e3, w = w_col);
            print!("{:>w$.2}", encode_sec * 1e3, w = w_col);
            print!("{:>w$.1}", mpixels / decode_sec, w = w_col);
            print!("{:>w$.1}", mpixels / encode_sec, w = w_col);
            println!();
        }
    }
}

#[derive(Default)]
struct BenchTotals {
    results: Vec<ImageBench>,
}

impl BenchTotals {
    pub fn report(&self, use_median: bool) {
        let Some(first) = self.results.first() else {
            return;
        };
        let codec_names: Vec<_> = first.results.iter().map(|r| r.codec).collect();
        let n_codecs = codec_names.len();
        let (mut total_decode_sec, mut total_encode_sec) = (vec![0.; n_codecs], vec![0.; n_codecs]);
        let (mut n_pixels_total, mut n_bytes_total) = (0, 0);
        for r in &self.results {
            n_pixels_total += r.n_pixels;
            n_bytes_total += r.n_bytes;
            for i in 0..n_codecs {
                // sum of medians is not the median of sums, but good enough here
                total_decode_sec[i] += r.results[i].average_decode_sec(use_median);
                total_encode_sec[i] += r.results[i].average_encode_sec(use_median);
            }
        }
        let mpixels = n_pixels_total as f64 / 1e6;
        let mbytes = n_bytes_total as f64 / 1024. / 1024.;

        println!("---");
        println!(
            "Overall results: ({} images, {:.2} MB raw, {:.2} MP):",
            self.results.len(),
            mbytes,
            mpixels
        );
        let (w_name, w_col) = (9, 13);
        print!("{:<w$}", "", w = w_name);
        print!("{:>w$}", "decode:Mp/s", w = w_col);
        print!("{:>w$}", "encode:Mp/s", w = w_col);
        print!("{:>w$}", "decode:MB/s", w = w_col);
        print!("{:>w$}", "encode:MB/s", w = w_col);
        println!();
        for (i, codec_name) in codec_names.iter().enumerate() {
            let (decode_sec, encode_sec) = (total_decode_sec[i], total_encode_sec[i]);
            print!("{:<w$}", codec_name, w = w_name);
            print!("{:>w$.1}", mpixels / decode_sec, w = w_col);
            print!("{:>w$.1}", mpixels / encode_sec, w = w_col);
            print!("{:>w$.1}", mbytes / decode_sec, w = w_col);
            print!("{:>w$.1}", mbytes / encode_sec, w = w_col);
            println!();
        }
    }
}

fn bench_png(filename: &Path, seconds: f64, use_median: bool) -> Result<ImageBench> {
    let f = filename.to_string_lossy();
    let img = Image::read_png(filename).context(format!("error reading PNG file: {f}"))?;
    let size_png_kb = fs::metadata(filename)?.len() / 1024;
    let size_mb_raw = img.n_bytes() as f64 / 1024. / 1024.;
    let mpixels = img.n_pixels() as f64 / 1e6;
    println!(
        "{} ({}x{}:{}, {} KB png, {:.2} MB raw, {:.2} MP)",
        f, img.width, img.height, img.channels, size_png_kb, size_mb_raw, mpixels
    );
    let mut bench = ImageBench::new(&img);
    for codec in Codec::ALL {
        bench.run(codec, &img, seconds)?;
    }
    bench.report(use_median);
    Ok(bench)
}

fn bench_suite(files: &[PathBuf], seconds: f64, use_median: bool) {
    let mut totals = BenchTotals::default();
    for file in files {
        match bench_png(file, seconds, use_median) {
            Ok(res) => totals.results.push(res),
            Err(err) => eprintln!("{err:?}"),
        }
    }
    if totals.results.len() > 1 {
        totals.report(use_median);
    }
}

#[derive(Debug, StructOpt)]
struct Args {
    /// Files or directories containing png images.
    #[structopt(parse(from_os_str))]
    paths: Vec<PathBuf>,
    /// Number of seconds allocated for each image/codec.
    #[structopt(short, long, default_value = "1")]
    seconds: f64,
    /// Use average (mean) instead of the median.
    #[structopt(short, long)]
    average: bool,
    /// Show codec diagnostics (-v for debug, -vv for trace).
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = <Args as StructOpt>::from_args();
    let log_level = match args.verbose {
        0 => log::Level::Warn,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(log_level)?;

    ensure!(!args.paths.is_empty(), "no input paths given");
    let files = find_pngs(&args.paths)?;
    ensure!(!files.is_empty(), "no PNG files found in given paths");
    info!("benchmarking {} files", files.len());
    bench_suite(&files, args.seconds, !args.average);
    Ok(())
}
