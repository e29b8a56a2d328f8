#![no_main]
use libfuzzer_sys::fuzz_target;

use qoi_stream::{ImageFormat, LoadFlags, QoiFormat};

fuzz_target!(|data: &[u8]| {
    let format = QoiFormat;
    let header_only = format.load(&mut &data[..], LoadFlags::header_only());
    if let Ok(bitmap) = format.load(&mut &data[..], LoadFlags::default()) {
        let header_only = header_only.unwrap();
        assert_eq!((bitmap.width(), bitmap.height()), (header_only.width(), header_only.height()));
        assert_eq!(bitmap.metadata(), header_only.metadata());

        let mut saved = Vec::new();
        format.save(&bitmap, &mut saved).unwrap();
        let reloaded = format.load(&mut &saved[..], LoadFlags::default()).unwrap();
        assert_eq!(reloaded, bitmap);
    }
});
