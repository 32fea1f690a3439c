#![no_main]

use libfuzzer_sys::fuzz_target;
use recompress::config::InputFormat;
use recompress::engine::decode_input;

fuzz_target!(|data: &[u8]| {
    for format in [InputFormat::Auto, InputFormat::Jpeg, InputFormat::Ppm] {
        if let Ok(decoded) = decode_input(data, format) {
            let (w, h) = (decoded.image.width(), decoded.image.height());
            assert_eq!(decoded.image.rgb().len(), w as usize * h as usize * 3);
        }
    }
});
