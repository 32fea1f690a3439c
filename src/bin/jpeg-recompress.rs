// src/bin/jpeg-recompress.rs
//
// JPEG in, JPEG out: the smallest re-encode that still meets the quality
// target, with the original metadata carried over.

use std::process::ExitCode;

use recompress::cli::{self, JpegRecompressArgs};

fn main() -> ExitCode {
    let args = match cli::parse_args::<JpegRecompressArgs>() {
        Ok(args) => args,
        Err(code) => return code,
    };
    cli::init_logging(args.io.quiet);
    cli::finish(cli::run_jpeg_recompress(&args))
}
