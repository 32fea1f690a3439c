// src/bin/archive2webp.rs
//
// JPEG/PPM in, lossy WebP out at the lowest quality that meets the target.

use std::process::ExitCode;

use recompress::cli::{self, ArchiveToWebpArgs};

fn main() -> ExitCode {
    let args = match cli::parse_args::<ArchiveToWebpArgs>() {
        Ok(args) => args,
        Err(code) => return code,
    };
    cli::init_logging(args.io.quiet);
    cli::finish(cli::run_archive_to_webp(&args))
}
