// Command-line surface: the arguments the tool accepts, the image picker
// used when no path is given, and logger setup.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mlwl-image-occlusion")]
#[command(about = "Draw occlusion rectangles on an image and hand them to a MyLittleWordLand course script")]
pub struct Args {
    /// Image to occlude. A file picker opens when omitted.
    pub image: Option<PathBuf>,

    /// Run the script in the foreground and show its output.
    #[arg(long)]
    pub debug: bool,

    /// Script to run instead of ./script.sh or the per-user copy.
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Directory the PNG files are written to.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

impl Args {
    /// The image path given on the command line, or one picked in a dialog.
    pub fn image_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.image {
            return Ok(path.clone());
        }
        rfd::FileDialog::new()
            .set_title("Choose an image")
            .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "gif", "webp"])
            .pick_file()
            .context("No image selected")
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--debug`.
pub fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_image_and_debug() {
        let args = Args::parse_from(["mlwl-image-occlusion", "card.png", "--debug"]);
        assert_eq!(args.image, Some(PathBuf::from("card.png")));
        assert!(args.debug);
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.image_path().unwrap(), PathBuf::from("card.png"));
    }

    #[test]
    fn debug_flag_may_come_first() {
        let args = Args::parse_from([
            "mlwl-image-occlusion",
            "--debug",
            "--output-dir",
            "/tmp/out",
            "card.png",
        ]);
        assert!(args.debug);
        assert_eq!(args.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(args.script, None);
    }
}
