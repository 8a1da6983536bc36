//! tilemosaic CLI - Rebuild images as glyph or emoji mosaics

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tilemosaic::config::{DEFAULT_EMOJI_TILE_SIZE, DEFAULT_GLYPH_TILE_SIZE, DEFAULT_ROTATIONS};
use tilemosaic::{
    build_palette, CancelToken, EmojiConfig, Fit, GlyphConfig, MosaicError, MosaicOptions,
    PaletteConfig,
};

#[derive(Parser)]
#[command(name = "tilemosaic", about = "Rebuild images as glyph or emoji mosaics")]
struct Args {
    /// Input image file
    input: PathBuf,
    /// Output image file
    #[arg(short, long)]
    output: PathBuf,
    /// JSON palette config, instead of a palette subcommand
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// How to handle edges that are not a tile multiple
    #[arg(long, value_enum, default_value_t = Fit::Crop)]
    fit: Fit,
    /// Write per-tile matches as JSON
    #[arg(long)]
    report: Option<PathBuf>,
    /// Abort the run after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Match tiles on one thread
    #[arg(long)]
    sequential: bool,
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    palette: Option<PaletteArgs>,
}

#[derive(Subcommand)]
enum PaletteArgs {
    /// One character drawn at several rotations, shaded by tile brightness
    Glyph {
        /// Font file used to draw the character
        #[arg(short, long)]
        font: PathBuf,
        /// Character to draw
        #[arg(long = "char", default_value = "a")]
        character: char,
        #[arg(short, long, default_value_t = DEFAULT_GLYPH_TILE_SIZE)]
        tile_size: u32,
        /// Comma-separated rotation angles in degrees
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true,
              default_values_t = DEFAULT_ROTATIONS.to_vec())]
        rotations: Vec<f32>,
        #[arg(long)]
        font_size: Option<f32>,
    },
    /// Directory of emoji images matched by mean color
    Emoji {
        #[arg(short, long, default_value = "emojis")]
        dir: PathBuf,
        #[arg(short, long, default_value_t = DEFAULT_EMOJI_TILE_SIZE)]
        tile_size: u32,
    },
}

fn palette_config(args: &Args) -> Result<PaletteConfig, MosaicError> {
    match (&args.config, &args.palette) {
        (Some(path), _) => PaletteConfig::from_json_file(path),
        (None, Some(PaletteArgs::Glyph { font, character, tile_size, rotations, font_size })) => {
            let mut config = GlyphConfig::new(*character, font)
                .with_tile_size(*tile_size)
                .with_rotations(rotations.clone());
            if let Some(size) = font_size {
                config = config.with_font_size(*size);
            }
            Ok(PaletteConfig::Glyph(config))
        }
        (None, Some(PaletteArgs::Emoji { dir, tile_size })) => {
            Ok(PaletteConfig::Emoji(EmojiConfig::new(dir).with_tile_size(*tile_size)))
        }
        (None, None) => Err(MosaicError::Configuration(
            "pass --config or a palette subcommand (glyph, emoji)".into(),
        )),
    }
}

fn main() -> Result<(), MosaicError> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    let config = palette_config(&args)?;
    let palette = build_palette(&config)?;
    log::info!("Palette ready: {} entries of {}px", palette.len(), palette.tile_size());

    let image = image::open(&args.input)?;

    let cancel = CancelToken::new();
    if let Some(secs) = args.timeout_secs {
        let timer = cancel.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(secs));
            log::warn!("Time budget of {secs}s spent, cancelling");
            timer.cancel();
        });
    }

    let options = MosaicOptions { fit: args.fit, parallel: !args.sequential, cancel: Some(cancel) };
    let mosaic = palette.render(&image, &options)?;

    if mosaic.image.width() == 0 || mosaic.image.height() == 0 {
        return Err(MosaicError::Shape(format!(
            "input {}x{} is smaller than one {}px tile",
            image.width(),
            image.height(),
            palette.tile_size()
        )));
    }

    mosaic.image.save(&args.output)?;
    log::info!("Output saved to {}", args.output.display());

    if let Some(path) = &args.report {
        let file = std::io::BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer_pretty(file, &mosaic.placements).map_err(std::io::Error::from)?;
        log::info!("Report saved to {}", path.display());
    }

    Ok(())
}
