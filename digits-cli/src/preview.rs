use digit_pipeline::{
    NoiseKind, PipelineConfig, PixelBuffer, PreviewBatch, PreviewRow, RenderSurface, Session,
};
use image::RgbaImage;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Command-line overrides for a preview
pub struct PreviewOptions {
    pub count: Option<usize>,
    pub noise: Option<NoiseKind>,
    pub intensity: Option<f32>,
    pub seed: Option<u64>,
    pub out: Option<PathBuf>,
    pub scale: usize,
    pub config: Option<PathBuf>,
}

impl PreviewOptions {
    /// Configuration file (or defaults) with the flags applied on top
    fn resolve(&self) -> digit_pipeline::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(count) = self.count {
            config.preview_count = count;
        }
        if let Some(kind) = self.noise {
            config.noise.kind = kind;
        }
        if let Some(intensity) = self.intensity {
            config.noise.intensity = intensity;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

pub async fn preview(train: &Path, test: &Path, options: PreviewOptions) -> Result<(), Box<dyn Error>> {
    let config = options.resolve()?;
    let count = config.preview_count;
    let mut session = Session::new(config)?;

    let summary = session.load_files(Some(train), Some(test)).await?;
    println!("{summary}");

    let batch = session.preview(count, None)?;
    println!("indices: {:?}", batch.indices);
    println!("labels:  {:?}", batch.labels);
    println!();
    println!("clean");
    print!("{}", batch.ascii_row(PreviewRow::Clean)?);
    println!();
    println!("noisy");
    print!("{}", batch.ascii_row(PreviewRow::Noisy)?);

    if let Some(dir) = &options.out {
        let written = write_pngs(&batch, dir, options.scale)?;
        tracing::info!(files = written, dir = %dir.display(), "wrote preview images");
    }

    Ok(())
}

/// Writes each buffer it is handed as `<prefix>_<n>.png`
struct PngSurface<'a> {
    dir: &'a Path,
    prefix: &'static str,
    written: usize,
}

impl RenderSurface for PngSurface<'_> {
    fn draw(&mut self, buffer: &PixelBuffer) -> digit_pipeline::Result<()> {
        let image = RgbaImage::from_raw(
            buffer.width() as u32,
            buffer.height() as u32,
            buffer.rgba().to_vec(),
        )
        .ok_or_else(|| {
            digit_pipeline::PipelineError::InvalidArgument("pixel buffer size mismatch".to_string())
        })?;
        let path = self.dir.join(format!("{}_{}.png", self.prefix, self.written));
        image
            .save(&path)
            .map_err(std::io::Error::other)?;
        self.written += 1;
        Ok(())
    }
}

fn write_pngs(batch: &PreviewBatch, dir: &Path, scale: usize) -> Result<usize, Box<dyn Error>> {
    std::fs::create_dir_all(dir)?;
    let mut total = 0;
    for (row, prefix) in [(PreviewRow::Clean, "clean"), (PreviewRow::Noisy, "noisy")] {
        let mut surface = PngSurface {
            dir,
            prefix,
            written: 0,
        };
        batch.draw_row(row, scale, &mut surface)?;
        total += surface.written;
    }
    Ok(total)
}
