use crate::canvas::CanvasSurface;
use digit_pipeline::{LoadSummary, PipelineConfig, PreviewBatch, PreviewRow, Session};
use wasm_bindgen::prelude::*;

/// Nearest-neighbour magnification of preview canvases
const SCALE: usize = 4;

/// Session state behind the page
#[wasm_bindgen]
pub struct DenoiseApp {
    session: Session,
    summary: Option<LoadSummary>,
}

#[wasm_bindgen]
impl DenoiseApp {
    /// Default configuration, optionally with a fixed seed.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<u64>) -> Result<DenoiseApp, JsError> {
        let config = PipelineConfig {
            seed,
            ..PipelineConfig::default()
        };
        Self::with_config(config).map_err(to_js)
    }

    /// Configuration given as JSON
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(json: &str) -> Result<DenoiseApp, JsError> {
        PipelineConfig::from_json(json)
            .and_then(Self::with_config)
            .map_err(to_js)
    }

    /// Load the train and test CSV text. Returns the status line.
    ///
    /// A failed load keeps whatever was loaded before.
    pub fn load(&mut self, train_csv: Option<String>, test_csv: Option<String>) -> Result<String, JsError> {
        self.load_inner(train_csv.as_deref(), test_csv.as_deref())
            .map_err(to_js)?;
        Ok(self.status())
    }

    /// Draw `count` random test digits: noisy copies into one container,
    /// clean originals into the other. Returns their labels.
    pub fn preview(&mut self, count: usize, noisy_id: &str, clean_id: &str) -> Result<Vec<u8>, JsError> {
        let batch = self.sample(count).map_err(to_js)?;

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsError::new("no document"))?;
        let mut noisy = CanvasSurface::new(&document, noisy_id).map_err(js_value)?;
        let mut clean = CanvasSurface::new(&document, clean_id).map_err(js_value)?;

        batch
            .draw_row(PreviewRow::Noisy, SCALE, &mut noisy)
            .map_err(to_js)?;
        batch
            .draw_row(PreviewRow::Clean, SCALE, &mut clean)
            .map_err(to_js)?;

        Ok(batch.labels)
    }

    /// Human-readable dataset sizes
    pub fn status(&self) -> String {
        match &self.summary {
            Some(summary) => summary.to_string(),
            None => "no data loaded".to_string(),
        }
    }

    /// Drop all loaded data.
    pub fn reset(&mut self) {
        self.session.clear();
        self.summary = None;
    }
}

impl DenoiseApp {
    fn with_config(config: PipelineConfig) -> digit_pipeline::Result<Self> {
        Ok(Self {
            session: Session::new(config)?,
            summary: None,
        })
    }

    fn load_inner(&mut self, train_csv: Option<&str>, test_csv: Option<&str>) -> digit_pipeline::Result<()> {
        let summary = self.session.load_text(train_csv, test_csv)?;
        self.summary = Some(summary);
        Ok(())
    }

    fn sample(&mut self, count: usize) -> digit_pipeline::Result<PreviewBatch> {
        let count = if count == 0 {
            self.session.config().preview_count
        } else {
            count
        };
        self.session.preview(count, None)
    }
}

fn to_js(e: digit_pipeline::PipelineError) -> JsError {
    JsError::new(&e.to_string())
}

fn js_value(e: JsValue) -> JsError {
    JsError::new(&e.as_string().unwrap_or_else(|| format!("{e:?}")))
}
