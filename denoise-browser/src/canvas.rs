use digit_pipeline::{PipelineError, PixelBuffer, RenderSurface};
use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, ImageData};

/// Appends one canvas per drawn buffer to a container element
pub struct CanvasSurface {
    document: Document,
    container: Element,
}

impl CanvasSurface {
    /// Surface over the element with `container_id`, emptied first.
    pub fn new(document: &Document, container_id: &str) -> Result<Self, JsValue> {
        let container = document
            .get_element_by_id(container_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element #{container_id}")))?;
        container.set_inner_html("");
        Ok(Self {
            document: document.clone(),
            container,
        })
    }

    fn put(&self, buffer: &PixelBuffer) -> Result<(), JsValue> {
        let canvas = self
            .document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()?;
        canvas.set_width(buffer.width() as u32);
        canvas.set_height(buffer.height() as u32);
        canvas.set_attribute("style", "margin: 4px; image-rendering: pixelated;")?;

        let ctx = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let data = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(buffer.rgba()),
            buffer.width() as u32,
            buffer.height() as u32,
        )?;
        ctx.put_image_data(&data, 0.0, 0.0)?;

        self.container.append_child(&canvas)?;
        Ok(())
    }
}

impl RenderSurface for CanvasSurface {
    fn draw(&mut self, buffer: &PixelBuffer) -> digit_pipeline::Result<()> {
        self.put(buffer)
            .map_err(|e| PipelineError::InvalidArgument(format!("canvas draw failed: {e:?}")))
    }
}
