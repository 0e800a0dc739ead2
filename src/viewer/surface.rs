//! Paint surface that forwards to a JavaScript render callback.

use js_sys::Function;
use wasm_bindgen::prelude::*;

use crate::grid::{PaintSurface, SurfaceSize};

/// Calls `callback("resize", width, height)` with device-pixel sizes, and
/// `callback("paint")` when the grid should repaint.
pub(crate) struct CallbackSurface {
    callback: Option<Function>,
}

impl CallbackSurface {
    pub(crate) fn new(callback: Option<Function>) -> Self {
        Self { callback }
    }

    pub(crate) fn set_callback(&mut self, callback: Option<Function>) {
        self.callback = callback;
    }
}

impl PaintSurface for CallbackSurface {
    fn resize(&mut self, size: SurfaceSize, ratio: f64) {
        if let Some(callback) = &self.callback {
            let width = f64::from(size.width) * ratio;
            let height = f64::from(size.height) * ratio;
            let _ = callback.call3(
                &JsValue::NULL,
                &JsValue::from_str("resize"),
                &JsValue::from_f64(width.floor()),
                &JsValue::from_f64(height.floor()),
            );
        }
    }

    fn paint_now(&mut self) {
        if let Some(callback) = &self.callback {
            let _ = callback.call1(&JsValue::NULL, &JsValue::from_str("paint"));
        }
    }
}
