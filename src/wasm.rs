//! JavaScript bindings around [`MosaicSession`].
//!
//! Values cross the boundary as plain JS objects built with `Reflect`;
//! configuration comes in as JSON in the same camelCase shape the UI keeps.

use js_sys::{Array, Object, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;

use crate::config::{ExportOptions, MosaicConfig};
use crate::error::MosaicError;
use crate::export::encode_png;
use crate::session::{ConfigChange, LoadStatus, LoadTicket, MosaicSession};

impl From<MosaicError> for JsValue {
    fn from(e: MosaicError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<(), JsValue> {
    Reflect::set(target, &JsValue::from_str(key), value)?;
    Ok(())
}

#[wasm_bindgen]
pub struct MosaicEngine {
    session: MosaicSession,
}

#[wasm_bindgen]
impl MosaicEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> MosaicEngine {
        MosaicEngine {
            session: MosaicSession::default(),
        }
    }

    /// Start an upload; pass the returned generation to `load`.
    #[wasm_bindgen(js_name = beginLoad)]
    pub fn begin_load(&mut self) -> u64 {
        self.session.begin_load().generation()
    }

    /// Decode and install PNG bytes. Returns `false` if a newer upload has
    /// started since `generation` was issued.
    pub fn load(&mut self, generation: u64, bytes: &[u8]) -> Result<bool, JsValue> {
        let decoded = LoadTicket::from_generation(generation).decode(bytes);
        let status = self.session.finish_load(decoded)?;
        Ok(status == LoadStatus::Installed)
    }

    /// Replace the whole configuration from JSON; missing fields take defaults.
    pub fn configure(&mut self, json: &str) -> Result<(), JsValue> {
        let config: MosaicConfig = serde_json::from_str(json)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {e}")))?;
        self.session.apply(ConfigChange::Replace(config.sanitized()))?;
        Ok(())
    }

    /// Set palette entry `index` (0-based) to a `#rrggbb` color.
    pub fn recolor(&mut self, index: usize, hex: &str) -> Result<(), JsValue> {
        self.session.recolor_hex(index, hex)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = previewPng)]
    pub fn preview_png(&self) -> Result<Uint8Array, JsValue> {
        let preview = self.session.preview().ok_or(MosaicError::NoImage)?;
        let png = encode_png(preview.clone())?;
        Ok(Uint8Array::from(png.as_slice()))
    }

    /// `[{ index, r, g, b, hex, count }]`
    pub fn palette(&self) -> Result<Array, JsValue> {
        let out = Array::new();
        for entry in self.session.palette() {
            let obj = Object::new();
            set(&obj, "index", &JsValue::from(entry.index as u32))?;
            set(&obj, "r", &JsValue::from(entry.r))?;
            set(&obj, "g", &JsValue::from(entry.g))?;
            set(&obj, "b", &JsValue::from(entry.b))?;
            set(&obj, "hex", &JsValue::from_str(&entry.hex))?;
            set(&obj, "count", &JsValue::from(entry.tile_count as u32))?;
            out.push(&obj);
        }
        Ok(out)
    }

    /// Size and cost figures, or `null` before an image is loaded.
    pub fn stats(&self) -> Result<JsValue, JsValue> {
        let Some(stats) = self.session.stats() else {
            return Ok(JsValue::NULL);
        };
        let obj = Object::new();
        set(&obj, "widthTiles", &JsValue::from(stats.width_tiles))?;
        set(&obj, "heightTiles", &JsValue::from(stats.height_tiles))?;
        set(&obj, "totalTiles", &JsValue::from(stats.total_tiles as f64))?;
        set(&obj, "widthSize", &JsValue::from_str(&stats.width_size))?;
        set(&obj, "heightSize", &JsValue::from_str(&stats.height_size))?;
        set(&obj, "totalArea", &JsValue::from_str(&stats.total_area))?;
        set(&obj, "totalCost", &JsValue::from_str(&stats.total_cost))?;
        set(&obj, "outputUnit", &JsValue::from_str(&stats.output_unit))?;
        Ok(obj.into())
    }

    /// Render the downloadable template and return it as a PNG data URI.
    #[wasm_bindgen(js_name = exportDataUri)]
    pub fn export_data_uri(&self, options_json: &str) -> Result<String, JsValue> {
        let options: ExportOptions = if options_json.trim().is_empty() {
            ExportOptions::default()
        } else {
            serde_json::from_str(options_json)
                .map_err(|e| JsValue::from_str(&format!("Invalid export options: {e}")))?
        };
        Ok(self.session.export(&options)?.data_uri())
    }
}

impl Default for MosaicEngine {
    fn default() -> Self {
        Self::new()
    }
}
