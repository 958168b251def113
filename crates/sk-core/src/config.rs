//! Editor configuration.
//!
//! Every field has a default, so a partial JSON object (or `{}`) is a valid
//! config. Values are checked once at load time by `EditorConfig::from_json`.

use crate::error::{CoreError, Result};
use crate::model::Color;
use serde::{Deserialize, Serialize};

/// Session defaults for the style settings of new elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolDefaults {
    pub color: Color,
    pub stroke_width: f32,
    pub fill_enabled: bool,
    pub fill_color: Color,
    pub opacity: f32,
    pub font_family: String,
    pub font_size: f32,
    pub lock_aspect: bool,
}

impl Default for ToolDefaults {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            stroke_width: 2.0,
            fill_enabled: false,
            fill_color: Color::WHITE,
            opacity: 1.0,
            font_family: "Arial".to_string(),
            font_size: 20.0,
            lock_aspect: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Size of a new canvas. Default: **800 × 600**.
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background: Color,
    pub default_layer_name: String,
    pub default_document_name: String,

    /// Maximum number of history records kept. Default: **200**.
    pub history_limit: usize,

    /// Inserted images are fit inside this square. Default: **300**.
    pub image_max_side: f32,
    /// Where inserted images land, in canvas units. Default: **(50, 50)**.
    pub image_offset: (f32, f32),

    /// Resizing never shrinks an element below this. Default: **2**.
    pub min_element_size: f32,

    pub min_zoom: f32,
    pub max_zoom: f32,

    pub tools: ToolDefaults,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800,
            canvas_height: 600,
            background: Color::WHITE,
            default_layer_name: "Layer 1".to_string(),
            default_document_name: "Untitled".to_string(),
            history_limit: 200,
            image_max_side: 300.0,
            image_offset: (50.0, 50.0),
            min_element_size: 2.0,
            min_zoom: 0.1,
            max_zoom: 10.0,
            tools: ToolDefaults::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    ///
    /// # Errors
    /// Returns `CoreError::Json` for syntax errors and `CoreError::Config`
    /// for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(CoreError::Config("canvas size must be non-zero".into()));
        }
        if self.history_limit == 0 {
            return Err(CoreError::Config("history limit must be at least 1".into()));
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return Err(CoreError::Config(format!(
                "zoom range {}..={} is empty",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(0.0..=1.0).contains(&self.tools.opacity) {
            return Err(CoreError::Config("tool opacity must be within [0, 1]".into()));
        }
        if self.image_max_side <= 0.0 {
            return Err(CoreError::Config("image max side must be positive".into()));
        }
        Ok(())
    }
}
