// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Render pipeline configuration document.
//!
//! The external renderer reads a YAML file; pretty-printed JSON is a valid
//! subset of YAML, so the document is kept as a `serde_json::Value` and
//! edited structurally. Positional `<args:N>` placeholders are resolved by
//! the renderer from its command line (camera file, scene, output dir).
//!
//! The writer stage emits one bundle per frame into the output dir:
//! `<frame>.colors.png` (RGB) and `<frame>.segmap.png`, a 16-bit grey+alpha
//! PNG holding the class map in the grey channel and the instance map in
//! the alpha channel.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: u64 = 3;
const LIGHT_MODULE: &str = "lighting.LightLoader";
const WRITER_MODULE: &str = "writer.ImageWriter";

/// Suffix of the colour image in a rendered bundle
pub const COLORS_SUFFIX: &str = "colors.png";
/// Suffix of the label map in a rendered bundle
pub const SEGMAP_SUFFIX: &str = "segmap.png";

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    document: Value,
}

impl RenderConfig {
    /// Base pipeline: initialize, load scene, set world category, one area
    /// light, camera path, colour + segmentation render, PNG bundle output.
    pub fn base() -> Self {
        let document = json!({
            "version": SCHEMA_VERSION,
            "setup": {
                "blender_install_path": "/home_local/HiWi2/blender/",
                "pip": ["h5py", "scikit-image"]
            },
            "modules": [
                {
                    "module": "main.Initializer",
                    "config": {
                        "global": {
                            "output_dir": "<args:2>",
                            "max_bounces": 5,
                            "diffuse_bounces": 5,
                            "glossy_bounces": 5,
                            "transmission_bounces": 0,
                            "transparency_bounces": 0
                        }
                    }
                },
                {
                    "module": "loader.BlendLoader",
                    "config": { "path": "<args:1>" }
                },
                {
                    "module": "manipulators.WorldManipulator",
                    "config": { "cf_set_world_category_id": 0 }
                },
                {
                    "module": LIGHT_MODULE,
                    "config": {
                        "lights": [
                            {
                                "type": "AREA",
                                "location": [0.0, 0.0, 0.0],
                                "rotation": [0.0, 0.0, 0.0],
                                "energy": 140000
                            }
                        ]
                    }
                },
                {
                    "module": "camera.CameraLoader",
                    "config": {
                        "path": "<args:0>",
                        "file_format": "location rotation/value",
                        "intrinsics": {
                            "fov": 1.5708,
                            "resolution_x": 400,
                            "resolution_y": 400
                        }
                    }
                },
                {
                    "module": "renderer.RgbRenderer",
                    "config": { "output_key": "colors" }
                },
                {
                    "module": "renderer.SegMapRenderer",
                    "config": { "map_by": ["class", "instance"] }
                },
                {
                    "module": WRITER_MODULE,
                    "config": {
                        "outputs": [
                            { "key": "colors", "file_suffix": COLORS_SUFFIX },
                            {
                                "key": "segmap",
                                "file_suffix": SEGMAP_SUFFIX,
                                "channels": ["class", "instance"],
                                "color_depth": 16
                            }
                        ]
                    }
                }
            ]
        });
        Self { document }
    }

    /// Wrap an existing document, checking its shape
    pub fn from_value(document: Value) -> Result<Self> {
        let config = Self { document };
        config.validate()?;
        Ok(config)
    }

    pub fn as_value(&self) -> &Value {
        &self.document
    }

    /// Set location, rotation and energy of the single light
    pub fn with_light(mut self, location: [f64; 3], rotation: [f64; 3], energy: u64) -> Result<Self> {
        let light = self.light_mut()?;
        light["location"] = json!(location);
        light["rotation"] = json!(rotation);
        light["energy"] = json!(energy);
        Ok(self)
    }

    /// Check the parts of the schema this tool relies on
    pub fn validate(&self) -> Result<()> {
        match self.document.get("version").and_then(Value::as_u64) {
            Some(SCHEMA_VERSION) => {}
            other => {
                return Err(Error::RenderConfig(format!(
                    "expected version {}, found {:?}",
                    SCHEMA_VERSION, other
                )))
            }
        }

        let loaders = self
            .modules()?
            .iter()
            .filter(|m| m.get("module").and_then(Value::as_str) == Some(LIGHT_MODULE))
            .count();
        if loaders != 1 {
            return Err(Error::RenderConfig(format!(
                "expected exactly one {} module, found {}",
                LIGHT_MODULE, loaders
            )));
        }

        self.light()?;

        let suffixes = self.output_suffixes()?;
        if !suffixes.contains(&SEGMAP_SUFFIX) {
            return Err(Error::RenderConfig(format!(
                "{} does not write a {} label map",
                WRITER_MODULE, SEGMAP_SUFFIX
            )));
        }
        Ok(())
    }

    /// File suffixes the writer stage emits per frame
    pub fn output_suffixes(&self) -> Result<Vec<&str>> {
        let outputs = self
            .modules()?
            .iter()
            .find(|m| m.get("module").and_then(Value::as_str) == Some(WRITER_MODULE))
            .and_then(|m| m.pointer("/config/outputs"))
            .and_then(Value::as_array)
            .ok_or_else(|| Error::RenderConfig(format!("missing {} outputs", WRITER_MODULE)))?;
        outputs
            .iter()
            .map(|o| {
                o.get("file_suffix")
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::RenderConfig("writer output without file_suffix".to_string()))
            })
            .collect()
    }

    /// File names the writer emits for `frame`
    pub fn output_files(&self, frame: usize) -> Result<Vec<String>> {
        Ok(self
            .output_suffixes()?
            .into_iter()
            .map(|suffix| format!("{}.{}", frame, suffix))
            .collect())
    }

    /// Write the document, replacing the previous config file
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        self.validate()?;
        let mut text = serde_json::to_string_pretty(&self.document)?;
        text.push('\n');
        fs::write(path, text)?;
        Ok(())
    }

    fn modules(&self) -> Result<&Vec<Value>> {
        self.document
            .get("modules")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::RenderConfig("missing modules list".to_string()))
    }

    fn light(&self) -> Result<&Value> {
        let lights = self
            .modules()?
            .iter()
            .find(|m| m.get("module").and_then(Value::as_str) == Some(LIGHT_MODULE))
            .and_then(|m| m.pointer("/config/lights"))
            .and_then(Value::as_array)
            .ok_or_else(|| Error::RenderConfig("light loader has no lights".to_string()))?;
        match lights.as_slice() {
            [light] if light.is_object() => Ok(light),
            _ => Err(Error::RenderConfig(format!(
                "expected exactly one light, found {}",
                lights.len()
            ))),
        }
    }

    fn light_mut(&mut self) -> Result<&mut Value> {
        // shape is checked on the shared path first
        self.light()?;
        self.document
            .get_mut("modules")
            .and_then(Value::as_array_mut)
            .and_then(|modules| {
                modules
                    .iter_mut()
                    .find(|m| m.get("module").and_then(Value::as_str) == Some(LIGHT_MODULE))
            })
            .and_then(|m| m.pointer_mut("/config/lights/0"))
            .ok_or_else(|| Error::RenderConfig("light loader has no lights".to_string()))
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::base()
    }
}
