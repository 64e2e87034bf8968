// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Segmentation label maps.
//!
//! A label map carries two parallel encodings per pixel: channel 0 is the
//! semantic class id, channel 1 the instance id. Only the class channel is
//! read. Class ids: 0 background, 1 casing, 2 defect.

use std::path::Path;

use image::DynamicImage;

use crate::error::{Error, Result};

pub const BACKGROUND: u16 = 0;
pub const CASING: u16 = 1;
pub const DEFECT: u16 = 2;

/// Per-class pixel counts of one label map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCounts {
    pub background: u64,
    pub casing: u64,
    pub defect: u64,
}

impl ClassCounts {
    pub fn from_classes<I: IntoIterator<Item = u16>>(classes: I) -> Self {
        let mut counts = Self::default();
        for class in classes {
            match class {
                BACKGROUND => counts.background += 1,
                CASING => counts.casing += 1,
                DEFECT => counts.defect += 1,
                _ => {}
            }
        }
        counts
    }
}

/// Class channel of a decoded label map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    pub width: u32,
    pub height: u32,
    /// Row-major class ids
    pub classes: Vec<u16>,
}

impl LabelMap {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| Error::Image {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_image(&image).ok_or_else(|| Error::UnsupportedLabel {
            path: path.to_path_buf(),
            reason: format!("expected 8 or 16 bit grey+alpha, got {:?}", image.color()),
        })
    }

    /// Extract the class channel; `None` for colour images
    pub fn from_image(image: &DynamicImage) -> Option<Self> {
        let (width, height, classes) = match image {
            DynamicImage::ImageLumaA8(buf) => (
                buf.width(),
                buf.height(),
                buf.pixels().map(|p| p.0[0] as u16).collect(),
            ),
            DynamicImage::ImageLumaA16(buf) => {
                (buf.width(), buf.height(), buf.pixels().map(|p| p.0[0]).collect())
            }
            DynamicImage::ImageLuma8(buf) => (
                buf.width(),
                buf.height(),
                buf.pixels().map(|p| p.0[0] as u16).collect(),
            ),
            DynamicImage::ImageLuma16(buf) => {
                (buf.width(), buf.height(), buf.pixels().map(|p| p.0[0]).collect())
            }
            _ => return None,
        };
        Some(Self {
            width,
            height,
            classes,
        })
    }

    pub fn counts(&self) -> ClassCounts {
        ClassCounts::from_classes(self.classes.iter().copied())
    }
}

/// Decode a label file and count its classes; the map is dropped right away
pub fn count_label_file(path: impl AsRef<Path>) -> Result<ClassCounts> {
    LabelMap::load(path).map(|map| map.counts())
}
