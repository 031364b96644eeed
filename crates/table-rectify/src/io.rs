//! JSON configuration and report helpers.

use crate::{FailurePolicy, OrderedQuad, RectifiedTable, RectifyError, TableOverlay, TableRectifyParams};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum RectifyIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Configuration for a rectification run over one or more images.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RectifyConfig {
    /// Input images, processed as consecutive frames.
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    /// Write a `<stem>_report.json` next to every rectified image.
    #[serde(default)]
    pub write_report: bool,
    #[serde(default)]
    pub policy: FailurePolicy,
    #[serde(default)]
    pub params: TableRectifyParams,
}

impl RectifyConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, RectifyIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), RectifyIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Resolve the output directory (current directory by default).
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Per-image record of a rectification attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RectifyReport {
    pub input_path: Option<String>,
    pub output_path: Option<String>,
    /// `[width, height]` of the rectified image.
    pub output_size: Option<[usize; 2]>,
    pub region_area: Option<f64>,
    pub polygon: Option<[Point2<i32>; 4]>,
    pub corners: Option<OrderedQuad>,
    pub refined_corners: Option<OrderedQuad>,
    pub overlay: Option<TableOverlay>,
    /// Row-major image -> rectified homography.
    pub h_rect_from_img: Option<[[f64; 3]; 3]>,
    /// Row-major rectified -> image homography.
    pub h_img_from_rect: Option<[[f64; 3]; 3]>,
    pub error: Option<String>,
}

impl RectifyReport {
    pub fn from_result(
        input_path: Option<&Path>,
        output_path: Option<&Path>,
        result: &RectifiedTable,
    ) -> Self {
        let det = &result.detection;
        Self {
            input_path: input_path.map(|p| p.display().to_string()),
            output_path: output_path.map(|p| p.display().to_string()),
            output_size: Some([result.image.width, result.image.height]),
            region_area: det.region.as_ref().map(|r| r.area),
            polygon: det.polygon,
            corners: Some(det.corners),
            refined_corners: Some(det.refined.corners),
            overlay: Some(det.overlay.clone()),
            h_rect_from_img: Some(det.homography.h_rect_from_img.to_array()),
            h_img_from_rect: Some(det.homography.h_img_from_rect.to_array()),
            error: None,
        }
    }

    pub fn from_error(input_path: Option<&Path>, err: &RectifyError) -> Self {
        Self {
            input_path: input_path.map(|p| p.display().to_string()),
            error: Some(err.to_string()),
            ..Self::default()
        }
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, RectifyIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), RectifyIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
