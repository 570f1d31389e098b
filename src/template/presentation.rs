//! Device frame and status bar settings carried by a template

use serde::{Deserialize, Serialize};

/// How a template is presented: device size and status bar contents
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationSettings {
    pub device: DeviceFrame,
    pub status_bar: StatusBar,
}

/// Logical screen size and pixel density of the simulated device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceFrame {
    pub name: String,
    /// Logical width in points
    pub width: u32,
    /// Logical height in points
    pub height: u32,
    /// Device pixel ratio
    pub scale: f64,
}

impl Default for DeviceFrame {
    fn default() -> Self {
        Self {
            name: "iPhone 14".to_string(),
            width: 390,
            height: 844,
            scale: 3.0,
        }
    }
}

impl DeviceFrame {
    /// Raster size in pixels
    pub fn output_size(&self) -> (u32, u32) {
        let scale = if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            1.0
        };
        (
            (self.width as f64 * scale).round() as u32,
            (self.height as f64 * scale).round() as u32,
        )
    }
}

/// Simulated status bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusBar {
    pub visible: bool,
    pub time: String,
    /// Battery level in percent
    pub battery: u8,
    pub charging: bool,
    /// Network label such as `5G` or `WiFi`
    pub network: String,
    pub carrier: Option<String>,
    /// Dark glyphs on a light background
    pub dark_content: bool,
}

impl Default for StatusBar {
    fn default() -> Self {
        Self {
            visible: true,
            time: "9:41".to_string(),
            battery: 100,
            charging: false,
            network: "5G".to_string(),
            carrier: None,
            dark_content: true,
        }
    }
}
