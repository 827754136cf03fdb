// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Map placement derived from note annotations.
//!
//! Notes carry free-form annotation strings. Three prefixes are understood:
//!
//! | Annotation      | Effect                         | Accepted range         |
//! |-----------------|--------------------------------|------------------------|
//! | `lat:<float>`   | latitude                       | `-90.0 ..= 90.0`       |
//! | `lng:<float>`   | longitude                      | `-180.0 ..= 180.0`     |
//! | `col:#RRGGBB`   | marker colour                  | six hex digits         |
//!
//! Malformed or out-of-range entries are skipped. Later entries override
//! earlier ones. Anything else is an opaque label.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_LATITUDE: f64 = 52.23;
pub const DEFAULT_LONGITUDE: f64 = 21.01;
pub const DEFAULT_COLOR: &str = "#3b82f6";

/// Placement of a note on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NoteStyle {
    pub latitude: f64,
    pub longitude: f64,
    pub color: String,
}

impl Default for NoteStyle {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

impl NoteStyle {
    /// Derive the placement from a note's annotations.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let mut style = Self::default();

        for tag in tags {
            let Some((key, value)) = tag.as_ref().split_once(':') else {
                continue;
            };
            match key {
                "lat" => {
                    if let Some(lat) = parse_in_range(value, -90.0, 90.0) {
                        style.latitude = lat;
                    }
                }
                "lng" => {
                    if let Some(lng) = parse_in_range(value, -180.0, 180.0) {
                        style.longitude = lng;
                    }
                }
                "col" => {
                    let value = value.trim();
                    if is_hex_color(value) {
                        style.color = value.to_string();
                    }
                }
                _ => {}
            }
        }

        style
    }
}

fn parse_in_range(raw: &str, min: f64, max: f64) -> Option<f64> {
    let v: f64 = raw.trim().parse().ok()?;
    // NaN fails both comparisons
    (v >= min && v <= max).then_some(v)
}

/// `#RRGGBB` with six hex digits.
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}
