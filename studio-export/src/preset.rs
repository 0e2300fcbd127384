//! Named output sizes grouped by target platform.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, ExportResult};
use crate::options::{ExportFormat, ExportOptions};
use crate::pipeline::ExportJob;

/// Platform a preset targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetCategory {
    /// Apple App Store screenshots.
    AppStore,
    /// Google Play Store listing assets.
    PlayStore,
    /// Social media posts and stories.
    Social,
    /// Web banners and preview images.
    Web,
}

impl PresetCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 4] = [Self::AppStore, Self::PlayStore, Self::Social, Self::Web];

    /// Stable id, as used on the command line.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::AppStore => "app-store",
            Self::PlayStore => "play-store",
            Self::Social => "social",
            Self::Web => "web",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AppStore => "App Store",
            Self::PlayStore => "Play Store",
            Self::Social => "Social Media",
            Self::Web => "Web",
        }
    }
}

impl fmt::Display for PresetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PresetCategory {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.id() == s.trim())
            .ok_or_else(|| ExportError::validation("category", format!("unknown category '{s}'")))
    }
}

/// A named output size and format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPreset {
    /// Catalogue id, also the default output filename.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Target platform.
    pub category: PresetCategory,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output format.
    pub format: ExportFormat,
}

impl ExportPreset {
    fn new(
        id: &str,
        name: &str,
        category: PresetCategory,
        (width, height): (u32, u32),
        format: ExportFormat,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            width,
            height,
            format,
        }
    }

    /// Export job for this preset. Size and format come from the preset; the
    /// remaining options (quality, background, padding) from `base`.
    #[must_use]
    pub fn to_job(&self, base: &ExportOptions) -> ExportJob {
        ExportJob {
            name: self.id.clone(),
            options: ExportOptions {
                format: self.format,
                width: Some(self.width),
                height: Some(self.height),
                ..base.clone()
            },
        }
    }
}

/// The built-in preset catalogue.
#[must_use]
pub fn builtin_presets() -> Vec<ExportPreset> {
    use ExportFormat::{Jpg, Png, Webp};
    use PresetCategory::{AppStore, PlayStore, Social, Web};

    vec![
        ExportPreset::new("app-store-iphone-6-9", "iPhone 6.9\"", AppStore, (1320, 2868), Png),
        ExportPreset::new("app-store-iphone-6-5", "iPhone 6.5\"", AppStore, (1284, 2778), Png),
        ExportPreset::new("app-store-iphone-5-5", "iPhone 5.5\"", AppStore, (1242, 2208), Png),
        ExportPreset::new("app-store-ipad-13", "iPad 13\"", AppStore, (2064, 2752), Png),
        ExportPreset::new("app-store-ipad-12-9", "iPad 12.9\"", AppStore, (2048, 2732), Png),
        ExportPreset::new("play-store-phone", "Phone", PlayStore, (1080, 1920), Png),
        ExportPreset::new("play-store-tablet-7", "7\" Tablet", PlayStore, (1200, 1920), Png),
        ExportPreset::new("play-store-tablet-10", "10\" Tablet", PlayStore, (1600, 2560), Png),
        ExportPreset::new("play-store-feature-graphic", "Feature Graphic", PlayStore, (1024, 500), Jpg),
        ExportPreset::new("instagram-post", "Instagram Post", Social, (1080, 1080), Jpg),
        ExportPreset::new("instagram-story", "Instagram Story", Social, (1080, 1920), Jpg),
        ExportPreset::new("twitter-post", "X / Twitter Post", Social, (1600, 900), Jpg),
        ExportPreset::new("facebook-post", "Facebook Post", Social, (1200, 630), Jpg),
        ExportPreset::new("linkedin-post", "LinkedIn Post", Social, (1200, 627), Jpg),
        ExportPreset::new("og-image", "Open Graph Image", Web, (1200, 630), Png),
        ExportPreset::new("web-hero", "Hero Banner", Web, (1920, 1080), Webp),
        ExportPreset::new("favicon", "Favicon", Web, (512, 512), Png),
    ]
}

/// Built-in presets for one category.
#[must_use]
pub fn presets_in(category: PresetCategory) -> Vec<ExportPreset> {
    builtin_presets()
        .into_iter()
        .filter(|p| p.category == category)
        .collect()
}

/// Look up a built-in preset by id.
///
/// # Errors
///
/// Returns [`ExportError::UnknownPreset`] if no preset has that id.
pub fn find_preset(id: &str) -> ExportResult<ExportPreset> {
    builtin_presets()
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| ExportError::UnknownPreset(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_ids_are_unique() {
        let presets = builtin_presets();
        let ids: HashSet<&str> = presets.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), presets.len());
    }

    #[test]
    fn test_every_category_has_presets() {
        for category in PresetCategory::ALL {
            assert!(!presets_in(category).is_empty(), "{category}");
        }
    }

    #[test]
    fn test_presets_fit_their_format() {
        for preset in builtin_presets() {
            let job = preset.to_job(&ExportOptions::default());
            job.options
                .resolve_dimensions(1080.0, 1920.0)
                .unwrap_or_else(|e| panic!("{}: {e}", preset.id));
        }
    }

    #[test]
    fn test_to_job_keeps_base_options() {
        let base = ExportOptions {
            quality: 0.5,
            padding: 12.0,
            scale: 3.0,
            ..ExportOptions::default()
        };
        let job = find_preset("instagram-post").expect("preset").to_job(&base);
        assert_eq!(job.name, "instagram-post");
        assert_eq!(job.options.format, ExportFormat::Jpg);
        assert_eq!(job.options.width, Some(1080));
        assert!((job.options.quality - 0.5).abs() < f64::EPSILON);
        assert!((job.options.padding - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_preset() {
        assert!(matches!(
            find_preset("billboard"),
            Err(ExportError::UnknownPreset(id)) if id == "billboard"
        ));
    }

    #[test]
    fn test_category_round_trip() {
        for category in PresetCategory::ALL {
            assert_eq!(category.id().parse::<PresetCategory>().expect("parse"), category);
            let json = serde_json::to_string(&category).expect("json");
            assert_eq!(json, format!("\"{}\"", category.id()));
        }
        assert!("tv".parse::<PresetCategory>().is_err());
    }
}
