//! Properties of export dimension resolution and size estimates.

use proptest::prelude::*;
use studio_export::{estimate_size, ExportFormat, ExportOptions};

fn any_format() -> impl Strategy<Value = ExportFormat> {
    prop::sample::select(ExportFormat::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_scale_multiplies_content(
        w in 1.0..2_000.0f64,
        h in 1.0..2_000.0f64,
        scale in 0.1..4.0f64,
    ) {
        let options = ExportOptions::for_format(ExportFormat::Svg).with_scale(scale);
        let (width, height) = options.resolve_dimensions(w, h).expect("within limits");
        prop_assert!((f64::from(width) - (w * scale).round().max(1.0)).abs() < 1e-9);
        prop_assert!((f64::from(height) - (h * scale).round().max(1.0)).abs() < 1e-9);
    }

    #[test]
    fn prop_width_override_keeps_aspect(
        w in 200.0..2_000.0f64,
        h in 200.0..2_000.0f64,
        target in 16u32..2_000,
    ) {
        let options = ExportOptions {
            width: Some(target),
            ..ExportOptions::for_format(ExportFormat::Svg)
        };
        let (width, height) = options.resolve_dimensions(w, h).expect("within limits");
        prop_assert_eq!(width, target);
        let expected = f64::from(target) * h / w;
        prop_assert!((f64::from(height) - expected).abs() <= 0.5 + 1e-9 || height == 1);
    }

    #[test]
    fn prop_oversized_output_names_a_dimension(format in any_format(), extra in 1u32..1_000) {
        let too_big = format.max_dimension() + extra;
        let err = ExportOptions::for_format(format)
            .with_size(too_big, 100)
            .resolve_dimensions(100.0, 100.0)
            .expect_err("over the limit");
        prop_assert_eq!(err.field(), Some("width"));

        let err = ExportOptions::for_format(format)
            .with_size(100, too_big)
            .resolve_dimensions(100.0, 100.0)
            .expect_err("over the limit");
        prop_assert_eq!(err.field(), Some("height"));
    }

    #[test]
    fn prop_lossy_estimates_grow_with_quality(
        w in 1u32..4_000,
        h in 1u32..4_000,
        low in 0.0..0.5f64,
        high in 0.5..=1.0f64,
    ) {
        for format in [ExportFormat::Jpg, ExportFormat::Webp, ExportFormat::Pdf] {
            prop_assert!(estimate_size(format, w, h, low) <= estimate_size(format, w, h, high));
        }
        prop_assert_eq!(
            estimate_size(ExportFormat::Png, w, h, low),
            u64::from(w) * u64::from(h) * 4
        );
    }
}
