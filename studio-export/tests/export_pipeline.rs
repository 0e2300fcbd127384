//! End-to-end export scenarios: store snapshot, planning, rendering, bundles.

use studio_core::{
    builtin_devices, CanvasElement, ElementKind, ElementStore, Rect, ShapeKind, Tool,
};
use studio_export::{
    estimate_size, presets_in, BundleManifest, ExportFormat, ExportOptions, ExportScene,
    Exporter, JobStatus, PresetCategory, SvgSurface, MANIFEST_FILE,
};

fn mockup_store() -> ElementStore {
    let devices = builtin_devices();
    let mut store = ElementStore::default();
    store
        .add(CanvasElement::new(ElementKind::solid_background("#0f172a")))
        .expect("background");
    store
        .add(
            CanvasElement::new(ElementKind::text("Ship faster"))
                .with_bounds(Rect::new(80.0, 120.0, 920.0, 120.0)),
        )
        .expect("headline");
    store.set_tool(Tool::Frame("pixel-8".to_string()));
    let frame = store
        .place(studio_core::Point::new(240.0, 400.0))
        .expect("place")
        .expect("frame");
    let shot = store
        .add(CanvasElement::new(ElementKind::image("https://cdn.example.com/shot.png")))
        .expect("screenshot");
    store
        .link_frame_content(frame, shot, &devices)
        .expect("link");
    store
}

#[test]
fn test_png_1080_by_1920_estimate() {
    let options = ExportOptions::default()
        .with_size(1080, 1920)
        .with_quality(0.9);
    let (width, height) = options
        .resolve_dimensions(1080.0, 1920.0)
        .expect("within png limits");
    assert_eq!(
        estimate_size(ExportFormat::Png, width, height, options.quality),
        1080 * 1920 * 4
    );
}

#[tokio::test]
async fn test_svg_export_of_mockup() {
    let store = mockup_store();
    let scene = ExportScene::from_store(&store);
    let exporter = Exporter::new(SvgSurface::new());

    let output = exporter
        .export(&scene, "mockup", &ExportOptions::for_format(ExportFormat::Svg))
        .await
        .expect("svg export");
    assert_eq!(output.mime_type(), "image/svg+xml");
    assert_eq!((output.width, output.height), (1080, 1920));

    let svg = String::from_utf8(output.bytes).expect("utf8");
    assert!(svg.contains("fill=\"#0f172a\""));
    assert!(svg.contains("Ship faster"));
    // Remote screenshot is not fetched; it renders as a placeholder inside the screen.
    assert!(svg.contains("clip-path=\"url(#screen-1)\""));
    assert!(svg.contains(">Image</text>"));
}

#[tokio::test]
async fn test_selected_only_export_crops_to_selection() {
    let mut store = mockup_store();
    let headline = store
        .elements()
        .iter()
        .find(|el| matches!(el.kind, ElementKind::Text(_)))
        .map(|el| el.id)
        .expect("headline");
    store.select(&[headline]);

    let scene = ExportScene::from_store(&store);
    let options = ExportOptions {
        selected_only: true,
        format: ExportFormat::Svg,
        padding: 10.0,
        ..ExportOptions::default()
    };
    let output = Exporter::new(SvgSurface::new())
        .export(&scene, "headline", &options)
        .await
        .expect("export");
    assert_eq!((output.width, output.height), (940, 140));
    let svg = String::from_utf8(output.bytes).expect("utf8");
    assert!(svg.contains("viewBox=\"70 110 940 140\""));
    assert!(!svg.contains("#0f172a"));
}

#[tokio::test]
async fn test_social_batch_writes_bundle() {
    let store = mockup_store();
    let scene = ExportScene::from_store(&store);
    let base = ExportOptions::for_format(ExportFormat::Svg);
    let mut jobs: Vec<_> = presets_in(PresetCategory::Social)
        .iter()
        .map(|preset| {
            let mut job = preset.to_job(&base);
            // Keep the test independent of the raster backend.
            job.options.format = ExportFormat::Svg;
            job
        })
        .collect();
    jobs.push(studio_export::ExportJob::new(
        "too-big",
        ExportOptions::for_format(ExportFormat::Svg).with_size(40_000, 10),
    ));

    let mut finished = Vec::new();
    let report = Exporter::new(SvgSurface::new())
        .export_batch(&scene, &jobs, |progress| {
            if progress.status.is_finished() {
                finished.push(progress.name.clone());
            }
        })
        .await;

    assert_eq!(finished.len(), jobs.len());
    assert_eq!(report.failed(), 1);
    assert!(matches!(
        &report.jobs.last().expect("job").status,
        JobStatus::Error { message } if message.contains("width")
    ));

    let dir = tempfile::tempdir().expect("tempdir");
    let manifest_path = report.bundle.write_to_dir(dir.path()).expect("write");
    assert_eq!(manifest_path, dir.path().join(MANIFEST_FILE));
    let manifest: BundleManifest =
        serde_json::from_str(&std::fs::read_to_string(&manifest_path).expect("read"))
            .expect("parse");
    assert_eq!(manifest.job_count, jobs.len());
    assert_eq!(manifest.files.len(), jobs.len() - 1);
    for file in &manifest.files {
        let bytes = std::fs::read(dir.path().join(&file.filename)).expect("file");
        assert_eq!(bytes.len(), file.size);
    }
}

#[cfg(feature = "raster")]
#[tokio::test]
async fn test_raster_formats_from_store() {
    let mut store = ElementStore::default();
    store
        .add(
            CanvasElement::new(ElementKind::shape(ShapeKind::Triangle))
                .with_bounds(Rect::new(10.0, 10.0, 80.0, 80.0)),
        )
        .expect("shape");
    store
        .update_viewport(|vp| vp.set_canvas_size(100.0, 100.0))
        .expect("resize");
    let scene = ExportScene::from_store(&store);
    let exporter = Exporter::new(SvgSurface::new());

    let png = exporter
        .export(&scene, "png", &ExportOptions::default())
        .await
        .expect("png");
    assert_eq!(&png.bytes[0..4], &[137, 80, 78, 71]);

    let jpg = exporter
        .export(&scene, "jpg", &ExportOptions::for_format(ExportFormat::Jpg))
        .await
        .expect("jpg");
    assert_eq!(&jpg.bytes[0..2], &[0xFF, 0xD8]);

    let pdf = exporter
        .export(&scene, "pdf", &ExportOptions::for_format(ExportFormat::Pdf))
        .await
        .expect("pdf");
    assert_eq!(&pdf.bytes[0..5], b"%PDF-");
}
