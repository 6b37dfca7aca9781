// tests/rendering.rs
//
// End-to-end rendering checks: pixel colours of the phase-field mesh, file output for
// frames and animations, and format errors. Everything is drawn at 10 dpi with labels
// disabled, so the figures are tiny and need no fonts.
// Run with: cargo test --test rendering

use std::fs;

use plotters::prelude::*;
use tempfile::tempdir;

use patic_anim::color::{Colormap, Rgb};
use patic_anim::config::{Grouping, Mode, Which};
use patic_anim::demo_fields::Demo;
use patic_anim::visualisation::RenderOptions;
use patic_anim::{AnimError, PAticAnimator, PhaseField};

fn tiny() -> RenderOptions {
    RenderOptions { dpi: 10.0, labels: false, frame_delay_ms: 50 }
}

fn constant_field(nt: usize, ny: usize, nx: usize, value: f64) -> PhaseField {
    PhaseField::new(&[nt, ny, nx], vec![value; nt * ny * nx]).unwrap()
}

fn animator(p: u32, field: PhaseField) -> PAticAnimator {
    let mut a = PAticAnimator::new(p).unwrap();
    a.set_field(field);
    a.set_render_options(tiny());
    a
}

// Centre of the field panel in a 120x100 figure (colour bar takes the right 10%).
const CENTRE: (u32, u32) = (54, 50);

#[test]
fn constant_field_fills_the_panel_with_the_colormap_midpoint() {
    let mut a = animator(4, constant_field(1, 6, 6, 30.0));
    a.config_mut().set_colormap(Colormap::Greys);

    let img = a.preview(None).unwrap();
    assert_eq!((img.width, img.height), (120, 100));
    assert_eq!(img.pixel(CENTRE.0, CENTRE.1), Colormap::Greys.sample(0.5));
    // figure background outside the axes
    assert_eq!(img.pixel(0, 0), Rgb(255, 255, 255));
}

#[test]
fn transparent_phase_field_shows_the_axes_facecolor() {
    let mut a = animator(4, constant_field(1, 6, 6, 30.0));
    a.config_mut().set_pf_transparency(0.0).unwrap();
    let img = a.preview(None).unwrap();
    assert_eq!(img.pixel(CENTRE.0, CENTRE.1), Rgb::WHITESMOKE);

    a.config_mut().set_axes_facecolor(Rgb(10, 20, 30));
    let img = a.preview(None).unwrap();
    assert_eq!(img.pixel(CENTRE.0, CENTRE.1), Rgb(10, 20, 30));
}

#[test]
fn zero_amplitude_complex_samples_are_invisible() {
    use num_complex::Complex64;

    // left half amplitude 0, right half amplitude 1
    let (ny, nx) = (4, 4);
    let samples: Vec<Complex64> = (0..ny * nx)
        .map(|k| {
            let amp = if k % nx < nx / 2 { 0.0 } else { 1.0 };
            Complex64::from_polar(amp, 0.3)
        })
        .collect();
    let field = PhaseField::from_complex(&[1, ny, nx], &samples, 2).unwrap();
    let a = animator(2, field);

    let img = a.preview(None).unwrap();
    assert_eq!(img.pixel(20, CENTRE.1), Rgb::WHITESMOKE);
    assert_ne!(img.pixel(90, CENTRE.1), Rgb::WHITESMOKE);
}

#[test]
fn every_layout_renders() {
    let field = Demo::Defects.real_field(6, 2, 12, 12).unwrap();
    let mut a = animator(6, field);

    let mut sizes = Vec::new();
    for (which, grouping, mode) in [
        (Which::PhaseField, Grouping::Together, Mode::Solid),
        (Which::OrderParameter, Grouping::Together, Mode::Solid),
        (Which::Both, Grouping::Separate, Mode::Solid),
        (Which::Both, Grouping::Together, Mode::Solid),
        (Which::Both, Grouping::Together, Mode::Mapped),
        (Which::Both, Grouping::Together, Mode::MappedOverlay),
    ] {
        let c = a.config_mut();
        c.set_which(which);
        c.set_grouping(grouping);
        c.set_mode(mode);
        let img = a.preview(Some(1)).unwrap();
        assert_eq!(img.rgb.len(), (img.width * img.height * 3) as usize);
        sizes.push((img.width, img.height));
    }
    assert_eq!(sizes[1], (100, 100));
    assert_eq!(sizes[2], (240, 100));
}

#[test]
fn markers_are_drawn_over_the_facecolor_in_mapped_mode() {
    let mut a = animator(4, constant_field(1, 10, 10, 0.0));
    {
        let c = a.config_mut();
        c.set_which(Which::Both);
        c.set_mode(Mode::Mapped);
        c.set_marker_density(1.0, patic_anim::grid::Axis::Both).unwrap();
        c.set_marker_size(5000.0).unwrap();
    }
    let img = a.preview(None).unwrap();

    // large patches on every grid point cover most of the panel
    let face = Rgb::WHITESMOKE;
    let covered = (10..100u32)
        .flat_map(|x| (10..90u32).map(move |y| (x, y)))
        .filter(|&(x, y)| img.pixel(x, y) != face)
        .count();
    assert!(covered > 1000, "only {covered} marker pixels");
}

#[test]
fn draw_frame_accepts_any_drawing_area() {
    let a = animator(3, Demo::Spiral.real_field(3, 4, 8, 8).unwrap());
    let (w, h) = a.figure_size().unwrap();
    let mut buf = vec![0u8; (w * h * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
        let drawn = a.draw_frame(&root, Some(99)).unwrap();
        assert_eq!(drawn, 3);
        root.present().unwrap();
    }
    assert_eq!(buf, a.preview(Some(3)).unwrap().rgb);
}

#[test]
fn gif_animation_is_written() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("defects.gif");

    let a = animator(2, Demo::Defects.real_field(2, 3, 8, 8).unwrap());
    a.animate(&path).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"GIF8"));
}

#[test]
fn single_frame_png_is_written() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("frame.png");

    let a = animator(4, Demo::Uniform.real_field(4, 2, 5, 5).unwrap());
    a.save_frame(Some(1), &path).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[test]
fn unknown_extension_is_rejected_without_output() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("movie.avi");

    let a = animator(4, constant_field(2, 3, 3, 0.0));
    assert!(matches!(a.animate(&path), Err(AnimError::UnsupportedFormat(ext)) if ext == "avi"));
    assert!(!path.exists());
}

#[test]
fn mp4_export_leaves_existing_directories_alone() {
    let dir = tempdir().unwrap();
    let existing = dir.path().join("_movie_frames");
    fs::create_dir(&existing).unwrap();
    fs::write(existing.join("keep.txt"), b"keep").unwrap();

    let path = dir.path().join("movie.mp4");
    let a = animator(4, Demo::Uniform.real_field(4, 2, 5, 5).unwrap());
    match a.animate(&path) {
        // ffmpeg available
        Ok(()) => assert!(path.exists()),
        Err(e) => assert!(matches!(e, AnimError::Encoder(_)), "unexpected error: {e}"),
    }

    assert_eq!(fs::read(existing.join("keep.txt")).unwrap(), b"keep");
    // the scratch frame directory is gone either way
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("_movie_frames") && n != "_movie_frames")
        .collect();
    assert!(leftovers.is_empty(), "scratch dirs left behind: {leftovers:?}");
}

#[test]
fn manifest_is_written_next_to_the_output() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("run.gif");
    let json = out.with_extension("json");

    let mut a = animator(6, constant_field(2, 3, 4, 0.0));
    a.config_mut().set_which(Which::Both);
    a.manifest(&out).unwrap().write_json(&json).unwrap();

    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(v["shape"], serde_json::json!([2, 3, 4]));
    assert_eq!(v["plot"]["which"], "both");
    assert_eq!(v["plot"]["p"], 6);
    assert_eq!(v["fps"], 20.0);
}
