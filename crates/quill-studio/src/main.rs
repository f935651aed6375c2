use anyhow::{Context, Result};
use quill_engine::backend::BackendCall;
use quill_engine::clip::PrimitiveId;
use quill_engine::coords::{Rect, Viewport};
use quill_engine::logging::{init_logging, LoggingConfig};
use quill_engine::material::{BlendMode, MaterialLayer, Texture, TextureId, WrapMode};
use quill_engine::paint::Color;
use quill_engine::{
    FlushReport, JournalConfig, Material, PolygonVertex, RecordingBackend, RenderContext,
};

const WIDTH: f32 = 640.0;
const HEIGHT: f32 = 480.0;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = JournalConfig::from_env();
    let mut ctx = RenderContext::new(RecordingBackend::new(), config);

    ctx.set_viewport(Viewport::new(0.0, 0.0, WIDTH, HEIGHT))?;
    ctx.edit_projection(|p| p.ortho(0.0, WIDTH, HEIGHT, 0.0, -1.0, 1.0))?;

    let mut reports = Vec::new();

    // Tiled background: one material, one draw.
    let tiles = Material::new()
        .with_layer(MaterialLayer::textured(Texture::new(TextureId(1), 64, 64)))
        .into_ref();
    let cells: Vec<Rect> = (0..10)
        .flat_map(|y| (0..10).map(move |x| Rect::from_origin_size(x as f32 * 64.0, y as f32 * 48.0, 64.0, 48.0)))
        .collect();
    ctx.draw_rectangles(&cells, &tiles)?;
    reports.push(ctx.flush().context("background flush")?);

    // Detail map repeated over a panel, under a scissor clip.
    let panel = Material::new()
        .with_blend(BlendMode::SourceOver)
        .with_color(Color::from_rgba8(255, 255, 255, 200))
        .with_layer(MaterialLayer::textured(Texture::new(TextureId(2), 128, 128)))
        .with_layer(
            MaterialLayer::textured(Texture::new(TextureId(3), 32, 32)).with_wrap(WrapMode::Repeat),
        )
        .into_ref();
    ctx.push_clip_window_rectangle(40.0, 40.0, 320.0, 240.0);
    ctx.push_matrix();
    ctx.modelview_mut().translate(40.0, 40.0, 0.0);
    ctx.draw_multitextured_rectangle(
        Rect::from_origin_size(0.0, 0.0, 320.0, 240.0),
        &panel,
        &[[0.0, 0.0, 1.0, 1.0], [0.0, 0.0, 8.0, 6.0]],
    )?;
    ctx.pop_matrix()?;
    reports.push(ctx.flush().context("panel flush")?);
    ctx.pop_clip();

    // Rotated badges clipped to a stencil silhouette.
    let mut badge = Material::new()
        .with_blend(BlendMode::Additive)
        .with_layer(MaterialLayer::textured(Texture::new(TextureId(4), 16, 16)))
        .into_ref();
    ctx.push_clip_primitive(PrimitiveId(1), Rect::from_origin_size(400.0, 40.0, 200.0, 200.0));
    for i in 0..6 {
        ctx.push_matrix();
        ctx.modelview_mut().translate(500.0, 140.0, 0.0);
        ctx.modelview_mut().rotate(i as f32 * 15.0, 0.0, 0.0, 1.0);
        ctx.draw_textured_rectangle(
            Rect::from_origin_size(-16.0, -16.0, 32.0, 32.0),
            &badge,
            [0.0, 0.0, 1.0, 1.0],
        )?;
        ctx.pop_matrix()?;
    }
    reports.push(ctx.flush().context("badge flush")?);
    ctx.edit_material(&mut badge, |m| m.color = Color::from_straight(1.0, 0.6, 0.2, 1.0))?;
    ctx.pop_clip();

    // Immediate polygon.
    let arrow = [
        PolygonVertex::new(320.0, 300.0, 0.5, 0.0),
        PolygonVertex::new(380.0, 400.0, 1.0, 1.0),
        PolygonVertex::new(260.0, 400.0, 0.0, 1.0),
    ];
    ctx.draw_polygon(&arrow, &badge)?;

    ctx.draw_rectangle(Rect::from_origin_size(0.0, 440.0, WIDTH, 40.0), &tiles)?;
    reports.push(ctx.flush().context("final flush")?);

    print_summary(&reports, ctx.backend().calls());
    Ok(())
}

fn print_summary(reports: &[FlushReport], calls: &[BackendCall]) {
    for (i, r) in reports.iter().enumerate() {
        println!(
            "flush {i}: {} entries, {} vertices, {} draws ({} stride / {} layer / {} material batches)",
            r.entries,
            r.vertices,
            r.draw_calls(),
            r.stride_batches,
            r.layer_batches,
            r.material_batches,
        );
    }

    let count = |f: fn(&BackendCall) -> bool| calls.iter().filter(|c| f(c)).count();
    println!("backend calls:   {}", calls.len());
    println!("  draws:         {}", count(BackendCall::is_draw));
    println!("  material:      {}", count(|c| matches!(c, BackendCall::FlushMaterial { .. })));
    println!("  matrix loads:  {}", count(|c| matches!(c, BackendCall::LoadMatrix(_))));
    println!("  clip changes:  {}", count(|c| matches!(c, BackendCall::FlushClip(_))));
    println!("  uploads:       {}", count(|c| matches!(c, BackendCall::UploadBuffer { .. })));

    for call in calls {
        log::debug!("{call:?}");
    }
}
