use alchemy_core::{AlchemyConfig, AlchemyEngine, Element, FrameSnapshot, Position};
use alchemy_render::{AssetCatalog, CommandBuffer, DrawCommand, Rgb, icon_anchor, render_frame};
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

fn asset_root(files: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let images = dir.path().join("images");
    fs::create_dir_all(&images).expect("images dir");
    for name in files {
        fs::write(images.join(name), b"stub").expect("write asset");
    }
    dir
}

fn image_calls(commands: &[DrawCommand]) -> Vec<(String, Position, f32)> {
    commands
        .iter()
        .filter_map(|cmd| match cmd {
            DrawCommand::Image {
                path,
                center,
                width,
                ..
            } => Some((
                path.file_name()?.to_string_lossy().into_owned(),
                *center,
                *width,
            )),
            _ => None,
        })
        .collect()
}

#[test]
fn catalog_prefers_jpg_over_png() {
    let root = asset_root(&["AIR.jpg", "AIR.png", "FIRE.png", "PENT.png"]);
    let catalog = AssetCatalog::discover(root.path());
    assert_eq!(
        catalog.image(Element::Air).and_then(Path::file_name),
        Some(OsStr::new("AIR.jpg"))
    );
    assert_eq!(
        catalog.image(Element::Fire).and_then(Path::file_name),
        Some(OsStr::new("FIRE.png"))
    );
    assert!(catalog.image(Element::Water).is_none());
    assert!(catalog.overlay().is_some());
    assert!(catalog.missing().contains(&Element::Earth));
    assert!(!catalog.missing().contains(&Element::Air));
}

#[test]
fn idle_table_draws_zones_and_library() {
    let root = asset_root(&["FIRE.png", "AIR.png", "WATER.png", "EARTH.png"]);
    let catalog = AssetCatalog::discover(root.path());
    let mut engine = AlchemyEngine::new(AlchemyConfig::default()).expect("engine");
    let mut surface = CommandBuffer::new();

    render_frame(&mut engine, &catalog, &mut surface, Instant::now());

    let commands = surface.commands();
    assert_eq!(
        commands[0],
        DrawCommand::Circle {
            center: Position::new(683.0, 384.0),
            radius: 350.0,
            color: Rgb::MAGENTA,
        }
    );
    assert_eq!(
        commands[1],
        DrawCommand::Circle {
            center: Position::new(683.0, 384.0),
            radius: 320.0,
            color: Rgb::BLACK,
        }
    );
    let rects: Vec<_> = commands
        .iter()
        .filter_map(|cmd| match cmd {
            DrawCommand::Rect {
                rotation_deg,
                color,
                center,
                ..
            } => Some((*rotation_deg, *color, *center)),
            _ => None,
        })
        .collect();
    assert_eq!(
        rects,
        vec![
            (45.0, Rgb::VOID_BLUE, Position::new(1183.0, 384.0)),
            (-45.0, Rgb::VOID_BLUE, Position::new(1183.0, 384.0)),
        ]
    );
    let images = image_calls(commands);
    let names: Vec<_> = images.iter().map(|(n, _, _)| n.as_str()).collect();
    assert_eq!(names, ["FIRE.png", "AIR.png", "WATER.png", "EARTH.png"]);
    assert!(images.iter().all(|(_, _, w)| *w == 50.0));
}

#[test]
fn charging_vessel_gets_a_ring() {
    let root = asset_root(&["FIRE.png"]);
    let catalog = AssetCatalog::discover(root.path());
    let mut engine = AlchemyEngine::new(AlchemyConfig::default()).expect("engine");
    let fire = engine.library().position_of(Element::Fire).expect("fire");
    let now = Instant::now();
    for i in 0..4 {
        let snapshot = FrameSnapshot::new().with(1, fire.x, fire.y + 20.0);
        engine.step(&snapshot, now + Duration::from_millis(33 * i));
    }
    let mut surface = CommandBuffer::new();
    render_frame(&mut engine, &catalog, &mut surface, now);

    let anchor = icon_anchor(
        Position::new(fire.x, fire.y + 20.0),
        engine.config().midpoint(),
    );
    let rings: Vec<_> = surface
        .commands()
        .iter()
        .filter_map(|cmd| match cmd {
            DrawCommand::Circle {
                center,
                radius,
                color,
            } if *center == anchor => Some((*radius, *color)),
            _ => None,
        })
        .collect();
    assert_eq!(rings.len(), 3);
    assert_eq!(rings[0], (40.0, Rgb::RING_GREY));
    assert!((rings[1].0 - 16.0).abs() < 1e-3);
    assert_eq!(rings[1].1, Rgb::CYAN);
    assert!((rings[2].0 - 9.0).abs() < 1e-3);

    let images = image_calls(surface.commands());
    assert!(images.contains(&("FIRE.png".to_string(), anchor, 40.0)));
}

#[test]
fn combination_flash_draws_overlay_and_new_station() {
    let root = asset_root(&["FIRE.png", "AIR.png", "ENERGY.png", "PENT.png"]);
    let catalog = AssetCatalog::discover(root.path());
    let mut engine = AlchemyEngine::new(AlchemyConfig::default()).expect("engine");
    let fire = engine.library().position_of(Element::Fire).expect("fire");
    let air = engine.library().position_of(Element::Air).expect("air");
    let start = Instant::now();
    let mut now = start;
    for _ in 0..10 {
        let snapshot = FrameSnapshot::new()
            .with(1, fire.x, fire.y)
            .with(2, air.x, air.y + 30.0);
        engine.step(&snapshot, now);
        now += Duration::from_millis(33);
    }
    let mid = engine.config().midpoint();
    let snapshot = FrameSnapshot::new()
        .with(1, mid.x + 100.0, mid.y)
        .with(2, mid.x + 160.0, mid.y);
    let events = engine.step(&snapshot, now);
    assert_eq!(events.combinations.len(), 1);

    let mut surface = CommandBuffer::new();
    render_frame(&mut engine, &catalog, &mut surface, now);
    let images = image_calls(surface.commands());
    assert_eq!(images[0], ("PENT.png".to_string(), mid, 600.0));
    let product_anchor = icon_anchor(Position::new(mid.x + 100.0, mid.y), mid);
    assert!(images.contains(&("ENERGY.png".to_string(), product_anchor, 40.0)));
    assert!(images.contains(&("ENERGY.png".to_string(), Position::new(425.0, 40.0), 50.0)));

    // Next read flips the flicker off; after expiry it stays off.
    surface.clear();
    render_frame(&mut engine, &catalog, &mut surface, now);
    assert!(!image_calls(surface.commands()).iter().any(|(n, _, _)| n == "PENT.png"));
    surface.clear();
    render_frame(&mut engine, &catalog, &mut surface, now + Duration::from_secs(2));
    assert!(!image_calls(surface.commands()).iter().any(|(n, _, _)| n == "PENT.png"));
}
