//! Scene drawing for the alchemy table on top of an abstract drawing surface.

use alchemy_core::{AlchemyEngine, Element, Position, Vessel};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

/// Radius of the charge ring drawn next to a vessel.
pub const VESSEL_RING_RADIUS: f32 = 40.0;
/// Gap between the ring edge and the marker itself.
pub const ICON_STANDOFF: f32 = 40.0;
/// Edge length of the element icon drawn next to a vessel.
pub const VESSEL_ICON_SIZE: f32 = 40.0;
const RING_INSET: f32 = 7.0;
const ZONE_RIM: f32 = 30.0;
const OVERLAY_SIZE: f32 = 600.0;
const VOID_BAR_WIDTH: f32 = 30.0;
const VOID_BAR_ANGLE: f32 = 45.0;
const RING_MIN_CHARGE: f32 = 0.0001;
const OVERLAY_NAME: &str = "PENT";

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Self = Self(0, 0, 0);
    pub const CYAN: Self = Self(0, 255, 255);
    pub const MAGENTA: Self = Self(255, 0, 255);
    pub const RING_GREY: Self = Self(50, 50, 50);
    pub const VOID_BLUE: Self = Self(0, 0, 153);
}

/// Drawing primitives the projector backend must provide.
pub trait Surface {
    /// Filled circle.
    fn circle(&mut self, center: Position, radius: f32, color: Rgb);
    /// Image scaled to `width` x `height`, centred on `center`.
    fn image(&mut self, path: &Path, center: Position, width: f32, height: f32);
    /// Filled rectangle centred on `center`, rotated by `rotation_deg` degrees.
    fn rect(&mut self, center: Position, width: f32, height: f32, rotation_deg: f32, color: Rgb);
}

/// A recorded drawing call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum DrawCommand {
    Circle {
        center: Position,
        radius: f32,
        color: Rgb,
    },
    Image {
        path: PathBuf,
        center: Position,
        width: f32,
        height: f32,
    },
    Rect {
        center: Position,
        width: f32,
        height: f32,
        rotation_deg: f32,
        color: Rgb,
    },
}

/// Surface that records every call, for headless runs and tests.
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    commands: Vec<DrawCommand>,
}

impl CommandBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Take the recorded commands, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Surface for CommandBuffer {
    fn circle(&mut self, center: Position, radius: f32, color: Rgb) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn image(&mut self, path: &Path, center: Position, width: f32, height: f32) {
        self.commands.push(DrawCommand::Image {
            path: path.to_path_buf(),
            center,
            width,
            height,
        });
    }

    fn rect(&mut self, center: Position, width: f32, height: f32, rotation_deg: f32, color: Rgb) {
        self.commands.push(DrawCommand::Rect {
            center,
            width,
            height,
            rotation_deg,
            color,
        });
    }
}

/// Element artwork resolved from an asset directory.
///
/// Each element looks for `images/<NAME>.jpg`, then `images/<NAME>.png`, under the root.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    images: HashMap<Element, PathBuf>,
    overlay: Option<PathBuf>,
}

impl AssetCatalog {
    /// Probe `root` for every element's artwork and the reaction-zone overlay.
    #[must_use]
    pub fn discover(root: &Path) -> Self {
        let images = Element::ALL
            .into_iter()
            .filter_map(|element| find_image_file(root, element.name()).map(|p| (element, p)))
            .collect();
        let overlay = Some(image_path(root, OVERLAY_NAME, "png")).filter(|p| p.is_file());
        Self { images, overlay }
    }

    #[must_use]
    pub fn image(&self, element: Element) -> Option<&Path> {
        self.images.get(&element).map(PathBuf::as_path)
    }

    /// Pentagram shown over the reaction zone while the combination flash is lit.
    #[must_use]
    pub fn overlay(&self) -> Option<&Path> {
        self.overlay.as_deref()
    }

    /// Drawable elements without artwork; `Void` is never drawn and never reported.
    #[must_use]
    pub fn missing(&self) -> Vec<Element> {
        Element::ALL
            .into_iter()
            .filter(|element| !element.is_void() && !self.images.contains_key(element))
            .collect()
    }
}

fn image_path(root: &Path, name: &str, ext: &str) -> PathBuf {
    root.join("images").join(format!("{name}.{ext}"))
}

fn find_image_file(root: &Path, name: &str) -> Option<PathBuf> {
    ["jpg", "png"]
        .into_iter()
        .map(|ext| image_path(root, name, ext))
        .find(|path| path.is_file())
}

/// Where a vessel's icon is drawn: pushed from the marker towards the table centre so the
/// token does not cover it. A marker exactly on the centre keeps its own position.
#[must_use]
pub fn icon_anchor(vessel: Position, midpoint: Position) -> Position {
    let dx = vessel.x - midpoint.x;
    let dy = vessel.y - midpoint.y;
    let norm = dx.hypot(dy);
    if norm <= f32::EPSILON {
        return vessel;
    }
    let reach = VESSEL_RING_RADIUS + ICON_STANDOFF;
    Position::new(vessel.x - dx / norm * reach, vessel.y - dy / norm * reach)
}

/// Draw one frame: zones, vessels, then library stations.
///
/// Reading the flash signals advances their flicker, so call this once per frame.
pub fn render_frame(
    engine: &mut AlchemyEngine,
    assets: &AssetCatalog,
    surface: &mut dyn Surface,
    now: Instant,
) {
    let combination_lit = engine.sample_combination_flash(now);
    let void_lit = engine.sample_void_flash(now);
    let config = engine.config();
    let midpoint = config.midpoint();

    surface.circle(midpoint, config.alchemy_radius, Rgb::MAGENTA);
    surface.circle(midpoint, config.alchemy_radius - ZONE_RIM, Rgb::BLACK);
    if combination_lit {
        match assets.overlay() {
            Some(path) => surface.image(path, midpoint, OVERLAY_SIZE, OVERLAY_SIZE),
            None => debug!("no reaction overlay artwork; skipping flash"),
        }
    }

    let void_color = if void_lit { Rgb::BLACK } else { Rgb::VOID_BLUE };
    let void_center = config.void_center();
    for angle in [VOID_BAR_ANGLE, -VOID_BAR_ANGLE] {
        surface.rect(void_center, VOID_BAR_WIDTH, config.void_size, angle, void_color);
    }

    for vessel in engine.vessels().iter() {
        draw_vessel(vessel, midpoint, config.ready_threshold, assets, surface);
    }

    let icon = config.library_icon_size;
    for station in engine.library().stations() {
        match assets.image(station.element) {
            Some(path) => surface.image(path, station.position, icon, icon),
            None => debug!(element = %station.element, "no artwork for library station"),
        }
    }
}

fn draw_vessel(
    vessel: &Vessel,
    midpoint: Position,
    ready_threshold: f32,
    assets: &AssetCatalog,
    surface: &mut dyn Surface,
) {
    let anchor = icon_anchor(vessel.position, midpoint);
    // Charging progress only; ready and empty vessels show no ring.
    if vessel.charge > RING_MIN_CHARGE && vessel.charge < ready_threshold {
        let filled = VESSEL_RING_RADIUS * vessel.charge;
        surface.circle(anchor, VESSEL_RING_RADIUS, Rgb::RING_GREY);
        surface.circle(anchor, filled, Rgb::CYAN);
        surface.circle(anchor, (filled - RING_INSET).max(0.0), Rgb::RING_GREY);
    }
    if !vessel.element.is_void() {
        if let Some(path) = assets.image(vessel.element) {
            surface.image(path, anchor, VESSEL_ICON_SIZE, VESSEL_ICON_SIZE);
        }
    }
}
