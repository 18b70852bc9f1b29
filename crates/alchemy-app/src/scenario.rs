//! Scripted marker movements standing in for the tracking layer.

use alchemy_core::{
    AlchemyEngine, Combination, Discovery, Element, FrameSnapshot, LibraryStation, MarkerId,
    Position,
};
use alchemy_render::{AssetCatalog, CommandBuffer, render_frame};
use anyhow::{Context, Result};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Marker charged at the FIRE station; it ends up carrying the product.
pub const FIRE_MARKER: MarkerId = 1;
/// Marker charged at the AIR station; it is consumed by the reaction.
pub const AIR_MARKER: MarkerId = 2;

const CHARGE_FRAMES: usize = 12;
const CARRY_FRAMES: usize = 8;
const HOLD_FRAMES: usize = 6;
const DISCARD_FRAMES: usize = 10;
const REST_SPREAD: f32 = 40.0;

fn lerp(from: Position, to: Position, t: f32) -> Position {
    Position::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t)
}

/// Frame-by-frame positions for the demo: charge FIRE and AIR, carry both into the
/// reaction zone, then drop the product in the void.
#[derive(Debug, Clone)]
pub struct DemoScript {
    frames: Vec<FrameSnapshot>,
    idle: FrameSnapshot,
}

impl DemoScript {
    /// Lay the script out against the engine's current stations and zones.
    pub fn for_engine(engine: &AlchemyEngine) -> Result<Self> {
        let library = engine.library();
        let fire = library
            .position_of(Element::Fire)
            .context("library has no FIRE station")?;
        let air = library
            .position_of(Element::Air)
            .context("library has no AIR station")?;
        let air = Position::new(air.x, air.y + 30.0);

        let config = engine.config();
        let mid = config.midpoint();
        let fire_rest = Position::new(mid.x - REST_SPREAD, mid.y);
        let air_rest = Position::new(mid.x + REST_SPREAD, mid.y);
        let void = config.void_center();

        let pair = |a: Position, b: Position| {
            FrameSnapshot::new()
                .with(FIRE_MARKER, a.x, a.y)
                .with(AIR_MARKER, b.x, b.y)
        };

        let mut frames = Vec::new();
        frames.extend((0..CHARGE_FRAMES).map(|_| pair(fire, air)));
        frames.extend((1..=CARRY_FRAMES).map(|step| {
            let t = step as f32 / CARRY_FRAMES as f32;
            pair(lerp(fire, fire_rest, t), lerp(air, air_rest, t))
        }));
        frames.extend((0..HOLD_FRAMES).map(|_| pair(fire_rest, air_rest)));
        frames.extend((1..=DISCARD_FRAMES).map(|step| {
            let t = step as f32 / DISCARD_FRAMES as f32;
            pair(lerp(fire_rest, void, t), air_rest)
        }));
        let idle = pair(void, air_rest);
        Ok(Self { frames, idle })
    }

    /// Snapshot for frame `index`; past the end the markers stay where they finished.
    #[must_use]
    pub fn frame(&self, index: usize) -> &FrameSnapshot {
        self.frames.get(index).unwrap_or(&self.idle)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// What happened over a scripted run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    pub combinations: Vec<Combination>,
    pub discoveries: Vec<Discovery>,
    pub voided: Vec<MarkerId>,
    /// Total drawing calls issued by the headless renderer.
    pub draw_calls: usize,
    pub library: Vec<LibraryStation>,
}

/// Drive `frames` frames of `script` through the engine, rendering each into a
/// recording surface. Time advances by `interval` per frame starting at `start`.
pub fn run(
    engine: &mut AlchemyEngine,
    script: &DemoScript,
    frames: usize,
    interval: Duration,
    assets: &AssetCatalog,
    start: Instant,
) -> RunSummary {
    let mut summary = RunSummary::default();
    let mut surface = CommandBuffer::new();
    let mut now = start;
    for index in 0..frames {
        let events = engine.step(script.frame(index), now);
        render_frame(engine, assets, &mut surface, now);
        let commands = surface.drain();
        debug!(
            frame = events.frame.0,
            draw_calls = commands.len(),
            "frame rendered"
        );
        summary.draw_calls += commands.len();

        summary.combinations.extend(events.combinations);
        summary.discoveries.extend(events.discoveries);
        summary.voided.extend(events.voided);
        match now.checked_add(interval) {
            Some(next) => now = next,
            None => {
                warn!(frame = index, "frame clock overflowed; stopping run");
                break;
            }
        }
    }
    summary.frames = engine.frame_count().0;
    summary.library = engine.library().stations().to_vec();
    info!(
        frames = summary.frames,
        combinations = summary.combinations.len(),
        discoveries = summary.discoveries.len(),
        voided = summary.voided.len(),
        library = summary.library.len(),
        "run finished"
    );
    summary
}
