//! strip-fx demo
//!
//! Previews a layered show in the terminal: a sliding rainbow wipe with a
//! particle fountain on top. Pass a settings JSON path as the first argument
//! to override the strip defaults.

use std::io;
use std::thread;
use std::time::Duration;

use strip_fx::controller::AnsiSink;
use strip_fx::effects::{ColorWipe, Fill, Slide};
use strip_fx::physics::{
    BoxedBehavior, Decay, Emitter, Lifetime, Particle, PhysicsBody, PhysicsEngine, SpawnRanges,
};
use strip_fx::{Color, Controller, MergeMode, Result, StripSettings};

/// How long the preview runs before the stop command is sent
const DEMO_SECONDS: u64 = 20;

fn fountain(pixel_count: usize) -> Result<PhysicsEngine> {
    let center = pixel_count as f64 / 2.0;
    let fade: Vec<BoxedBehavior> = vec![Box::new(Decay::new(0.4)?), Box::new(Lifetime::new(1.5)?)];
    let spark = Particle::new(
        Box::new(Fill::solid(Color::WHITE)),
        PhysicsBody::random(SpawnRanges::at(0.0, 0.0).velocity(-30.0, 30.0), None)?,
        0.8,
    )?
    .with_behaviors(fade);

    let source = Particle::new(
        Box::new(Fill::solid(Color::TRANSPARENT)),
        PhysicsBody::new(center, 0.0, 0.0, 1.0)?,
        0.0,
    )?
    .with_behaviors(vec![Box::new(Emitter::new(spark, 12.0)?) as BoxedBehavior]);

    Ok(PhysicsEngine::new(vec![source]))
}

fn run() -> Result<()> {
    let settings = match std::env::args().nth(1) {
        Some(path) => StripSettings::load(path)?,
        None => {
            log::info!("Using default settings");
            StripSettings::default()
        }
    };

    let mut controller = Controller::from_settings(&settings)?;
    controller.set_effect(Box::new(Slide::new(
        Box::new(ColorWipe::new(Box::new(Fill::rainbow()), 10.0)?),
        10.0,
    )?));
    controller.add_layer();
    controller.set_effect(Box::new(fountain(settings.pixel_count)?));

    let handle = controller.handle();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(DEMO_SECONDS / 2));
        if handle.set_merge_mode(MergeMode::Add).is_err() {
            return;
        }
        thread::sleep(Duration::from_secs(DEMO_SECONDS / 2));
        if let Err(e) = handle.stop() {
            log::warn!("Could not stop the demo: {e}");
        }
    });

    let mut sink = AnsiSink::new(io::stdout(), settings.pixel_count);
    controller.run(&mut sink)
}

fn main() {
    env_logger::init();
    log::info!("strip-fx demo starting...");

    if let Err(e) = run() {
        log::error!("Demo failed: {e}");
        std::process::exit(1);
    }
}
