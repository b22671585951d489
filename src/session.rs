//! Screen sessions
//!
//! A session owns the shared state of one active screen and wires the
//! platform contracts into it:
//! - resume/pause: sensor registration, feedback devices
//! - surface created/changed/destroyed: bounds and the update loop
//!
//! A session is built on activation and dropped on deactivation; dropping
//! it stops its update loop.

use std::sync::Arc;

use glam::Vec2;

use crate::clock::Clock;
use crate::error::Result;
use crate::feedback::{Haptics, OneShot};
use crate::input::{
    AccelDisplay, DisplayReading, SensorListener, SensorSource, SensorStatus, TiltInput,
    TouchAction, TouchEvent,
};
use crate::settings::Settings;
use crate::sim::{BallModel, BallSnapshot, BubbleModel, BubbleSnapshot};
use crate::update_loop::{Renderer, Simulation, UpdateLoop};

type BoxedSource = Box<dyn SensorSource + Send>;

/// Surface sizes of zero mean the surface went away
fn is_teardown_size(width: f32, height: f32) -> bool {
    width <= 0.0 && height <= 0.0
}

/// Register `listener`, or unregister again if the sensor is missing
fn register(
    mut source: BoxedSource,
    listener: Arc<dyn SensorListener>,
) -> (SensorStatus, Option<BoxedSource>) {
    if source.register(listener) {
        (SensorStatus::Active, Some(source))
    } else {
        source.unregister();
        log::warn!("No accelerometer on this device, input stays neutral");
        (SensorStatus::Unsupported, None)
    }
}

/// Start a fresh loop, replacing (and stopping) any previous one
fn restart_loop<S, R>(
    slot: &mut Option<UpdateLoop>,
    sim: &Arc<S>,
    renderer: R,
    clock: &Arc<dyn Clock>,
    settings: &Settings,
) -> Result<()>
where
    S: Simulation,
    R: Renderer<S::Snapshot>,
{
    if let Some(mut old) = slot.take() {
        old.stop();
    }
    *slot = Some(UpdateLoop::start(
        Arc::clone(sim),
        renderer,
        Arc::clone(clock),
        settings.update_loop.cadence(),
    )?);
    Ok(())
}

/// The bouncing ball screen: tilt drives the ball, bounces buzz.
pub struct BallSession {
    settings: Settings,
    clock: Arc<dyn Clock>,
    model: Arc<BallModel>,
    tilt: Option<Arc<TiltInput>>,
    source: Option<BoxedSource>,
    update_loop: Option<UpdateLoop>,
}

impl BallSession {
    pub fn new(settings: Settings, clock: Arc<dyn Clock>) -> Self {
        Self {
            model: Arc::new(BallModel::new(settings.ball)),
            settings,
            clock,
            tilt: None,
            source: None,
            update_loop: None,
        }
    }

    pub fn model(&self) -> &Arc<BallModel> {
        &self.model
    }

    /// Register the tilt listener and attach the haptic device
    pub fn resume(&mut self, source: BoxedSource, haptics: Option<Arc<dyn Haptics>>) -> SensorStatus {
        self.detach_input();

        let tilt = Arc::new(TiltInput::new(
            Arc::clone(&self.model),
            Arc::clone(&self.clock),
            self.settings.input.tilt_throttle_ms,
        ));
        let (status, source) = register(source, tilt.clone());
        match status {
            SensorStatus::Active => {
                self.tilt = Some(tilt);
                self.source = source;
            }
            SensorStatus::Unsupported => {
                tilt.detach();
                self.model.set_forcing(Vec2::ZERO);
            }
        }

        self.model.set_haptics(haptics);
        status
    }

    /// Detach haptics and input, and reset forcing to neutral
    pub fn pause(&mut self) {
        self.model.set_haptics(None);
        self.detach_input();
        self.model.set_forcing(Vec2::ZERO);
    }

    fn detach_input(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.unregister();
        }
        if let Some(tilt) = self.tilt.take() {
            tilt.detach();
        }
    }

    pub fn surface_created<R: Renderer<BallSnapshot>>(&mut self, renderer: R) -> Result<()> {
        restart_loop(&mut self.update_loop, &self.model, renderer, &self.clock, &self.settings)
    }

    pub fn surface_changed(&mut self, width: f32, height: f32) {
        if is_teardown_size(width, height) {
            self.surface_destroyed();
        } else {
            self.model.set_bounds(width, height);
        }
    }

    pub fn surface_destroyed(&mut self) {
        self.model.set_bounds(0.0, 0.0);
        if let Some(mut update_loop) = self.update_loop.take() {
            update_loop.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.update_loop.as_ref().is_some_and(UpdateLoop::is_running)
    }

    /// Drop the ball at `(x, y)` with zero velocity
    pub fn place_ball(&self, x: f32, y: f32) {
        self.model.set_position(x, y);
    }
}

/// The bubbles screen: taps create bubbles that grow and pop.
pub struct BubbleSession<C: OneShot> {
    settings: Settings,
    clock: Arc<dyn Clock>,
    model: Arc<BubbleModel<C>>,
    update_loop: Option<UpdateLoop>,
}

impl<C: OneShot> BubbleSession<C> {
    pub fn new(settings: Settings, clock: Arc<dyn Clock>) -> Self {
        Self {
            model: Arc::new(BubbleModel::new(settings.bubbles)),
            settings,
            clock,
            update_loop: None,
        }
    }

    pub fn model(&self) -> &Arc<BubbleModel<C>> {
        &self.model
    }

    /// Fill the pop pool (at most `bubbles.pool_size` clips are kept)
    pub fn resume(&mut self, clips: impl IntoIterator<Item = C>) {
        let mut clips: Vec<C> = clips.into_iter().collect();
        let keep = clips.len().min(self.settings.bubbles.pool_size);
        for clip in clips.split_off(keep) {
            clip.discard();
        }
        self.model.pops().open(clips);
    }

    /// Tear down the pop pool; clips still playing get discarded when they finish
    pub fn pause(&mut self) {
        self.model.pops().close();
    }

    /// Only a press creates a bubble. Returns true if the event was consumed.
    pub fn touch(&self, event: TouchEvent) -> bool {
        match event.action {
            TouchAction::Press => {
                self.model.add_bubble(event.x, event.y);
                true
            }
            TouchAction::Move | TouchAction::Release => false,
        }
    }

    pub fn surface_created<R: Renderer<BubbleSnapshot>>(&mut self, renderer: R) -> Result<()> {
        restart_loop(&mut self.update_loop, &self.model, renderer, &self.clock, &self.settings)
    }

    pub fn surface_changed(&mut self, width: f32, height: f32) {
        if is_teardown_size(width, height) {
            self.surface_destroyed();
        } else {
            self.model.set_bounds(width, height);
        }
    }

    pub fn surface_destroyed(&mut self) {
        self.model.set_bounds(0.0, 0.0);
        if let Some(mut update_loop) = self.update_loop.take() {
            update_loop.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.update_loop.as_ref().is_some_and(UpdateLoop::is_running)
    }
}

/// The sensor display screen: throttled readings plus calibration.
pub struct AccelSession {
    display: Arc<AccelDisplay>,
    source: Option<BoxedSource>,
}

impl AccelSession {
    pub fn new(settings: Settings, clock: Arc<dyn Clock>) -> Self {
        Self {
            display: Arc::new(AccelDisplay::new(clock, settings.input.display_throttle_ms)),
            source: None,
        }
    }

    pub fn resume(&mut self, source: BoxedSource) -> SensorStatus {
        self.display.attach();
        let (status, source) = register(source, self.display.clone());
        if status == SensorStatus::Unsupported {
            self.display.detach();
        }
        self.source = source;
        status
    }

    /// Unregister and forget the calibration
    pub fn pause(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.unregister();
        }
        self.display.detach();
        self.display.reset_calibration();
    }

    pub fn calibrate(&self) {
        self.display.calibrate();
    }

    pub fn display(&self) -> DisplayReading {
        self.display.reading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::feedback::testing::{ClipEvent, ClipRig};
    use crate::input::SensorReading;
    use std::sync::Mutex;

    type Slot = Arc<Mutex<Option<Arc<dyn SensorListener>>>>;

    /// Sensor that lets the test push readings to whoever is registered
    struct FakeSensor {
        supported: bool,
        slot: Slot,
    }

    impl SensorSource for FakeSensor {
        fn register(&mut self, listener: Arc<dyn SensorListener>) -> bool {
            if self.supported {
                *self.slot.lock().unwrap() = Some(listener);
            }
            self.supported
        }

        fn unregister(&mut self) {
            *self.slot.lock().unwrap() = None;
        }
    }

    fn sensor(supported: bool) -> (Box<FakeSensor>, Slot) {
        let slot = Slot::default();
        (
            Box::new(FakeSensor {
                supported,
                slot: slot.clone(),
            }),
            slot,
        )
    }

    fn push(slot: &Slot, reading: SensorReading) {
        let listener = slot.lock().unwrap().clone();
        if let Some(listener) = listener {
            listener.on_sensor_changed(&reading);
        }
    }

    #[test]
    fn test_ball_pause_neutralises_forcing() {
        let clock = Arc::new(ManualClock::new(0));
        let mut session = BallSession::new(Settings::default(), clock.clone());
        let (source, slot) = sensor(true);
        assert_eq!(session.resume(source, None), SensorStatus::Active);

        push(&slot, SensorReading::new(2.0, -4.0, 9.0));
        assert_eq!(session.model().state().forcing, Vec2::new(2.0, 4.0));

        // A listener reference captured before pause must not leak through
        let stale = slot.lock().unwrap().clone().unwrap();
        session.pause();
        assert!(slot.lock().unwrap().is_none());
        assert_eq!(session.model().state().forcing, Vec2::ZERO);

        clock.set(500);
        stale.on_sensor_changed(&SensorReading::new(7.0, 7.0, 0.0));
        assert_eq!(session.model().state().forcing, Vec2::ZERO);
    }

    #[test]
    fn test_ball_pause_during_sensor_burst() {
        let clock = Arc::new(ManualClock::new(0));
        let mut settings = Settings::default();
        settings.input.tilt_throttle_ms = 1;
        let mut session = BallSession::new(settings, clock.clone());
        let (source, slot) = sensor(true);
        assert_eq!(session.resume(source, None), SensorStatus::Active);

        // The event thread keeps delivering through its own reference
        let listener = slot.lock().unwrap().clone().unwrap();
        let done = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let burst = {
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                while !done.load(std::sync::atomic::Ordering::Acquire) {
                    clock.advance(1);
                    listener.on_sensor_changed(&SensorReading::new(7.0, -7.0, 0.0));
                }
            })
        };
        while session.model().state().forcing == Vec2::ZERO {
            std::thread::yield_now();
        }

        session.pause();
        assert_eq!(session.model().state().forcing, Vec2::ZERO);
        done.store(true, std::sync::atomic::Ordering::Release);
        burst.join().unwrap();
        assert_eq!(session.model().state().forcing, Vec2::ZERO);
    }

    #[test]
    fn test_ball_unsupported_sensor() {
        let clock = Arc::new(ManualClock::new(0));
        let mut session = BallSession::new(Settings::default(), clock);
        let (source, slot) = sensor(false);
        assert_eq!(session.resume(source, None), SensorStatus::Unsupported);
        assert!(slot.lock().unwrap().is_none());
        assert_eq!(session.model().state().forcing, Vec2::ZERO);
    }

    #[test]
    fn test_ball_zero_surface_stops_loop() {
        let clock = Arc::new(ManualClock::new(0));
        let mut session = BallSession::new(Settings::default(), clock);
        session.surface_created(|_: &BallSnapshot| {}).unwrap();
        session.surface_changed(300.0, 500.0);
        assert!(session.is_running());
        assert_eq!(session.model().state().bounds.width, 300.0);

        session.surface_changed(0.0, 0.0);
        assert!(!session.is_running());
        assert!(!session.model().state().bounds.is_valid());
    }

    #[test]
    fn test_bubble_touch_only_press() {
        let clock = Arc::new(ManualClock::new(0));
        let session: BubbleSession<crate::feedback::testing::TestClip> =
            BubbleSession::new(Settings::default(), clock);

        assert!(session.touch(TouchEvent::press(10.0, 10.0)));
        assert!(!session.touch(TouchEvent {
            action: TouchAction::Move,
            x: 20.0,
            y: 20.0
        }));
        assert!(!session.touch(TouchEvent {
            action: TouchAction::Release,
            x: 20.0,
            y: 20.0
        }));
        assert_eq!(session.model().len(), 1);
    }

    #[test]
    fn test_bubble_resume_caps_pool() {
        let rig = ClipRig::new();
        let clock = Arc::new(ManualClock::new(0));
        let mut session = BubbleSession::new(Settings::default(), clock);
        session.resume(rig.clips(6));
        assert_eq!(session.model().pops().available(), 4);
        assert_eq!(
            rig.events(),
            vec![ClipEvent::Discarded(4), ClipEvent::Discarded(5)]
        );

        session.pause();
        assert!(!session.model().pops().is_running());
        assert_eq!(session.model().pops().available(), 0);
    }

    #[test]
    fn test_accel_session_calibration_reset_on_pause() {
        let clock = Arc::new(ManualClock::new(0));
        let mut session = AccelSession::new(Settings::default(), clock.clone());
        let (source, slot) = sensor(true);
        assert_eq!(session.resume(source), SensorStatus::Active);

        push(&slot, SensorReading::new(0.0, 0.0, 9.5));
        session.calibrate();
        assert_eq!(session.display().values.z, 0.0);

        session.pause();
        assert_eq!(session.display().offset, glam::Vec3::ZERO);
        assert_eq!(session.display().values.z, 9.5);

        // Readings after pause are ignored
        clock.set(1_000);
        push(&slot, SensorReading::new(1.0, 1.0, 1.0));
        assert_eq!(session.display().values.z, 9.5);
    }

    #[test]
    fn test_accel_session_unsupported() {
        let clock = Arc::new(ManualClock::new(0));
        let mut session = AccelSession::new(Settings::default(), clock);
        let (source, _slot) = sensor(false);
        assert_eq!(session.resume(source), SensorStatus::Unsupported);
    }
}
