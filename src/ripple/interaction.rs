//! Interaction state machine for the ripple view
//!
//! Decides when a new ripple starts and where it comes from:
//! - `AutoRepeat` (idle): a repeating timer restarts the ripple at the view centre
//! - `UserDriven` (pressed): a press restarts it at the press point and stops
//!   the timer until a short delay after the press ends
//!
//! The host forwards pointer events and calls [`RippleController::advance`]
//! with its clock every frame; timers are dispatched from there.

use glam::Vec2;

use super::field::RippleParams;
use super::timeline::ElapsedTime;
use super::timer::{TimerId, Timers};
use crate::settings::RippleSettings;

/// Counter whose increment means "start a new ripple now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RippleTrigger(u64);

impl RippleTrigger {
    pub fn value(self) -> u64 {
        self.0
    }

    fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// Who is starting ripples right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    /// Idle: the repeating timer fires ripples from the centre
    #[default]
    AutoRepeat,
    /// Pressed: ripples come from the user's press, timer stopped
    UserDriven,
}

/// Press gesture events in view-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressEvent {
    Began(Vec2),
    Changed(Vec2),
    Ended,
    Cancelled,
}

/// What the renderer needs for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RippleFrame {
    pub origin: Vec2,
    pub elapsed: f32,
    pub trigger: RippleTrigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerAction {
    AutoRepeat,
    Resume,
}

/// Owns the ripple trigger, its origin and the timers that drive them
#[derive(Debug, Clone)]
pub struct RippleController {
    settings: RippleSettings,
    size: Vec2,
    origin: Vec2,
    trigger: RippleTrigger,
    elapsed: ElapsedTime,
    mode: InteractionMode,
    /// Pointer currently held down
    pressing: bool,
    mounted: bool,
    timers: Timers<TimerAction>,
    repeat_timer: Option<TimerId>,
    resume_timer: Option<TimerId>,
}

impl RippleController {
    pub fn new(width: f32, height: f32, settings: RippleSettings) -> Self {
        let elapsed = ElapsedTime::new(settings.ripple_duration);
        Self {
            settings,
            size: Vec2::new(width, height),
            origin: Vec2::ZERO,
            trigger: RippleTrigger::default(),
            elapsed,
            mode: InteractionMode::AutoRepeat,
            pressing: false,
            mounted: false,
            timers: Timers::new(),
            repeat_timer: None,
            resume_timer: None,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn trigger(&self) -> RippleTrigger {
        self.trigger
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_pressing(&self) -> bool {
        self.pressing
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn center(&self) -> Vec2 {
        self.size * 0.5
    }

    pub fn settings(&self) -> &RippleSettings {
        &self.settings
    }

    /// Whether the auto-repeat timer is armed
    pub fn auto_repeat_armed(&self) -> bool {
        self.repeat_timer.is_some_and(|id| self.timers.is_live(id))
    }

    /// Whether a return to auto-repeat is pending
    pub fn resume_pending(&self) -> bool {
        self.resume_timer.is_some_and(|id| self.timers.is_live(id))
    }

    /// Timers that can still fire
    pub fn live_timer_count(&self) -> usize {
        self.timers.live_count()
    }

    /// Field parameters for the current view size
    pub fn params(&self) -> RippleParams {
        self.settings.params_for(self.size.x, self.size.y)
    }

    /// Snapshot for rendering at host time `now`
    pub fn frame(&self, now: f64) -> RippleFrame {
        RippleFrame {
            origin: self.origin,
            elapsed: self.elapsed.value_at(now),
            trigger: self.trigger,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Attach the view: go idle and fire the first ripple from the centre
    pub fn mount(&mut self, now: f64) {
        if self.mounted {
            log::debug!("mount ignored: already mounted");
            return;
        }
        self.mounted = true;
        log::info!("Ripple view mounted at {}x{}", self.size.x, self.size.y);
        self.enter_auto_repeat(now);
        self.fire(self.center(), now);
    }

    /// Detach the view; every pending timer is dropped
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.pressing = false;
        self.timers.cancel_all();
        self.repeat_timer = None;
        self.resume_timer = None;
        log::info!("Ripple view unmounted after {} ripples", self.trigger.value());
    }

    /// Track a new view size; later auto-repeat ripples use the new centre
    pub fn resize(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width, height);
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Start a new ripple at `origin`
    fn fire(&mut self, origin: Vec2, now: f64) {
        // Origin first: whoever sees the new trigger must see its origin
        self.origin = origin;
        self.trigger.bump();
        self.elapsed.restart(now);
        log::debug!(
            "ripple #{} from ({:.1}, {:.1})",
            self.trigger.value(),
            origin.x,
            origin.y
        );
    }

    fn stop_repeat_timer(&mut self) {
        if let Some(id) = self.repeat_timer.take() {
            self.timers.cancel(id);
        }
    }

    fn stop_resume_timer(&mut self) {
        if let Some(id) = self.resume_timer.take() {
            self.timers.cancel(id);
        }
    }

    /// Go idle and (re)arm the repeating timer
    ///
    /// Any armed timer is cancelled before the new one is scheduled, so
    /// calling this repeatedly never leaves more than one running.
    pub fn enter_auto_repeat(&mut self, now: f64) {
        if !self.mounted {
            return;
        }
        self.stop_resume_timer();
        self.stop_repeat_timer();
        self.mode = InteractionMode::AutoRepeat;
        self.repeat_timer = Some(self.timers.schedule_repeating(
            now,
            self.settings.repeat_interval,
            TimerAction::AutoRepeat,
        ));
    }

    /// Hand control to the user and stop the timer
    fn enter_user_driven(&mut self) {
        self.stop_repeat_timer();
        self.stop_resume_timer();
        self.mode = InteractionMode::UserDriven;
    }

    /// Feed one press gesture event
    pub fn press(&mut self, event: PressEvent, now: f64) {
        if !self.mounted {
            log::debug!("press ignored: not mounted");
            return;
        }
        match event {
            PressEvent::Began(point) => {
                self.pressing = true;
                self.enter_user_driven();
                self.fire(point, now);
            }
            PressEvent::Changed(_) => {}
            PressEvent::Ended | PressEvent::Cancelled => {
                if !self.pressing {
                    log::debug!("{:?} without a press, ignored", event);
                    return;
                }
                self.pressing = false;
                self.schedule_resume(now);
            }
        }
    }

    fn schedule_resume(&mut self, now: f64) {
        let delay = self.settings.resume_delay;
        if delay <= 0.0 {
            self.enter_auto_repeat(now);
            return;
        }
        self.stop_resume_timer();
        self.resume_timer = Some(self.timers.schedule_once(now, delay, TimerAction::Resume));
    }

    /// Dispatch every timer due at host time `now`
    pub fn advance(&mut self, now: f64) {
        if !self.mounted {
            return;
        }
        while let Some((id, action)) = self.timers.pop_due(now) {
            self.on_timer(id, action, now);
        }
    }

    fn on_timer(&mut self, id: TimerId, action: TimerAction, now: f64) {
        if !self.mounted {
            return;
        }
        match action {
            TimerAction::AutoRepeat => {
                if self.repeat_timer != Some(id) || self.mode != InteractionMode::AutoRepeat {
                    log::debug!("stale auto-repeat timer {:?} ignored", id);
                    return;
                }
                self.fire(self.center(), now);
            }
            TimerAction::Resume => {
                if self.resume_timer != Some(id) {
                    log::debug!("stale resume timer {:?} ignored", id);
                    return;
                }
                self.resume_timer = None;
                self.enter_auto_repeat(now);
            }
        }
    }
}
