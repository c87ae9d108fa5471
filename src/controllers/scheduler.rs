// src/controllers/scheduler.rs
//
// Tick-driven playback of compiled animations.
// One tick: reset transient state, run active animations in priority
// order, refresh containment annotations, then rebuild latched views.

use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::animation::{apply, AnimationInstance, AnimationKind, AnimationState, TickContext};
use crate::errors::AnimationFailure;
use crate::models::{EntityRegistry, GeoPosition, MapEntity};
use crate::services::CompiledScenario;
use crate::views::{Arrow, DisplayOptions, Overlay, TraceSegment};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick that was just played.
    Advanced(u32),
    Completed,
}

pub struct Scheduler {
    registry: EntityRegistry,
    animations: Vec<AnimationInstance>,
    states: Vec<AnimationState>,
    initial_containment: Vec<(String, String)>,
    overlay: Overlay,

    state: PlaybackState,
    tick: u32,
    tick_end: u32,
    speed: u32,
    base_interval: Duration,
    display: DisplayOptions,
    focus: Option<String>,
    last_failures: Vec<AnimationFailure>,
}

impl Scheduler {
    pub fn new(compiled: CompiledScenario) -> Self {
        let tick_end = compiled.animations.iter().map(|a| a.end).max().unwrap_or(0);
        let mut scheduler = Scheduler {
            registry: EntityRegistry::new(compiled.entities),
            states: vec![AnimationState::Idle; compiled.animations.len()],
            animations: compiled.animations,
            initial_containment: compiled.containment,
            overlay: Overlay::new(),
            state: PlaybackState::Stopped,
            tick: 0,
            tick_end,
            speed: 1,
            base_interval: DEFAULT_TICK_INTERVAL,
            display: DisplayOptions::default(),
            focus: None,
            last_failures: Vec::new(),
        };
        scheduler.restore_initial();
        scheduler
    }

    pub fn with_base_interval(mut self, interval: Duration) -> Self {
        self.base_interval = interval;
        self
    }

    pub fn with_display_options(mut self, options: DisplayOptions) -> Self {
        self.display = options;
        self
    }

    /************************* Playback control ********************/

    pub fn start(&mut self) {
        if self.state != PlaybackState::Running {
            info!(tick = self.tick, "playback started");
            self.state = PlaybackState::Running;
        }
    }

    pub fn stop(&mut self) {
        if self.state != PlaybackState::Stopped {
            info!(tick = self.tick, "playback stopped");
            self.state = PlaybackState::Stopped;
        }
    }

    pub fn advance(&mut self) -> TickOutcome {
        self.step(true)
    }

    /// Replay from tick 0 up to and including `target`.
    /// The running or stopped state from before the seek is kept.
    pub fn seek(&mut self, target: u32) {
        let resume = self.state;
        self.restore_initial();

        let mut completed = false;
        while self.tick < target {
            if self.step(false) == TickOutcome::Completed {
                completed = true;
                break;
            }
        }
        if completed || self.step(true) == TickOutcome::Completed {
            self.refresh_views();
        }

        self.state = resume;
        info!(target, tick = self.tick, "seek done");
    }

    pub fn set_speed(&mut self, multiplier: u32) {
        self.speed = multiplier.max(1);
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn tick_interval(&self) -> Duration {
        self.base_interval / self.speed
    }

    /************************* Display ********************/

    pub fn set_display_options(&mut self, options: DisplayOptions) {
        self.display = options;
        self.refresh_all_labels();
    }

    pub fn toggle_show_name(&mut self) {
        self.display.show_name = !self.display.show_name;
        self.refresh_all_labels();
    }

    pub fn toggle_show_position(&mut self) {
        self.display.show_position = !self.display.show_position;
        self.refresh_all_labels();
    }

    pub fn display_options(&self) -> DisplayOptions {
        self.display
    }

    pub fn set_focus(&mut self, entity: Option<&str>) {
        self.focus = entity.filter(|id| self.registry.contains(id)).map(str::to_string);
    }

    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    pub fn focus_position(&self) -> Option<GeoPosition> {
        self.focus
            .as_deref()
            .and_then(|id| self.registry.get(id))
            .map(MapEntity::position)
    }

    /************************* Accessors ********************/

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_tick(&self) -> u32 {
        self.tick
    }

    pub fn tick_end(&self) -> u32 {
        self.tick_end
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn animations(&self) -> &[AnimationInstance] {
        &self.animations
    }

    pub fn arrows(&self) -> &[Arrow] {
        self.overlay.arrows()
    }

    pub fn traces(&self) -> &[TraceSegment] {
        self.overlay.traces()
    }

    pub fn last_failures(&self) -> &[AnimationFailure] {
        &self.last_failures
    }

    /************************* Tick internals ********************/

    fn restore_initial(&mut self) {
        for entity in self.registry.iter_mut() {
            entity.reset();
        }
        self.registry.clear_containment();
        for (container, loaded) in &self.initial_containment {
            self.registry.load(container, loaded);
        }
        self.overlay.clear();
        self.last_failures.clear();
        self.states.fill(AnimationState::Idle);
        self.tick = 0;
    }

    fn step(&mut self, full: bool) -> TickOutcome {
        let tick = self.tick;
        if tick > self.tick_end {
            if self.state == PlaybackState::Running {
                info!(tick_end = self.tick_end, "playback complete");
            }
            self.state = PlaybackState::Stopped;
            return TickOutcome::Completed;
        }

        self.reset_phase(tick);
        self.run_active(tick);
        self.refresh_containment();
        if full {
            self.refresh_views();
        }

        self.tick += 1;
        TickOutcome::Advanced(tick)
    }

    fn reset_phase(&mut self, tick: u32) {
        self.overlay.clear_arrows();
        self.last_failures.clear();
        for entity in self.registry.iter_mut() {
            entity.reset_text();
        }

        let ended_last_tick = |kind: AnimationKind| {
            self.animations
                .iter()
                .any(|a| a.kind() == kind && a.end + 1 == tick)
        };
        let reset_icon = ended_last_tick(AnimationKind::ChangeIcon);
        let reset_highlight = ended_last_tick(AnimationKind::Highlight);
        let reset_background = ended_last_tick(AnimationKind::Background);

        for entity in self.registry.iter_mut() {
            if reset_icon {
                entity.reset_icon();
            }
            if reset_highlight {
                entity.reset_highlight();
            }
            if reset_background {
                entity.reset_background();
            }
        }
    }

    fn run_active(&mut self, tick: u32) {
        let mut active: Vec<usize> = (0..self.animations.len())
            .filter(|&i| self.animations[i].is_active_at(tick))
            .collect();
        // stable: equal priorities keep compile order
        active.sort_by_key(|&i| self.animations[i].priority());

        for i in active {
            let anim = &self.animations[i];
            if self.registry.is_loaded(&anim.entity_id, None) {
                let failure = AnimationFailure::Frozen {
                    kind: anim.kind().tag(),
                    entity: anim.entity_id.clone(),
                };
                debug!(tick, %failure, "skipping animation");
                self.last_failures.push(failure);
                continue;
            }

            let mut ctx = TickContext {
                registry: &mut self.registry,
                overlay: &mut self.overlay,
                tick,
            };
            if let Err(failure) = apply(anim, &mut self.states[i], &mut ctx) {
                warn!(tick, %failure, "animation failed");
                self.last_failures.push(failure);
            }
        }
    }

    fn refresh_containment(&mut self) {
        let stock: Vec<(String, String)> = self
            .registry
            .containers()
            .map(|(container, loaded)| {
                let names: Vec<&str> = loaded
                    .iter()
                    .map(|id| self.registry.get(id).map(MapEntity::name).unwrap_or(id.as_str()))
                    .collect();
                (container.to_string(), format!("Stock: {}", names.join(", ")))
            })
            .collect();

        for (container, line) in stock {
            if let Some(entity) = self.registry.get_mut(&container) {
                entity.append_text(&line);
            }
        }
    }

    fn refresh_views(&mut self) {
        let loaded: HashSet<String> = self.registry.loaded_ids().map(str::to_string).collect();
        for entity in self.registry.iter_mut() {
            if entity.needs_category_refresh() {
                entity.refresh_category();
            }
            if entity.needs_label_refresh() {
                let hidden = loaded.contains(entity.id());
                entity.refresh_label(self.display, hidden);
            }
        }

        if let Some(id) = &self.focus {
            if !self.registry.contains(id) {
                debug!(entity = %id, "focus entity gone, clearing focus");
                self.focus = None;
            }
        }
    }

    fn refresh_all_labels(&mut self) {
        let loaded: HashSet<String> = self.registry.loaded_ids().map(str::to_string).collect();
        for entity in self.registry.iter_mut() {
            let hidden = loaded.contains(entity.id());
            entity.refresh_label(self.display, hidden);
        }
    }
}
