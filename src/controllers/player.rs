// src/controllers/player.rs
//
// Timer driver: one scheduler tick per interval, handed to a surface.

use std::thread;
use tracing::{debug, info};

use super::scheduler::{PlaybackState, Scheduler, TickOutcome};

/// Whatever presents the scheduler's state, fed once per tick.
pub trait PlaybackSurface {
    /// Called after `tick` was played. The surface may steer playback
    /// (speed, stop, focus) through the scheduler.
    fn on_tick(&mut self, tick: u32, scheduler: &mut Scheduler);

    fn on_complete(&mut self, _scheduler: &Scheduler) {}
}

/// Reports each tick through `tracing`.
#[derive(Debug, Default)]
pub struct LogSurface;

impl PlaybackSurface for LogSurface {
    fn on_tick(&mut self, tick: u32, scheduler: &mut Scheduler) {
        let loaded = scheduler.registry().loaded_ids().count();
        info!(
            tick,
            tick_end = scheduler.tick_end(),
            arrows = scheduler.arrows().len(),
            loaded,
            failures = scheduler.last_failures().len(),
            "tick"
        );
        for entity in scheduler.registry().iter() {
            if let Some(color) = entity.highlight() {
                debug!(entity = entity.id(), color = color.hex(), "highlight");
            }
            let label = entity.label();
            if label.visible {
                debug!(entity = entity.id(), label = %label.text.replace('\n', " | "), "label");
            }
        }
        if let Some(position) = scheduler.focus_position() {
            debug!(lat = position.lat, lon = position.lon, "focus");
        }
    }

    fn on_complete(&mut self, scheduler: &Scheduler) {
        info!(
            ticks = scheduler.tick_end() + 1,
            traces = scheduler.traces().len(),
            "playback finished"
        );
    }
}

pub struct Player<S: PlaybackSurface> {
    scheduler: Scheduler,
    surface: S,
    wait: bool,
}

impl<S: PlaybackSurface> Player<S> {
    pub fn new(scheduler: Scheduler, surface: S) -> Self {
        Player {
            scheduler,
            surface,
            wait: true,
        }
    }

    /// Play ticks back to back instead of sleeping between them.
    pub fn without_wait(mut self) -> Self {
        self.wait = false;
        self
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Hand the current state to the surface without advancing.
    pub fn present(&mut self) {
        let shown = self.scheduler.current_tick().saturating_sub(1);
        self.surface.on_tick(shown, &mut self.scheduler);
    }

    /// Run until playback completes or something stops it.
    /// Returns the number of ticks played.
    pub fn run(&mut self) -> u32 {
        self.scheduler.start();
        let mut played = 0;

        while self.scheduler.state() == PlaybackState::Running {
            match self.scheduler.advance() {
                TickOutcome::Advanced(tick) => {
                    played += 1;
                    self.surface.on_tick(tick, &mut self.scheduler);
                    // interval is re-read each time so speed changes land on the next tick
                    if self.wait && self.scheduler.state() == PlaybackState::Running {
                        thread::sleep(self.scheduler.tick_interval());
                    }
                }
                TickOutcome::Completed => self.surface.on_complete(&self.scheduler),
            }
        }
        played
    }

    pub fn into_parts(self) -> (Scheduler, S) {
        (self.scheduler, self.surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationInstance, Effect};
    use crate::models::{GeoPosition, MapEntity};
    use crate::services::CompiledScenario;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        ticks: Vec<u32>,
        intervals: Vec<Duration>,
        completed: bool,
        stop_at: Option<u32>,
        speed_up_at: Option<u32>,
    }

    impl PlaybackSurface for Recorder {
        fn on_tick(&mut self, tick: u32, scheduler: &mut Scheduler) {
            self.ticks.push(tick);
            if self.speed_up_at == Some(tick) {
                scheduler.set_speed(4);
            }
            self.intervals.push(scheduler.tick_interval());
            if self.stop_at == Some(tick) {
                scheduler.stop();
            }
        }

        fn on_complete(&mut self, _scheduler: &Scheduler) {
            self.completed = true;
        }
    }

    fn scheduler(end: u32) -> Scheduler {
        let origin = GeoPosition::new(45.0, 5.0, 0.0);
        Scheduler::new(CompiledScenario {
            entities: vec![MapEntity::new("tru1", "truck", "truck.svg", origin)],
            containment: Vec::new(),
            animations: vec![AnimationInstance {
                start: 0,
                end,
                entity_id: "tru1".to_string(),
                entity_id2: None,
                text: None,
                effect: Effect::Move {
                    lat_from: None,
                    lon_from: None,
                    alti_from: None,
                    lat_to: 46.0,
                    lon_to: 6.0,
                    alti_to: None,
                },
            }],
        })
        .with_base_interval(Duration::from_millis(400))
    }

    #[test]
    fn test_run_to_completion() {
        let mut player = Player::new(scheduler(4), Recorder::default()).without_wait();
        assert_eq!(player.run(), 5);

        let (scheduler, recorder) = player.into_parts();
        assert_eq!(recorder.ticks, vec![0, 1, 2, 3, 4]);
        assert!(recorder.completed);
        assert_eq!(scheduler.state(), PlaybackState::Stopped);
        assert_eq!(
            scheduler.registry().get("tru1").unwrap().position(),
            GeoPosition::new(46.0, 6.0, 0.0)
        );
    }

    #[test]
    fn test_surface_can_stop_playback() {
        let recorder = Recorder {
            stop_at: Some(2),
            ..Recorder::default()
        };
        let mut player = Player::new(scheduler(10), recorder).without_wait();
        assert_eq!(player.run(), 3);
        assert!(!player.surface().completed);
        assert_eq!(player.scheduler().current_tick(), 3);

        // resumes where it stopped
        player.surface.stop_at = None;
        assert_eq!(player.run(), 8);
        assert!(player.surface().completed);
    }

    #[test]
    fn test_speed_change_applies_to_next_interval() {
        let recorder = Recorder {
            speed_up_at: Some(1),
            ..Recorder::default()
        };
        let mut player = Player::new(scheduler(2), recorder).without_wait();
        player.run();
        assert_eq!(
            player.surface().intervals,
            vec![
                Duration::from_millis(400),
                Duration::from_millis(100),
                Duration::from_millis(100)
            ]
        );
    }

    #[test]
    fn test_demo_delivers_both_parcels() {
        use crate::config::ScenarioConfig;
        use crate::models::PlanModel;
        use crate::services::PlanCompiler;

        let mut model = PlanModel::parse(
            include_str!("../../demos/logistics/domain.pddl"),
            include_str!("../../demos/logistics/problem.pddl"),
        )
        .unwrap();
        assert!(model.load_plan(include_str!("../../demos/logistics/plan.txt")).is_empty());
        let config = ScenarioConfig::from_yaml_str(include_str!("../../demos/logistics/scenario.yml")).unwrap();
        let compiled = PlanCompiler::new(&model, &config).compile().unwrap();

        let mut player = Player::new(Scheduler::new(compiled), Recorder::default()).without_wait();
        let played = player.run();
        let scheduler = player.scheduler();
        assert_eq!(played, scheduler.tick_end() + 1);
        assert!(player.surface().completed);

        let registry = scheduler.registry();
        assert_eq!(registry.loaded_ids().count(), 0);
        for (parcel, place) in [("obj1", "north"), ("obj2", "south")] {
            let at = registry.get(parcel).unwrap().position();
            let expected = registry.get(place).unwrap().position();
            assert!((at.lat - expected.lat).abs() < 1e-9, "{parcel}");
            assert!((at.lon - expected.lon).abs() < 1e-9, "{parcel}");
        }
        assert_eq!(registry.get("obj2").unwrap().texts(), &["delivered".to_string()]);
        assert!(scheduler.last_failures().is_empty());
    }

    #[test]
    fn test_present_after_seek() {
        let mut s = scheduler(10);
        s.seek(3);
        let mut player = Player::new(s, Recorder::default());
        player.present();
        assert_eq!(player.surface().ticks, vec![3]);
    }
}
