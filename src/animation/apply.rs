// src/animation/apply.rs
//
// Per-tick execution of one animation instance against the registry.
// Each kind is a pure function of the instance, its captured state,
// the current tick and the entities it touches.

use crate::animation::{AnimationInstance, AnimationKind, Effect};
use crate::errors::AnimationFailure;
use crate::models::{EntityRegistry, GeoPosition, MapEntity};
use crate::utilities::geodesy::{azimuth, destination_point, haversine_distance, interpolate, progress};
use crate::views::Overlay;

/// What an animation captured on its first run. Reset on seek.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AnimationState {
    #[default]
    Idle,
    Path { from: GeoPosition, to: GeoPosition },
    Orbit { center: GeoPosition, origin_bearing: f64 },
    Scalar { start: f64 },
}

pub struct TickContext<'a> {
    pub registry: &'a mut EntityRegistry,
    pub overlay: &'a mut Overlay,
    pub tick: u32,
}

fn position_of(
    registry: &EntityRegistry,
    kind: AnimationKind,
    id: &str,
) -> Result<GeoPosition, AnimationFailure> {
    registry
        .get(id)
        .map(|e| e.position())
        .ok_or_else(|| AnimationFailure::MissingEntity {
            kind: kind.tag(),
            entity: id.to_string(),
        })
}

/// Both entities of a binary animation, which must exist and differ.
fn pair<'i>(
    anim: &'i AnimationInstance,
    registry: &EntityRegistry,
) -> Result<(&'i str, &'i str), AnimationFailure> {
    let kind = anim.kind().tag();
    let first = anim.entity_id.as_str();
    let second = anim.entity_id2.as_deref().unwrap_or_default();

    for id in [first, second] {
        if !registry.contains(id) {
            return Err(AnimationFailure::MissingEntity {
                kind,
                entity: id.to_string(),
            });
        }
    }
    if first == second {
        return Err(AnimationFailure::SelfReference {
            kind,
            entity: first.to_string(),
        });
    }
    Ok((first, second))
}

fn path_position(anim: &AnimationInstance, from: GeoPosition, to: GeoPosition, tick: u32) -> GeoPosition {
    if anim.start == anim.end || tick >= anim.end || haversine_distance(&from, &to) == 0.0 {
        return to;
    }
    from.lerp(&to, progress(anim.start, anim.end, tick))
}

fn move_with_trace(ctx: &mut TickContext, id: &str, next: GeoPosition) {
    if let Some(entity) = ctx.registry.get_mut(id) {
        let previous = entity.position();
        entity.move_to(next);
        ctx.overlay.add_trace(id, previous, next);
    }
}

fn scalar_start(state: &mut AnimationState, anim: &AnimationInstance, tick: u32, current: f64, end: f64) -> f64 {
    if tick == anim.start {
        *state = AnimationState::Scalar { start: current };
    }
    match state {
        AnimationState::Scalar { start } => *start,
        _ => end,
    }
}

pub fn apply(
    anim: &AnimationInstance,
    state: &mut AnimationState,
    ctx: &mut TickContext,
) -> Result<(), AnimationFailure> {
    let kind = anim.kind();
    let tick = ctx.tick;
    let target = anim.entity_id.as_str();
    let boundary = tick == anim.start || tick == anim.end;

    match &anim.effect {
        Effect::Move {
            lat_from,
            lon_from,
            alti_from,
            lat_to,
            lon_to,
            alti_to,
        } => {
            let current = position_of(ctx.registry, kind, target)?;
            if *state == AnimationState::Idle {
                let (lat, lon) = match (lat_from, lon_from) {
                    (Some(lat), Some(lon)) => (*lat, *lon),
                    _ => (current.lat, current.lon),
                };
                *state = AnimationState::Path {
                    from: GeoPosition::new(lat, lon, alti_from.unwrap_or(current.alt)),
                    to: GeoPosition::new(*lat_to, *lon_to, alti_to.unwrap_or(current.alt)),
                };
            }
            if let AnimationState::Path { from, to } = *state {
                move_with_trace(ctx, target, path_position(anim, from, to, tick));
            }
        }

        Effect::MoveTo { distance } => {
            let (mover, destination) = pair(anim, ctx.registry)?;
            if *state == AnimationState::Idle {
                let from = position_of(ctx.registry, kind, mover)?;
                let anchor = position_of(ctx.registry, kind, destination)?;
                let to = match distance {
                    Some(distance) => {
                        let bearing = azimuth(anchor.lat, anchor.lon, from.lat, from.lon);
                        let (lat, lon) = destination_point(anchor.lat, anchor.lon, bearing, *distance);
                        GeoPosition::new(lat, lon, anchor.alt)
                    }
                    None => anchor,
                };
                *state = AnimationState::Path { from, to };
            }
            if let AnimationState::Path { from, to } = *state {
                move_with_trace(ctx, mover, path_position(anim, from, to, tick));
            }
        }

        Effect::Around { distance, angle } => {
            let (mover, center_id) = pair(anim, ctx.registry)?;
            let current = position_of(ctx.registry, kind, mover)?;
            if *state == AnimationState::Idle {
                let center = position_of(ctx.registry, kind, center_id)?;
                *state = AnimationState::Orbit {
                    center,
                    origin_bearing: azimuth(center.lat, center.lon, current.lat, current.lon),
                };
            }
            if let AnimationState::Orbit {
                center,
                origin_bearing,
            } = *state
            {
                let bearing = interpolate(anim.start, anim.end, tick, origin_bearing, origin_bearing + angle);
                let (lat, lon) = destination_point(center.lat, center.lon, bearing, *distance);
                move_with_trace(ctx, mover, GeoPosition::new(lat, lon, current.alt));
            }
        }

        Effect::AddText { text } => {
            entity_mut(ctx.registry, kind, target)?.append_text(text);
        }

        Effect::Arrow => {
            let (from, to) = pair(anim, ctx.registry)?;
            ctx.overlay.add_arrow(from, to);
        }

        // a value landing after the start tick (the entity was frozen then) still needs a rebuild
        Effect::ChangeIcon { image } => {
            let entity = entity_mut(ctx.registry, kind, target)?;
            let changed = entity.icon() != image.as_str();
            entity.set_icon(image, boundary || changed);
        }

        Effect::Background { image } => {
            let entity = entity_mut(ctx.registry, kind, target)?;
            let changed = entity.background() != Some(image.as_str());
            entity.set_background(Some(image.clone()), boundary || changed);
        }

        Effect::Highlight { color } => {
            let entity = entity_mut(ctx.registry, kind, target)?;
            let changed = entity.highlight() != Some(*color);
            entity.set_highlight(Some(*color), boundary || changed);
        }

        Effect::Size { size } => {
            let entity = entity_mut(ctx.registry, kind, target)?;
            let start = scalar_start(state, anim, tick, entity.size(), *size);
            entity.set_size(interpolate(anim.start, anim.end, tick, start, *size), true);
        }

        Effect::Opacity { opacity } => {
            let entity = entity_mut(ctx.registry, kind, target)?;
            let start = scalar_start(state, anim, tick, entity.opacity(), *opacity);
            entity.set_opacity(interpolate(anim.start, anim.end, tick, start, *opacity), true);
        }

        Effect::Rotate { angle } => {
            let entity = entity_mut(ctx.registry, kind, target)?;
            let start = scalar_start(state, anim, tick, entity.angle(), *angle);
            entity.set_angle(interpolate(anim.start, anim.end, tick, start, *angle), true);
        }

        Effect::Load => {
            let (container, loaded) = pair(anim, ctx.registry)?;
            if let Some(other) = ctx.registry.container_of(loaded) {
                if other != container {
                    return Err(AnimationFailure::AlreadyLoaded {
                        kind: kind.tag(),
                        entity: loaded.to_string(),
                        container: other.to_string(),
                    });
                }
            }
            if tick == anim.end {
                ctx.registry.load(container, loaded);
                mark_labels(ctx.registry, &[container, loaded]);
            }
        }

        Effect::Unload => {
            let (container, loaded) = pair(anim, ctx.registry)?;
            if !ctx.registry.is_loaded(loaded, Some(container)) {
                return Err(AnimationFailure::NotLoaded {
                    kind: kind.tag(),
                    entity: loaded.to_string(),
                    container: container.to_string(),
                });
            }
            if tick == anim.end {
                let at = position_of(ctx.registry, kind, container)?;
                if let Some(entity) = ctx.registry.get_mut(loaded) {
                    entity.move_to(at);
                }
                ctx.registry.unload(container, loaded);
                mark_labels(ctx.registry, &[container, loaded]);
            }
        }
    }

    if let Some(text) = &anim.text {
        entity_mut(ctx.registry, kind, target)?.append_text(text);
    }
    Ok(())
}

fn entity_mut<'r>(
    registry: &'r mut EntityRegistry,
    kind: AnimationKind,
    id: &str,
) -> Result<&'r mut MapEntity, AnimationFailure> {
    registry.get_mut(id).ok_or_else(|| AnimationFailure::MissingEntity {
        kind: kind.tag(),
        entity: id.to_string(),
    })
}

fn mark_labels(registry: &mut EntityRegistry, ids: &[&str]) {
    for id in ids {
        if let Some(entity) = registry.get_mut(id) {
            entity.mark_label(true);
        }
    }
}
