// src/services/compiler.rs
//
// Turns a parsed plan and a scenario configuration into the initial map
// entities and a flat, absolutely timed list of animation instances.
// Output order is plan step order, then template order inside a step.

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::animation::{AnimationInstance, AnimationKind, Effect};
use crate::config::scenario::{
    AnimationTemplate, AttributeValue, FixedPositionEntry, RoleType, ScenarioAction,
    ScenarioConfig, TemplateValue,
};
use crate::errors::CompilationError;
use crate::models::plan_model::{GroundFact, Parameter, PlanModel, PlanStep};
use crate::models::{GeoPosition, MapEntity};
use crate::views::HighlightColor;

pub const DEFAULT_SPRITE: &str = "default_sprite.png";

#[derive(Debug, Clone)]
pub struct CompiledScenario {
    pub entities: Vec<MapEntity>,
    /// `(container, loaded)` pairs seeded from storage predicates.
    pub containment: Vec<(String, String)>,
    pub animations: Vec<AnimationInstance>,
}

pub struct PlanCompiler<'a> {
    model: &'a PlanModel,
    config: &'a ScenarioConfig,
    default_sprite: String,
}

/// A predicate fact reduced to the two arguments a role cares about.
struct RoleFact {
    mobile: String,
    anchor: String,
}

/// Template attributes with every variable replaced by its argument.
struct Resolved<'t> {
    action: &'t str,
    values: BTreeMap<&'t str, AttributeValue>,
}

impl<'t> Resolved<'t> {
    fn invalid(&self, attribute: &str, expected: &'static str) -> CompilationError {
        CompilationError::InvalidAttribute {
            action: self.action.to_string(),
            attribute: attribute.to_string(),
            expected,
        }
    }

    fn entity(&self, kind: AnimationKind, role: &'static str) -> Result<String, CompilationError> {
        match self.values.get(role) {
            Some(AttributeValue::Text(id)) => Ok(id.clone()),
            Some(_) => Err(self.invalid(role, "an entity name")),
            None => Err(CompilationError::MissingEntityRole {
                action: self.action.to_string(),
                kind: kind.tag().to_string(),
                role,
            }),
        }
    }

    fn number(&self, key: &str) -> Result<Option<f64>, CompilationError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(AttributeValue::Number(n)) => Ok(Some(*n)),
            Some(AttributeValue::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| self.invalid(key, "a number")),
            Some(_) => Err(self.invalid(key, "a number")),
        }
    }

    fn require_number(&self, key: &str) -> Result<f64, CompilationError> {
        self.number(key)?.ok_or_else(|| self.invalid(key, "a number"))
    }

    fn text(&self, key: &str) -> Result<Option<String>, CompilationError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(AttributeValue::Text(s)) => Ok(Some(s.clone())),
            Some(AttributeValue::Number(n)) => Ok(Some(n.to_string())),
            Some(AttributeValue::Bool(b)) => Ok(Some(b.to_string())),
            Some(AttributeValue::List(_)) => Err(self.invalid(key, "a string")),
        }
    }

    fn require_text(&self, key: &str) -> Result<String, CompilationError> {
        self.text(key)?.ok_or_else(|| self.invalid(key, "a string"))
    }
}

impl<'a> PlanCompiler<'a> {
    pub fn new(model: &'a PlanModel, config: &'a ScenarioConfig) -> Self {
        Self {
            model,
            config,
            default_sprite: DEFAULT_SPRITE.to_string(),
        }
    }

    pub fn with_default_sprite(mut self, sprite: &str) -> Self {
        self.default_sprite = sprite.to_string();
        self
    }

    pub fn compile(&self) -> Result<CompiledScenario, CompilationError> {
        let entities = self.seed_entities()?;
        let containment = self.seed_containment(&entities)?;
        let animations = self.walk_plan()?;

        info!(
            entities = entities.len(),
            animations = animations.len(),
            loaded = containment.len(),
            "compiled scenario"
        );
        Ok(CompiledScenario {
            entities,
            containment,
            animations,
        })
    }

    fn sprite_for(&self, id: &str) -> String {
        let type_name = self.model.resolve_type(id).unwrap_or("object");
        match self.config.sprite_for_type(type_name) {
            Some(sprite) => sprite.to_string(),
            None => {
                warn!(entity = id, type_name, sprite = %self.default_sprite, "no sprite for type, using default");
                self.default_sprite.clone()
            }
        }
    }

    /// Facts of every predicate with the given role, in initial-state order.
    fn role_facts(&self, role_type: RoleType) -> Result<Vec<RoleFact>, CompilationError> {
        let mut roles: Vec<(&str, usize, usize)> = Vec::new();
        for (predicate, role) in self.config.predicate_roles() {
            if role.role != role_type {
                continue;
            }
            let schema = self
                .model
                .predicate_schema(predicate)
                .ok_or_else(|| CompilationError::UnknownPredicate(predicate.clone()))?;
            let index_of = |var: &str| -> Result<usize, CompilationError> {
                schema
                    .iter()
                    .position(|p: &Parameter| p.name.eq_ignore_ascii_case(var))
                    .ok_or_else(|| CompilationError::UnknownPredicateParameter {
                        predicate: predicate.clone(),
                        parameter: var.to_string(),
                    })
            };
            roles.push((predicate.as_str(), index_of(&role.mobile_var)?, index_of(&role.fixed_var)?));
        }

        let matching = |fact: &GroundFact| {
            roles
                .iter()
                .find(|(name, _, _)| fact.predicate.eq_ignore_ascii_case(name))
                .copied()
        };

        let mut facts = Vec::new();
        for fact in self.model.initial_facts() {
            let Some((_, mobile, fixed)) = matching(fact) else {
                continue;
            };
            match (fact.args.get(mobile), fact.args.get(fixed)) {
                (Some(mobile), Some(anchor)) => facts.push(RoleFact {
                    mobile: mobile.clone(),
                    anchor: anchor.clone(),
                }),
                _ => warn!(predicate = %fact.predicate, args = ?fact.args, "fact too short for its role"),
            }
        }
        Ok(facts)
    }

    fn seed_entities(&self) -> Result<Vec<MapEntity>, CompilationError> {
        let mut entities: Vec<MapEntity> = Vec::new();
        let mut placed: HashMap<String, GeoPosition> = HashMap::new();

        for entry in self.config.fixed_positions() {
            if let FixedPositionEntry::Point(point) = entry {
                if placed.contains_key(&point.var) {
                    continue;
                }
                let position = GeoPosition::new(point.y, point.x, 0.0);
                entities.push(MapEntity::new(&point.var, &point.var, &self.sprite_for(&point.var), position));
                placed.insert(point.var.clone(), position);
            }
        }

        let mut pending = self.role_facts(RoleType::Position)?;
        for fact in &pending {
            if !self.config.is_fixed(&fact.anchor) {
                return Err(CompilationError::UnresolvedAnchor {
                    anchor: fact.anchor.clone(),
                    mobile: fact.mobile.clone(),
                });
            }
        }

        // bare-name anchors may be placed by an earlier fact, repeat until stable
        loop {
            let before = pending.len();
            let mut waiting = Vec::new();
            for fact in pending {
                let Some(anchor) = placed.get(&fact.anchor).copied() else {
                    waiting.push(fact);
                    continue;
                };
                if placed.contains_key(&fact.mobile) {
                    debug!(mobile = %fact.mobile, anchor = %fact.anchor, "already placed, keeping first position");
                    continue;
                }
                entities.push(MapEntity::new(&fact.mobile, &fact.mobile, &self.sprite_for(&fact.mobile), anchor));
                placed.insert(fact.mobile, anchor);
            }
            pending = waiting;
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }

        if let Some(fact) = pending.into_iter().next() {
            return Err(CompilationError::UnresolvedAnchor {
                anchor: fact.anchor,
                mobile: fact.mobile,
            });
        }

        for entry in self.config.fixed_positions() {
            if let FixedPositionEntry::Name(name) = entry {
                if !placed.contains_key(name) {
                    warn!(entity = %name, "fixed entity never placed, skipping");
                }
            }
        }
        Ok(entities)
    }

    fn seed_containment(&self, entities: &[MapEntity]) -> Result<Vec<(String, String)>, CompilationError> {
        let exists = |id: &str| entities.iter().any(|e| e.id() == id);
        let mut containment: Vec<(String, String)> = Vec::new();

        for fact in self.role_facts(RoleType::Storage)? {
            if !exists(&fact.anchor) || !exists(&fact.mobile) {
                return Err(CompilationError::UnresolvedAnchor {
                    anchor: fact.anchor,
                    mobile: fact.mobile,
                });
            }
            if let Some((container, _)) = containment.iter().find(|(_, loaded)| *loaded == fact.mobile) {
                warn!(loaded = %fact.mobile, container = %container, "already stored, ignoring second container");
                continue;
            }
            containment.push((fact.anchor, fact.mobile));
        }
        Ok(containment)
    }

    fn walk_plan(&self) -> Result<Vec<AnimationInstance>, CompilationError> {
        let mut animations = Vec::new();
        let mut elapsed: u32 = 0;

        for step in self.model.plan_steps() {
            let Some(action) = self.config.action(&step.action) else {
                debug!(action = %step.action, "no scenario mapping, skipping step");
                continue;
            };
            let signature = self.model.action_signature(&step.action).unwrap_or_default();
            for template in &action.templates {
                animations.push(self.instantiate(step, action, signature, template, elapsed)?);
            }
            elapsed = elapsed
                .checked_add(action.duration)
                .ok_or_else(|| overflow(action))?;
        }
        Ok(animations)
    }

    fn resolve<'t>(
        &self,
        step: &PlanStep,
        action: &'t ScenarioAction,
        signature: &[Parameter],
        template: &'t AnimationTemplate,
    ) -> Result<Resolved<'t>, CompilationError> {
        let mut values = BTreeMap::new();
        for (key, value) in &template.attributes {
            let value = match value {
                TemplateValue::Literal(literal) => literal.clone(),
                TemplateValue::Variable(variable) => {
                    let index = signature
                        .iter()
                        .position(|p| p.name.eq_ignore_ascii_case(variable))
                        .ok_or_else(|| CompilationError::UnboundVariable {
                            action: action.name.clone(),
                            variable: variable.clone(),
                        })?;
                    let argument = step.args.get(index).ok_or_else(|| CompilationError::MissingArgument {
                        action: action.name.clone(),
                        variable: variable.clone(),
                        index,
                    })?;
                    AttributeValue::Text(argument.clone())
                }
            };
            values.insert(key.as_str(), value);
        }
        Ok(Resolved {
            action: &action.name,
            values,
        })
    }

    fn instantiate(
        &self,
        step: &PlanStep,
        action: &ScenarioAction,
        signature: &[Parameter],
        template: &AnimationTemplate,
        elapsed: u32,
    ) -> Result<AnimationInstance, CompilationError> {
        let kind = template.kind;
        let values = self.resolve(step, action, signature, template)?;

        let entity_id = values.entity(kind, "entity_id")?;
        let entity_id2 = if kind.is_binary() {
            Some(values.entity(kind, "entity_id2")?)
        } else {
            None
        };

        let effect = match kind {
            AnimationKind::Move => Effect::Move {
                lat_from: values.number("lat_from")?,
                lon_from: values.number("lon_from")?,
                alti_from: values.number("alti_from")?,
                lat_to: values.require_number("lat_to")?,
                lon_to: values.require_number("lon_to")?,
                alti_to: values.number("alti_to")?,
            },
            AnimationKind::MoveTo => Effect::MoveTo {
                distance: values.number("distance")?,
            },
            AnimationKind::AddText => Effect::AddText {
                text: values.require_text("text")?,
            },
            AnimationKind::Arrow => Effect::Arrow,
            AnimationKind::Around => Effect::Around {
                distance: values.require_number("distance")?,
                angle: values.require_number("angle")?,
            },
            AnimationKind::ChangeIcon => Effect::ChangeIcon {
                image: values.require_text("image")?,
            },
            AnimationKind::Background => Effect::Background {
                image: values.require_text("image")?,
            },
            AnimationKind::Size => Effect::Size {
                size: values.require_number("size")?,
            },
            AnimationKind::Opacity => Effect::Opacity {
                opacity: values.require_number("opacity")?,
            },
            AnimationKind::Rotate => Effect::Rotate {
                angle: values.require_number("angle")?,
            },
            AnimationKind::Highlight => Effect::Highlight {
                color: HighlightColor::from_name(&values.require_text("color")?),
            },
            AnimationKind::Load => Effect::Load,
            AnimationKind::Unload => Effect::Unload,
        };

        // add-text carries its text in the effect
        let text = match kind {
            AnimationKind::AddText => None,
            _ => values.text("text")?.filter(|t| !t.is_empty()),
        };

        let offset = |by: u32| elapsed.checked_add(by).ok_or_else(|| overflow(action));
        Ok(AnimationInstance {
            start: offset(template.start_offset)?,
            end: offset(template.end_offset)?,
            entity_id,
            entity_id2,
            text,
            effect,
        })
    }
}

fn overflow(action: &ScenarioAction) -> CompilationError {
    CompilationError::TimelineOverflow {
        action: action.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::scenario::fixtures::LOGISTICS_SCENARIO;
    use crate::models::plan_model::fixtures::{self, LOGISTICS_DOMAIN, LOGISTICS_PROBLEM};

    fn compile(scenario: &str) -> Result<CompiledScenario, CompilationError> {
        let model = fixtures::logistics();
        let config = ScenarioConfig::from_yaml_str(scenario).unwrap();
        PlanCompiler::new(&model, &config).compile()
    }

    #[test]
    fn test_load_truck_instances() {
        let compiled = compile(LOGISTICS_SCENARIO).unwrap();
        let first = &compiled.animations[0];
        assert_eq!(first.kind(), AnimationKind::Load);
        assert_eq!((first.start, first.end), (0, 5));
        assert_eq!(first.entity_id, "tru1");
        assert_eq!(first.entity_id2.as_deref(), Some("obj1"));
    }

    #[test]
    fn test_timeline_overflow() {
        let text = LOGISTICS_SCENARIO.replace("duration: 10", "duration: 4294967295");
        assert_eq!(
            compile(&text).unwrap_err(),
            CompilationError::TimelineOverflow {
                action: "DRIVE-TRUCK".to_string()
            }
        );
    }

    #[test]
    fn test_elapsed_accumulates_durations() {
        let compiled = compile(LOGISTICS_SCENARIO).unwrap();
        let windows: Vec<(u32, u32)> = compiled.animations.iter().map(|a| (a.start, a.end)).collect();
        assert_eq!(windows, vec![(0, 5), (5, 15), (15, 20)]);
        assert_eq!(compiled.animations[1].entity_id2.as_deref(), Some("pos2"));
        assert_eq!(compiled.animations[1].text.as_deref(), Some("driving"));
    }

    #[test]
    fn test_entities_seeded_at_anchors() {
        let compiled = compile(LOGISTICS_SCENARIO).unwrap();
        let ids: Vec<&str> = compiled.entities.iter().map(MapEntity::id).collect();
        assert_eq!(ids, vec!["pos1", "pos2", "tru1", "obj1"]);

        let truck = &compiled.entities[2];
        assert_eq!(truck.position(), GeoPosition::new(45.0, 5.0, 0.0));
        assert_eq!(truck.icon(), "truck.svg");
        assert!(compiled.containment.is_empty());
    }

    #[test]
    fn test_compile_is_deterministic() {
        let first = serde_json::to_string(&compile(LOGISTICS_SCENARIO).unwrap().animations).unwrap();
        let second = serde_json::to_string(&compile(LOGISTICS_SCENARIO).unwrap().animations).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unbound_variable() {
        let scenario = LOGISTICS_SCENARIO.replace("var_object_loaded: \"?pkg\"", "var_object_loaded: \"?parcel\"");
        assert_eq!(
            compile(&scenario).unwrap_err(),
            CompilationError::UnboundVariable {
                action: "LOAD-TRUCK".to_string(),
                variable: "?parcel".to_string()
            }
        );
    }

    #[test]
    fn test_missing_argument() {
        let mut model = fixtures::logistics();
        model.load_plan("0: (LOAD-TRUCK obj1 tru1)");
        let config = ScenarioConfig::from_yaml_str(LOGISTICS_SCENARIO).unwrap();
        let scenario = LOGISTICS_SCENARIO.replace("var_object_who_load: \"?truck\"", "var_object_who_load: \"?loc\"");
        let config_loc = ScenarioConfig::from_yaml_str(&scenario).unwrap();

        assert!(PlanCompiler::new(&model, &config).compile().is_ok());
        assert!(matches!(
            PlanCompiler::new(&model, &config_loc).compile(),
            Err(CompilationError::MissingArgument { index: 2, .. })
        ));
    }

    #[test]
    fn test_unresolved_anchor() {
        let scenario = LOGISTICS_SCENARIO.replace("  - var: pos1\n    x: 5.0\n    y: 45.0\n", "");
        assert_eq!(
            compile(&scenario).unwrap_err(),
            CompilationError::UnresolvedAnchor {
                anchor: "pos1".to_string(),
                mobile: "tru1".to_string()
            }
        );
    }

    #[test]
    fn test_unmapped_steps_are_skipped() {
        let mut model = fixtures::logistics();
        model.load_plan("0: (FLY-PLANE p1 a1 a2)\n1: (LOAD-TRUCK obj1 tru1 pos1)");
        let config = ScenarioConfig::from_yaml_str(LOGISTICS_SCENARIO).unwrap();
        let compiled = PlanCompiler::new(&model, &config).compile().unwrap();
        assert_eq!(compiled.animations.len(), 1);
        assert_eq!(compiled.animations[0].start, 0);
    }

    #[test]
    fn test_invalid_attribute() {
        let scenario = LOGISTICS_SCENARIO.replace(
            "        text: \"driving\"\n",
            "        text: \"driving\"\n        distance: far\n",
        );
        assert!(matches!(
            compile(&scenario),
            Err(CompilationError::InvalidAttribute { attribute, .. }) if attribute == "distance"
        ));
    }

    #[test]
    fn test_bare_name_anchor_and_storage() {
        let problem = LOGISTICS_PROBLEM
            .replace("(at tru1 pos1)", "(at tru1 depot)")
            .replace("(at obj1 pos1)", "(at depot pos1) (in obj1 tru1)")
            .replace("obj1 - package", "obj1 - package depot - location");
        let mut model = PlanModel::parse(LOGISTICS_DOMAIN, &problem).unwrap();
        model.load_plan("");

        let scenario = LOGISTICS_SCENARIO
            .replace("fixed_position:\n", "fixed_position:\n  - depot\n")
            .replace(
                "init_predicats:\n",
                "init_predicats:\n  in:\n    type: storage\n    mobile_var: \"?pkg\"\n    fixed_var: \"?veh\"\n",
            );
        let config = ScenarioConfig::from_yaml_str(&scenario).unwrap();

        // obj1 is not positioned by any fact, so storage cannot resolve it
        assert!(matches!(
            PlanCompiler::new(&model, &config).compile(),
            Err(CompilationError::UnresolvedAnchor { .. })
        ));

        let problem = problem.replace("(in obj1 tru1)", "(in obj1 tru1) (at obj1 pos2)");
        let model = PlanModel::parse(LOGISTICS_DOMAIN, &problem).unwrap();
        let compiled = PlanCompiler::new(&model, &config).compile().unwrap();

        let depot = compiled.entities.iter().find(|e| e.id() == "depot").unwrap();
        let truck = compiled.entities.iter().find(|e| e.id() == "tru1").unwrap();
        assert_eq!(depot.position(), GeoPosition::new(45.0, 5.0, 0.0));
        assert_eq!(truck.position(), depot.position());
        assert_eq!(compiled.containment, vec![("tru1".to_string(), "obj1".to_string())]);
    }

    #[test]
    fn test_unknown_predicate_role() {
        let scenario = LOGISTICS_SCENARIO.replace("  at:\n    type: position", "  on:\n    type: position");
        assert_eq!(
            compile(&scenario).unwrap_err(),
            CompilationError::UnknownPredicate("on".to_string())
        );
    }
}
