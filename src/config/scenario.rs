// src/config/scenario.rs
//
// Scenario configuration: which sprite each object type uses, which
// predicates seed positions and containment, and how each domain action
// is rendered as a list of animation templates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::animation::AnimationKind;
use crate::errors::ConfigurationError;

/************************* Raw document ********************/

/// The scenario document as written on disk, before validation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawScenario {
    pub object_types: BTreeMap<String, ObjectType>,
    pub init_predicats: BTreeMap<String, PredicateRole>,
    pub actions: BTreeMap<String, RawAction>,
    pub fixed_position: Vec<FixedPositionEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectType {
    pub sprite: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    Position,
    Storage,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PredicateRole {
    #[serde(rename = "type")]
    pub role: RoleType,
    pub mobile_var: String,
    pub fixed_var: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawAction {
    pub duration: i64,
    #[serde(default)]
    pub animations: Vec<RawAnimation>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawAnimation {
    pub name: String,
    pub start_at: u32,
    pub end_at: u32,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FixedPoint {
    pub var: String,
    pub x: f64,
    pub y: f64,
}

/// A fixed entity: either a bare name placed later by a position fact,
/// or a name with explicit coordinates (`x` longitude, `y` latitude).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FixedPositionEntry {
    Name(String),
    Point(FixedPoint),
}

impl FixedPositionEntry {
    pub fn var(&self) -> &str {
        match self {
            FixedPositionEntry::Name(name) => name,
            FixedPositionEntry::Point(point) => &point.var,
        }
    }
}

/************************* Validated model ********************/

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    Literal(AttributeValue),
    /// `?name`, bound to a plan step argument at compile time.
    Variable(String),
}

impl TemplateValue {
    /// `text` is free-form and never binds, even when it starts with `?`.
    fn for_attribute(key: &str, value: AttributeValue) -> Self {
        match value {
            AttributeValue::Text(text) if key != "text" && text.starts_with('?') => TemplateValue::Variable(text),
            other => TemplateValue::Literal(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTemplate {
    pub kind: AnimationKind,
    pub start_offset: u32,
    pub end_offset: u32,
    /// Keyed by canonical attribute name (`entity_id`, `image`, `size`, ...).
    pub attributes: BTreeMap<String, TemplateValue>,
}

impl AnimationTemplate {
    pub fn get(&self, key: &str) -> Option<&TemplateValue> {
        self.attributes.get(key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioAction {
    pub name: String,
    pub duration: u32,
    pub templates: Vec<AnimationTemplate>,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioConfig {
    object_types: BTreeMap<String, ObjectType>,
    predicate_roles: BTreeMap<String, PredicateRole>,
    actions: Vec<ScenarioAction>,
    fixed_positions: Vec<FixedPositionEntry>,
}

fn load_template(action: &str, raw: RawAnimation) -> Result<AnimationTemplate, ConfigurationError> {
    let kind = AnimationKind::from_tag(&raw.name).map_err(|e| ConfigurationError::UnknownKind {
        action: action.to_string(),
        kind: e.0,
    })?;

    if raw.start_at > raw.end_at {
        return Err(ConfigurationError::InvalidOffsets {
            action: action.to_string(),
            start: raw.start_at,
            end: raw.end_at,
        });
    }

    let missing: Vec<String> = kind
        .required_attributes()
        .iter()
        .filter(|name| !raw.attributes.contains_key(**name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ConfigurationError::MissingAttribute {
            action: action.to_string(),
            kind: kind.tag().to_string(),
            missing,
        });
    }

    let attributes = raw
        .attributes
        .into_iter()
        .map(|(name, value)| {
            let key = kind.resolve_symbolic_name(&name);
            (key.to_string(), TemplateValue::for_attribute(key, value))
        })
        .collect();

    Ok(AnimationTemplate {
        kind,
        start_offset: raw.start_at,
        end_offset: raw.end_at,
        attributes,
    })
}

fn load_action(name: String, raw: RawAction) -> Result<ScenarioAction, ConfigurationError> {
    let duration = u32::try_from(raw.duration)
        .ok()
        .filter(|d| *d > 0)
        .ok_or_else(|| ConfigurationError::InvalidDuration { action: name.clone() })?;

    if raw.animations.is_empty() {
        return Err(ConfigurationError::EmptyAnimations { action: name });
    }

    let templates = raw
        .animations
        .into_iter()
        .map(|anim| load_template(&name, anim))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ScenarioAction {
        name,
        duration,
        templates,
    })
}

impl ScenarioConfig {
    pub fn load(raw: RawScenario) -> Result<Self, ConfigurationError> {
        let actions = raw
            .actions
            .into_iter()
            .map(|(name, action)| load_action(name, action))
            .collect::<Result<Vec<_>, _>>()?;

        let config = ScenarioConfig {
            object_types: raw.object_types,
            predicate_roles: raw.init_predicats,
            actions,
            fixed_positions: raw.fixed_position,
        };
        config.validate()?;

        info!(
            object_types = config.object_types.len(),
            actions = config.actions.len(),
            fixed = config.fixed_positions.len(),
            "loaded scenario configuration"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.object_types.is_empty() {
            return Err(ConfigurationError::EmptyConfiguration("object_types"));
        }
        if self.predicate_roles.is_empty() {
            return Err(ConfigurationError::EmptyConfiguration("init_predicats"));
        }
        if self.actions.is_empty() {
            return Err(ConfigurationError::EmptyConfiguration("actions"));
        }
        Ok(())
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigurationError> {
        Self::load(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigurationError> {
        Self::load(serde_json::from_str(text)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let read = || {
            fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
                path: path.to_path_buf(),
                source,
            })
        };

        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&read()?),
            "json" => Self::from_json_str(&read()?),
            _ => Err(ConfigurationError::UnsupportedFormat(
                path.display().to_string(),
            )),
        }
    }

    pub fn object_types(&self) -> &BTreeMap<String, ObjectType> {
        &self.object_types
    }

    pub fn sprite_for_type(&self, type_name: &str) -> Option<&str> {
        self.object_types.get(type_name).map(|t| t.sprite.as_str())
    }

    pub fn predicate_roles(&self) -> &BTreeMap<String, PredicateRole> {
        &self.predicate_roles
    }

    pub fn actions(&self) -> &[ScenarioAction] {
        &self.actions
    }

    /// Exact name first, then ASCII case-insensitive.
    pub fn action(&self, name: &str) -> Option<&ScenarioAction> {
        self.actions
            .iter()
            .find(|a| a.name == name)
            .or_else(|| self.actions.iter().find(|a| a.name.eq_ignore_ascii_case(name)))
    }

    pub fn fixed_positions(&self) -> &[FixedPositionEntry] {
        &self.fixed_positions
    }

    pub fn is_fixed(&self, var: &str) -> bool {
        self.fixed_positions.iter().any(|entry| entry.var() == var)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const LOGISTICS_SCENARIO: &str = r#"
object_types:
  truck:
    sprite: truck.svg
  package:
    sprite: package.svg
  location:
    sprite: depot.svg
init_predicats:
  at:
    type: position
    mobile_var: "?obj"
    fixed_var: "?loc"
actions:
  LOAD-TRUCK:
    duration: 5
    animations:
      - name: load
        start_at: 0
        end_at: 5
        var_object_who_load: "?truck"
        var_object_loaded: "?pkg"
  DRIVE-TRUCK:
    duration: 10
    animations:
      - name: move_to
        start_at: 0
        end_at: 10
        var_object_to_move: "?truck"
        var_object_destination: "?to"
        text: "driving"
  UNLOAD-TRUCK:
    duration: 5
    animations:
      - name: unload
        start_at: 0
        end_at: 5
        var_object_who_unload: "?truck"
        var_object_unloaded: "?pkg"
fixed_position:
  - var: pos1
    x: 5.0
    y: 45.0
  - var: pos2
    x: 6.0
    y: 46.0
"#;

    pub fn logistics() -> super::ScenarioConfig {
        super::ScenarioConfig::from_yaml_str(LOGISTICS_SCENARIO).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_load_logistics() {
        let config = logistics();
        assert_eq!(config.sprite_for_type("truck"), Some("truck.svg"));
        assert_eq!(config.sprite_for_type("city"), None);
        assert_eq!(config.fixed_positions().len(), 2);
        assert!(config.is_fixed("pos1"));
        assert!(!config.is_fixed("tru1"));

        let load = config.action("load-truck").unwrap();
        assert_eq!(load.duration, 5);
        let template = &load.templates[0];
        assert_eq!(template.kind, AnimationKind::Load);
        assert_eq!(
            template.get("entity_id"),
            Some(&TemplateValue::Variable("?truck".to_string()))
        );
        assert_eq!(
            template.get("entity_id2"),
            Some(&TemplateValue::Variable("?pkg".to_string()))
        );
    }

    #[test]
    fn test_literals_and_variables() {
        let config = logistics();
        let drive = config.action("DRIVE-TRUCK").unwrap();
        assert_eq!(
            drive.templates[0].get("text"),
            Some(&TemplateValue::Literal(AttributeValue::Text("driving".to_string())))
        );

        let text = LOGISTICS_SCENARIO.replace("text: \"driving\"", "text: \"?why\"");
        let config = ScenarioConfig::from_yaml_str(&text).unwrap();
        assert_eq!(
            config.action("DRIVE-TRUCK").unwrap().templates[0].get("text"),
            Some(&TemplateValue::Literal(AttributeValue::Text("?why".to_string())))
        );
    }

    #[test]
    fn test_missing_attribute_names_action_and_key() {
        let text = LOGISTICS_SCENARIO.replace("        var_object_loaded: \"?pkg\"\n", "");
        match ScenarioConfig::from_yaml_str(&text) {
            Err(ConfigurationError::MissingAttribute { action, kind, missing }) => {
                assert_eq!(action, "LOAD-TRUCK");
                assert_eq!(kind, "load");
                assert_eq!(missing, vec!["var_object_loaded".to_string()]);
            }
            other => panic!("expected MissingAttribute, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_kind() {
        let text = LOGISTICS_SCENARIO.replace("name: unload", "name: unload_all");
        assert!(matches!(
            ScenarioConfig::from_yaml_str(&text),
            Err(ConfigurationError::UnknownKind { action, kind })
                if action == "UNLOAD-TRUCK" && kind == "unload_all"
        ));
    }

    #[test]
    fn test_invalid_offsets_and_duration() {
        let text = LOGISTICS_SCENARIO.replacen("start_at: 0\n        end_at: 5", "start_at: 6\n        end_at: 5", 1);
        assert!(matches!(
            ScenarioConfig::from_yaml_str(&text),
            Err(ConfigurationError::InvalidOffsets { start: 6, end: 5, .. })
        ));

        let text = LOGISTICS_SCENARIO.replace("duration: 10", "duration: 0");
        assert!(matches!(
            ScenarioConfig::from_yaml_str(&text),
            Err(ConfigurationError::InvalidDuration { action }) if action == "DRIVE-TRUCK"
        ));
    }

    #[test]
    fn test_empty_sections() {
        let text = r#"
object_types: {}
init_predicats:
  at: { type: position, mobile_var: "?a", fixed_var: "?b" }
actions:
  A: { duration: 1, animations: [ { name: text, start_at: 0, end_at: 1, var_object: "?a", text: hi } ] }
fixed_position: []
"#;
        assert!(matches!(
            ScenarioConfig::from_yaml_str(text),
            Err(ConfigurationError::EmptyConfiguration("object_types"))
        ));

        let text = r#"
object_types: { a: { sprite: a.png } }
init_predicats:
  at: { type: position, mobile_var: "?a", fixed_var: "?b" }
actions:
  A: { duration: 1, animations: [] }
fixed_position: []
"#;
        assert!(matches!(
            ScenarioConfig::from_yaml_str(text),
            Err(ConfigurationError::EmptyAnimations { .. })
        ));
    }

    #[test]
    fn test_missing_top_level_key_is_malformed() {
        let text = LOGISTICS_SCENARIO.replace("fixed_position:", "fixed_positions:");
        assert!(matches!(
            ScenarioConfig::from_yaml_str(&text),
            Err(ConfigurationError::Malformed(_))
        ));
    }

    #[test]
    fn test_invalid_role_type_and_fixed_entries() {
        let text = LOGISTICS_SCENARIO.replace("type: position", "type: anywhere");
        assert!(matches!(
            ScenarioConfig::from_yaml_str(&text),
            Err(ConfigurationError::Malformed(_))
        ));

        let text = LOGISTICS_SCENARIO.replace("  - var: pos2\n", "  - 42\n  - var: pos2\n");
        assert!(ScenarioConfig::from_yaml_str(&text).is_err());
    }

    #[test]
    fn test_json_and_paths() {
        let raw: RawScenario = serde_yaml::from_str(LOGISTICS_SCENARIO).unwrap();
        let json = serde_json::to_string(&raw).unwrap();
        let from_json = ScenarioConfig::from_json_str(&json).unwrap();
        assert_eq!(from_json.actions(), logistics().actions());

        let dir = tempfile::tempdir().unwrap();
        let yaml_path = dir.path().join("scenario.yml");
        fs::write(&yaml_path, LOGISTICS_SCENARIO).unwrap();
        assert!(ScenarioConfig::from_path(&yaml_path).is_ok());

        let json_path = dir.path().join("scenario.JSON");
        fs::write(&json_path, &json).unwrap();
        assert!(ScenarioConfig::from_path(&json_path).is_ok());

        let toml_path = dir.path().join("scenario.toml");
        assert!(matches!(
            ScenarioConfig::from_path(&toml_path),
            Err(ConfigurationError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ScenarioConfig::from_path(dir.path().join("absent.yaml")),
            Err(ConfigurationError::Io { .. })
        ));
    }
}
