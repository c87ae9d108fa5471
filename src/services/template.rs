// src/services/template.rs
//
// Generates a scenario skeleton from a parsed domain, for a human to
// fill in. Keys follow domain declaration order.

use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use crate::config::TemplateConfig;
use crate::errors::{ConfigurationError, Error};
use crate::models::PlanModel;

fn map(entries: Vec<(&str, Value)>) -> Value {
    let mut mapping = Mapping::new();
    for (key, value) in entries {
        mapping.insert(Value::from(key), value);
    }
    Value::Mapping(mapping)
}

/// Position roles for every predicate named like the configured one
/// that has enough parameters for both configured indices.
fn position_roles(model: &PlanModel, template: &TemplateConfig) -> Mapping {
    let needed = template.mobile_index.max(template.fixed_index) + 1;
    let mut roles = Mapping::new();

    for (name, params) in model.predicates() {
        if !name.eq_ignore_ascii_case(&template.position_predicate) || params.len() < needed {
            continue;
        }
        roles.insert(
            Value::from(name.as_str()),
            map(vec![
                ("type", Value::from("position")),
                ("mobile_var", Value::from(params[template.mobile_index].name.as_str())),
                ("fixed_var", Value::from(params[template.fixed_index].name.as_str())),
            ]),
        );
    }
    roles
}

pub fn generate_template(model: &PlanModel, template: &TemplateConfig) -> Value {
    let mut object_types = Mapping::new();
    for type_name in model.object_types() {
        object_types.insert(
            Value::from(type_name),
            map(vec![("sprite", Value::from(template.default_sprite.as_str()))]),
        );
    }

    let mut actions = Mapping::new();
    for (name, params) in model.action_signatures() {
        let entity_vars: Vec<Value> = params.iter().map(|p| Value::from(p.name.as_str())).collect();
        let animation = map(vec![
            ("name", Value::from("")),
            ("start_at", Value::from(0u32)),
            ("end_at", Value::from(template.default_duration)),
            ("entity_vars", Value::Sequence(entity_vars)),
        ]);
        actions.insert(
            Value::from(name.as_str()),
            map(vec![
                ("duration", Value::from(template.default_duration)),
                ("animations", Value::Sequence(vec![animation])),
            ]),
        );
    }

    map(vec![
        ("object_types", Value::Mapping(object_types)),
        ("init_predicats", Value::Mapping(position_roles(model, template))),
        ("actions", Value::Mapping(actions)),
        ("fixed_position", Value::Sequence(Vec::new())),
    ])
}

/// Write the skeleton as `config-<unix seconds>.yml` inside `dir`.
pub fn write_template(model: &PlanModel, template: &TemplateConfig, dir: &Path) -> Result<PathBuf, Error> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let path = dir.join(format!("config-{timestamp}.yml"));

    let document = generate_template(model, template);
    let text = serde_yaml::to_string(&document).map_err(ConfigurationError::from)?;

    fs::create_dir_all(dir)
        .and_then(|_| fs::write(&path, text))
        .map_err(|source| Error::Write {
            path: path.clone(),
            source,
        })?;

    info!(path = %path.display(), "wrote scenario template");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::plan_model::fixtures;

    #[test]
    fn test_template_shape() {
        let model = fixtures::logistics();
        let doc = generate_template(&model, &TemplateConfig::default());

        let keys: Vec<&str> = doc
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(keys, vec!["object_types", "init_predicats", "actions", "fixed_position"]);

        let types: Vec<&str> = doc["object_types"]
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(types, vec!["truck", "location", "city", "package"]);
        assert_eq!(doc["object_types"]["truck"]["sprite"], "default_sprite.png");

        assert_eq!(doc["init_predicats"]["at"]["mobile_var"], "?obj");
        assert_eq!(doc["init_predicats"]["at"]["fixed_var"], "?loc");

        let drive = &doc["actions"]["DRIVE-TRUCK"];
        assert_eq!(drive["duration"], 10);
        assert_eq!(drive["animations"][0]["name"], "");
        assert_eq!(drive["animations"][0]["end_at"], 10);
        assert_eq!(drive["animations"][0]["entity_vars"].as_sequence().unwrap().len(), 4);
        assert!(doc["fixed_position"].as_sequence().unwrap().is_empty());
    }

    #[test]
    fn test_role_heuristic_is_configurable() {
        let model = fixtures::logistics();
        let template = TemplateConfig {
            position_predicate: "in".to_string(),
            mobile_index: 1,
            fixed_index: 0,
            ..TemplateConfig::default()
        };
        let doc = generate_template(&model, &template);
        assert_eq!(doc["init_predicats"]["in"]["mobile_var"], "?veh");
        assert!(doc["init_predicats"].get("at").is_none());

        let template = TemplateConfig {
            fixed_index: 5,
            ..TemplateConfig::default()
        };
        let doc = generate_template(&model, &template);
        assert!(doc["init_predicats"].as_mapping().unwrap().is_empty());
    }

    #[test]
    fn test_write_template() {
        let model = fixtures::logistics();
        let dir = tempfile::tempdir().unwrap();
        let path = write_template(&model, &TemplateConfig::default(), &dir.path().join("out")).unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("config-") && name.ends_with(".yml"));
        let back: Value = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, generate_template(&model, &TemplateConfig::default()));
    }
}
