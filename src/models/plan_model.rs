// src/models/plan_model.rs
//
// The parsed planning domain, problem and solved plan.
// Read-only once built, except for the plan steps which can be reloaded
// without re-parsing the domain and problem.

use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::errors::ParseError;
use crate::services::pddl::{self, SExpr};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedObject {
    pub id: String,
    pub type_name: String,
}

/// One `(name, type)` entry of a predicate or action parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GroundFact {
    pub predicate: String,
    pub args: Vec<String>,
}

impl GroundFact {
    pub fn new(predicate: &str, args: &[&str]) -> Self {
        Self {
            predicate: predicate.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    pub action: String,
    pub args: Vec<String>,
}

/// A plan line that did not match the step grammar and was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanParseWarning {
    pub line_number: usize,
    pub line: String,
}

#[derive(Debug, Clone, Default)]
pub struct PlanModel {
    domain_name: String,
    problem_name: String,
    objects: Vec<TypedObject>,
    predicates: Vec<(String, Vec<Parameter>)>,
    actions: Vec<(String, Vec<Parameter>)>,
    initial_state: Vec<GroundFact>,
    goal_state: Vec<GroundFact>,
    plan: Vec<PlanStep>,
}

fn plan_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\d+\s*:\s*\(\s*([^\s()]+)((?:\s+[^\s()]+)*)\s*\)\s*(?:\[[\d.]+\])?\s*$")
            .expect("static plan line pattern")
    })
}

fn to_parameters(pairs: Vec<(String, String)>) -> Vec<Parameter> {
    pairs
        .into_iter()
        .map(|(name, type_name)| Parameter { name, type_name })
        .collect()
}

fn push_unique(facts: &mut Vec<GroundFact>, fact: GroundFact) {
    if !facts.contains(&fact) {
        facts.push(fact);
    }
}

fn define_body<'a>(root: &'a SExpr, kind: &str) -> Result<(&'a [SExpr], String), ParseError> {
    if !root.head_is("define") {
        return Err(ParseError::Structure("expected (define ...)".to_string()));
    }
    let items = root.as_list().unwrap_or_default();
    let header = items
        .get(1)
        .filter(|h| h.head_is(kind))
        .ok_or_else(|| ParseError::Structure(format!("expected ({kind} <name>) header")))?;
    let name = header
        .as_list()
        .and_then(|h| h.get(1))
        .and_then(SExpr::as_atom)
        .ok_or_else(|| ParseError::Structure(format!("{kind} has no name")))?;
    Ok((&items[2..], name.to_string()))
}

fn read(path: &Path) -> Result<String, ParseError> {
    fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl PlanModel {
    pub fn parse(domain_text: &str, problem_text: &str) -> Result<Self, ParseError> {
        let mut model = PlanModel::default();
        model.parse_domain(&pddl::parse(domain_text)?)?;
        model.parse_problem(&pddl::parse(problem_text)?)?;

        info!(
            domain = %model.domain_name,
            problem = %model.problem_name,
            objects = model.objects.len(),
            actions = model.actions.len(),
            "parsed planning domain and problem"
        );
        Ok(model)
    }

    pub fn from_files<P: AsRef<Path>>(
        domain: P,
        problem: P,
        plan: Option<P>,
    ) -> Result<Self, ParseError> {
        let mut model = Self::parse(&read(domain.as_ref())?, &read(problem.as_ref())?)?;
        if let Some(plan) = plan {
            model.load_plan(&read(plan.as_ref())?);
        }
        Ok(model)
    }

    fn parse_domain(&mut self, root: &SExpr) -> Result<(), ParseError> {
        let (body, name) = define_body(root, "domain")?;
        self.domain_name = name;

        for section in pddl::sections(body, ":constants") {
            let items = section.as_list().unwrap_or_default();
            for (id, type_name) in pddl::typed_list(&items[1..])? {
                self.objects.push(TypedObject { id, type_name });
            }
        }

        for section in pddl::sections(body, ":predicates") {
            for predicate in &section.as_list().unwrap_or_default()[1..] {
                let items = predicate
                    .as_list()
                    .filter(|items| !items.is_empty())
                    .ok_or_else(|| ParseError::Structure("malformed predicate".to_string()))?;
                let name = items[0]
                    .as_atom()
                    .ok_or_else(|| ParseError::Structure("predicate without name".to_string()))?;
                let params = to_parameters(pddl::typed_list(&items[1..])?);
                self.predicates.push((name.to_string(), params));
            }
        }

        for action in body
            .iter()
            .filter(|s| s.head_is(":action") || s.head_is(":durative-action"))
        {
            let items = action.as_list().unwrap_or_default();
            let name = items
                .get(1)
                .and_then(SExpr::as_atom)
                .ok_or_else(|| ParseError::Structure("action without name".to_string()))?;

            let mut params = Vec::new();
            let mut iter = items[2..].iter();
            while let Some(item) = iter.next() {
                if item.as_atom().is_some_and(|k| k.eq_ignore_ascii_case(":parameters")) {
                    let list = iter.next().and_then(SExpr::as_list).ok_or_else(|| {
                        ParseError::Structure(format!("action {name}: malformed :parameters"))
                    })?;
                    params = to_parameters(pddl::typed_list(list)?);
                    break;
                }
            }
            self.actions.push((name.to_string(), params));
        }
        Ok(())
    }

    fn parse_problem(&mut self, root: &SExpr) -> Result<(), ParseError> {
        let (body, name) = define_body(root, "problem")?;
        self.problem_name = name;

        for section in pddl::sections(body, ":objects") {
            let items = section.as_list().unwrap_or_default();
            for (id, type_name) in pddl::typed_list(&items[1..])? {
                self.objects.push(TypedObject { id, type_name });
            }
        }

        for section in pddl::sections(body, ":init") {
            for fact in &section.as_list().unwrap_or_default()[1..] {
                // numeric fluents and timed literals are not flat, skip them
                if let Some(mut atoms) = fact.atoms().filter(|a| !a.is_empty()) {
                    let predicate = atoms.remove(0);
                    push_unique(&mut self.initial_state, GroundFact { predicate, args: atoms });
                }
            }
        }

        for section in pddl::sections(body, ":goal") {
            let mut literals = Vec::new();
            for goal in &section.as_list().unwrap_or_default()[1..] {
                pddl::goal_literals(goal, &mut literals);
            }
            for mut atoms in literals {
                let predicate = atoms.remove(0);
                push_unique(&mut self.goal_state, GroundFact { predicate, args: atoms });
            }
        }
        Ok(())
    }

    /// Replace the plan with the steps found in `content`.
    /// Unrecognised lines are dropped and reported, never fatal.
    pub fn load_plan(&mut self, content: &str) -> Vec<PlanParseWarning> {
        self.plan.clear();
        let mut warnings = Vec::new();

        for (number, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            match plan_line_regex().captures(line) {
                Some(caps) => self.plan.push(PlanStep {
                    action: caps[1].to_string(),
                    args: caps[2].split_whitespace().map(str::to_string).collect(),
                }),
                None => {
                    warn!(line_number = number + 1, line, "skipping unrecognised plan line");
                    warnings.push(PlanParseWarning {
                        line_number: number + 1,
                        line: line.to_string(),
                    });
                }
            }
        }

        info!(steps = self.plan.len(), skipped = warnings.len(), "loaded plan");
        warnings
    }

    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    pub fn problem_name(&self) -> &str {
        &self.problem_name
    }

    pub fn objects(&self) -> &[TypedObject] {
        &self.objects
    }

    pub fn resolve_type(&self, object_id: &str) -> Option<&str> {
        self.objects
            .iter()
            .find(|o| o.id == object_id)
            .or_else(|| self.objects.iter().find(|o| o.id.eq_ignore_ascii_case(object_id)))
            .map(|o| o.type_name.as_str())
    }

    /// Distinct object types in first-seen order.
    pub fn object_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = Vec::new();
        for object in &self.objects {
            if !types.contains(&object.type_name.as_str()) {
                types.push(&object.type_name);
            }
        }
        types
    }

    pub fn predicates(&self) -> &[(String, Vec<Parameter>)] {
        &self.predicates
    }

    pub fn predicate_schema(&self, name: &str) -> Option<&[Parameter]> {
        lookup(&self.predicates, name)
    }

    pub fn action_signatures(&self) -> &[(String, Vec<Parameter>)] {
        &self.actions
    }

    pub fn action_signature(&self, name: &str) -> Option<&[Parameter]> {
        lookup(&self.actions, name)
    }

    pub fn initial_facts(&self) -> &[GroundFact] {
        &self.initial_state
    }

    pub fn goal_facts(&self) -> &[GroundFact] {
        &self.goal_state
    }

    pub fn plan_steps(&self) -> &[PlanStep] {
        &self.plan
    }
}

// PDDL names are case-insensitive; exact matches win.
fn lookup<'a>(entries: &'a [(String, Vec<Parameter>)], name: &str) -> Option<&'a [Parameter]> {
    entries
        .iter()
        .find(|(n, _)| n == name)
        .or_else(|| entries.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)))
        .map(|(_, params)| params.as_slice())
}
