// src/services/pddl.rs
//
// Minimal s-expression reader for PDDL domain and problem files.
// Only the structure the plan model needs is interpreted here:
// typed lists, facts and goal conjunctions.

use regex::Regex;
use std::sync::OnceLock;

use crate::errors::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum SExpr {
    Atom(String),
    List(Vec<SExpr>),
}

impl SExpr {
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExpr::Atom(a) => Some(a),
            SExpr::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExpr]> {
        match self {
            SExpr::List(items) => Some(items),
            SExpr::Atom(_) => None,
        }
    }

    /// First atom of a list, e.g. `:action` for `(:action move ...)`.
    pub fn head(&self) -> Option<&str> {
        self.as_list()?.first()?.as_atom()
    }

    pub fn head_is(&self, keyword: &str) -> bool {
        self.head()
            .map(|h| h.eq_ignore_ascii_case(keyword))
            .unwrap_or(false)
    }

    /// A flat list of atoms, e.g. a ground fact `(at truck1 depot)`.
    pub fn atoms(&self) -> Option<Vec<String>> {
        self.as_list()?
            .iter()
            .map(|item| item.as_atom().map(str::to_string))
            .collect()
    }
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[()]|[^\s()]+").expect("static token pattern"))
}

fn comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r";[^\n]*").expect("static comment pattern"))
}

fn tokenize(text: &str) -> Vec<String> {
    let stripped = comment_regex().replace_all(text, "");
    token_regex()
        .find_iter(&stripped)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Parse exactly one top-level form.
pub fn parse(text: &str) -> Result<SExpr, ParseError> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return Err(ParseError::Syntax("empty input".to_string()));
    }

    let mut pos = 0;
    let expr = parse_expr(&tokens, &mut pos)?;
    if pos != tokens.len() {
        return Err(ParseError::Syntax(format!(
            "unexpected content after top-level form: '{}'",
            tokens[pos]
        )));
    }
    Ok(expr)
}

fn parse_expr(tokens: &[String], pos: &mut usize) -> Result<SExpr, ParseError> {
    let token = tokens
        .get(*pos)
        .ok_or_else(|| ParseError::Syntax("unexpected end of input".to_string()))?;
    *pos += 1;

    match token.as_str() {
        "(" => {
            let mut items = Vec::new();
            loop {
                match tokens.get(*pos).map(String::as_str) {
                    Some(")") => {
                        *pos += 1;
                        return Ok(SExpr::List(items));
                    }
                    Some(_) => items.push(parse_expr(tokens, pos)?),
                    None => {
                        return Err(ParseError::Syntax("unbalanced parentheses".to_string()));
                    }
                }
            }
        }
        ")" => Err(ParseError::Syntax("unexpected ')'".to_string())),
        atom => Ok(SExpr::Atom(atom.to_string())),
    }
}

/// Parse a typed list such as `?a ?b - truck ?c - (either city place) ?d`.
/// Names with no type get `object`.
pub fn typed_list(items: &[SExpr]) -> Result<Vec<(String, String)>, ParseError> {
    let mut result = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut iter = items.iter();

    while let Some(item) = iter.next() {
        match item {
            SExpr::Atom(a) if a == "-" => {
                if pending.is_empty() {
                    return Err(ParseError::Structure(
                        "type annotation without names".to_string(),
                    ));
                }
                let type_name = match iter.next() {
                    Some(SExpr::Atom(t)) => t.clone(),
                    // (either a b): keep the first alternative
                    Some(SExpr::List(alts)) => alts
                        .get(1)
                        .and_then(SExpr::as_atom)
                        .map(str::to_string)
                        .ok_or_else(|| ParseError::Structure("empty either type".to_string()))?,
                    None => {
                        return Err(ParseError::Structure("missing type after '-'".to_string()));
                    }
                };
                for name in pending.drain(..) {
                    result.push((name, type_name.clone()));
                }
            }
            SExpr::Atom(a) => pending.push(a.clone()),
            SExpr::List(_) => {
                return Err(ParseError::Structure(
                    "unexpected list in typed list".to_string(),
                ));
            }
        }
    }

    for name in pending {
        result.push((name, "object".to_string()));
    }
    Ok(result)
}

/// Positive literals of a goal description, flattened through `and`.
pub fn goal_literals(expr: &SExpr, out: &mut Vec<Vec<String>>) {
    if expr.head_is("and") {
        if let Some(items) = expr.as_list() {
            for item in &items[1..] {
                goal_literals(item, out);
            }
        }
        return;
    }

    let skipped = ["not", "or", "imply", "forall", "exists", "preference", "=", "<", ">", "<=", ">="];
    if let Some(head) = expr.head() {
        if skipped.iter().any(|k| head.eq_ignore_ascii_case(k)) {
            return;
        }
    }
    if let Some(atoms) = expr.atoms() {
        if !atoms.is_empty() {
            out.push(atoms);
        }
    }
}

/// Find `(:keyword ...)` sections among the children of a `define` form.
pub fn sections<'a>(define: &'a [SExpr], keyword: &'a str) -> impl Iterator<Item = &'a SExpr> {
    define.iter().filter(move |s| s.head_is(keyword))
}
