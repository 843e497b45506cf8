//! Terminal rendering of plans and values

use std::collections::{HashMap, HashSet};

use colored::{ColoredString, Colorize};
use similar::{ChangeTag, TextDiff};

use adverity_core::effect::Effect;
use adverity_core::plan::Plan;
use adverity_core::resolver;
use adverity_core::resource::{Resource, Value};
use adverity_core::schema::SchemaSet;

const SENSITIVE: &str = "(sensitive)";
const UNKNOWN: &str = "(known after apply)";

pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let strs: Vec<_> = items.iter().map(format_value).collect();
            format!("[{}]", strs.join(", "))
        }
        Value::Map(map) => {
            let mut strs: Vec<_> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, format_value(v)))
                .collect();
            strs.sort();
            format!("{{{}}}", strs.join(", "))
        }
        Value::ResourceRef(_, _) => UNKNOWN.to_string(),
    }
}

/// Formatted value, masked when the schema marks the attribute sensitive
fn shown(value: &Value, sensitive: bool) -> String {
    if sensitive {
        SENSITIVE.to_string()
    } else {
        format_value(value)
    }
}

fn symbol(effect: &Effect) -> ColoredString {
    match effect {
        Effect::Create(_) => "+".green().bold(),
        Effect::Update { .. } => "~".yellow().bold(),
        Effect::Replace { .. } => "-/+".magenta().bold(),
        Effect::Delete(_) => "-".red().bold(),
        Effect::Read(_) => "<=".cyan().bold(),
    }
}

/// Pretty-printed JSON when `s` holds a JSON array or object
fn as_json_document(s: &str) -> Option<String> {
    let trimmed = s.trim_start();
    if !(trimmed.starts_with('[') || trimmed.starts_with('{')) {
        return None;
    }
    let parsed: serde_json::Value = serde_json::from_str(s).ok()?;
    serde_json::to_string_pretty(&parsed).ok()
}

/// Line diff of two JSON documents, one output line per input line
pub fn json_diff_lines(old: &str, new: &str) -> Option<Vec<(ChangeTag, String)>> {
    let old = as_json_document(old)?;
    let new = as_json_document(new)?;
    let diff = TextDiff::from_lines(&old, &new);
    Some(
        diff.iter_all_changes()
            .map(|change| (change.tag(), change.to_string().trim_end().to_string()))
            .collect(),
    )
}

/// Sorted attribute keys to show, `name` first and internal keys hidden
fn visible_keys(attributes: &HashMap<String, Value>) -> Vec<&String> {
    let mut keys: Vec<_> = attributes.keys().filter(|k| !k.starts_with('_')).collect();
    keys.sort_by(|a, b| match (a.as_str(), b.as_str()) {
        ("name", _) => std::cmp::Ordering::Less,
        (_, "name") => std::cmp::Ordering::Greater,
        _ => a.cmp(b),
    });
    keys
}

/// Prints effects as a tree: each resource is followed by the effects that
/// reference it.
pub struct PlanPrinter<'a> {
    plan: &'a Plan,
    schemas: &'a SchemaSet,
}

impl<'a> PlanPrinter<'a> {
    pub fn new(plan: &'a Plan, schemas: &'a SchemaSet) -> Self {
        Self { plan, schemas }
    }

    fn is_sensitive(&self, resource: &Resource, key: &str) -> bool {
        self.schemas
            .get(resource)
            .is_some_and(|s| s.is_sensitive(key))
    }

    pub fn print(&self) {
        let effects = self.plan.effects();
        if self.plan.has_no_changes() {
            for effect in effects {
                println!("  {} {}", symbol(effect), effect.resource_id().to_string().cyan());
            }
            println!("{}", "No changes. Infrastructure is up-to-date.".green());
            return;
        }

        let mut binding_to_effect: HashMap<String, usize> = HashMap::new();
        let mut effect_deps: Vec<HashSet<String>> = Vec::with_capacity(effects.len());
        for (idx, effect) in effects.iter().enumerate() {
            match effect.target() {
                Some(r) => {
                    binding_to_effect.insert(r.binding(), idx);
                    effect_deps.push(resolver::dependencies(r));
                }
                None => effect_deps.push(HashSet::new()),
            }
        }

        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); effects.len()];
        let mut roots = Vec::new();
        for (idx, deps) in effect_deps.iter().enumerate() {
            let mut parents: Vec<usize> = deps
                .iter()
                .filter_map(|d| binding_to_effect.get(d).copied())
                .collect();
            parents.sort();
            match parents.last() {
                // Shown under the last applied dependency only
                Some(&parent) => dependents[parent].push(idx),
                None => roots.push(idx),
            }
        }

        println!("{}", "Execution Plan:".cyan().bold());
        println!();

        let mut printed = HashSet::new();
        for idx in roots {
            self.print_tree(idx, &dependents, &mut printed, "");
        }
        for idx in 0..effects.len() {
            self.print_tree(idx, &dependents, &mut printed, "");
        }

        println!();
        println!("{}", self.plan.summary().to_string().bold());
    }

    fn print_tree(
        &self,
        idx: usize,
        dependents: &[Vec<usize>],
        printed: &mut HashSet<usize>,
        prefix: &str,
    ) {
        if !printed.insert(idx) {
            return;
        }
        let effect = &self.plan.effects()[idx];
        println!(
            "  {}{} {}",
            prefix,
            symbol(effect),
            effect.resource_id().to_string().cyan().bold()
        );

        let attr_prefix = format!("  {}    ", prefix);
        self.print_attributes(effect, &attr_prefix);

        let child_prefix = format!("{}  ", prefix);
        for &child in &dependents[idx] {
            self.print_tree(child, dependents, printed, &child_prefix);
        }
    }

    fn print_attributes(&self, effect: &Effect, prefix: &str) {
        match effect {
            Effect::Create(r) => {
                for key in visible_keys(&r.attributes) {
                    let value = shown(&r.attributes[key], self.is_sensitive(r, key));
                    println!("{}{}: {}", prefix, key, value.green());
                }
            }
            Effect::Read(r) => {
                for key in visible_keys(&r.attributes) {
                    let value = shown(&r.attributes[key], self.is_sensitive(r, key));
                    println!("{}{}: {}", prefix, key, value.normal());
                }
            }
            Effect::Update { from, to, .. } | Effect::Replace { from, to, .. } => {
                for key in visible_keys(&to.attributes) {
                    let new_value = &to.attributes[key];
                    let old_value = from.attributes.get(key);
                    if old_value == Some(new_value) {
                        continue;
                    }
                    let sensitive = self.is_sensitive(to, key);
                    if !sensitive
                        && let (Some(Value::String(old)), Value::String(new)) = (old_value, new_value)
                        && let Some(lines) = json_diff_lines(old, new)
                    {
                        if lines.iter().all(|(tag, _)| *tag == ChangeTag::Equal) {
                            continue;
                        }
                        println!("{}{}:", prefix, key);
                        for (tag, line) in lines {
                            match tag {
                                ChangeTag::Delete => println!("{}  {} {}", prefix, "-".red(), line.red()),
                                ChangeTag::Insert => println!("{}  {} {}", prefix, "+".green(), line.green()),
                                ChangeTag::Equal => println!("{}    {}", prefix, line),
                            }
                        }
                        continue;
                    }
                    let old_str = old_value
                        .map(|v| shown(v, sensitive))
                        .unwrap_or_else(|| "(none)".to_string());
                    println!(
                        "{}{}: {} → {}",
                        prefix,
                        key,
                        old_str.red(),
                        shown(new_value, sensitive).green()
                    );
                }
            }
            Effect::Delete(state) => {
                if let Some(identifier) = &state.identifier {
                    println!("{}{}: {}", prefix, "identifier", identifier.red());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_render_as_unknown() {
        let value = Value::ResourceRef("adverity_connection.fb".into(), "id".into());
        assert_eq!(format_value(&value), "(known after apply)");
    }

    #[test]
    fn maps_render_sorted() {
        let value = Value::Map(
            [
                ("b".to_string(), Value::Int(2)),
                ("a".to_string(), Value::String("x".to_string())),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(format_value(&value), "{a: \"x\", b: 2}");
    }

    #[test]
    fn sensitive_values_are_masked() {
        assert_eq!(shown(&Value::String("secret".into()), true), "(sensitive)");
        assert_eq!(shown(&Value::Int(3), false), "3");
    }

    #[test]
    fn json_strings_diff_by_line() {
        let lines = json_diff_lines(
            r#"[{"name":"day","type":"DATE"}]"#,
            r#"[{"name":"day","type":"STRING"}]"#,
        )
        .unwrap();
        let changed: Vec<_> = lines
            .iter()
            .filter(|(tag, _)| *tag != ChangeTag::Equal)
            .map(|(tag, line)| (*tag, line.trim().to_string()))
            .collect();
        assert_eq!(
            changed,
            vec![
                (ChangeTag::Delete, "\"type\": \"DATE\"".to_string()),
                (ChangeTag::Insert, "\"type\": \"STRING\"".to_string()),
            ]
        );
        assert!(json_diff_lines("plain", "[]").is_none());
    }

    #[test]
    fn name_is_listed_first() {
        let mut attributes = HashMap::new();
        attributes.insert("auth".to_string(), Value::Int(1));
        attributes.insert("name".to_string(), Value::String("n".into()));
        attributes.insert("_binding".to_string(), Value::String("b".into()));
        let keys: Vec<&str> = visible_keys(&attributes).into_iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["name", "auth"]);
    }
}
