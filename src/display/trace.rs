use crate::compute::Ledger;
use crate::store::{ParameterId, ParameterStore};
use std::collections::HashMap;
use std::fmt::Write;

/// Renders the subtree under `target` with the values held in `ledger`.
///
/// A parameter reached a second time prints a reference to the level it was
/// first expanded at instead of its subtree.
pub fn format_trace(store: &ParameterStore, ledger: &Ledger, target: ParameterId) -> String {
    let mut tracer = Tracer { store, ledger, visited_at_level: HashMap::new(), output: String::new() };

    match store.name(target) {
        Some(name) => {
            let _ = writeln!(tracer.output, "TRACE for parameter '{}':", name);
            let _ = writeln!(tracer.output, "--------------------------------------------------");
            tracer.trace_parameter(target, 1, "");
        }
        None => {
            let _ = writeln!(tracer.output, "Error: Invalid parameter id {}", target);
        }
    }
    tracer.output
}

struct Tracer<'a> {
    store: &'a ParameterStore,
    ledger: &'a Ledger,
    visited_at_level: HashMap<ParameterId, usize>,
    output: String,
}

impl<'a> Tracer<'a> {
    fn trace_parameter(&mut self, id: ParameterId, level: usize, prefix: &str) {
        if let Some(&first_seen) = self.visited_at_level.get(&id) {
            let _ = writeln!(self.output, "{}-> (Ref to L{})", prefix, first_seen);
            return;
        }
        self.visited_at_level.insert(id, level);

        let (Some(parameter), Some(meta)) = (self.store.get(id), self.store.metadata(id)) else {
            let _ = writeln!(self.output, "{}[L{}] <missing {}>", prefix, level, id);
            return;
        };

        let mut line = format!("[L{}] {}{}", level, meta.name, self.format_value(id));
        let children = parameter.children();
        if children.is_empty() {
            let _ = write!(line, " : {}", parameter.type_name());
        } else {
            let names: Vec<&str> = children.iter().map(|&c| self.store.name(c).unwrap_or("?")).collect();
            let _ = write!(line, " = {}({})", parameter.type_name(), names.join(", "));
        }
        if parameter.reads_network_state() {
            line.push_str(" [STATE]");
        }
        if meta.generated {
            line.push_str(" (generated)");
        }
        let _ = writeln!(self.output, "{}{}", prefix, line);

        self.recurse_children(prefix, &children, level);
    }

    fn recurse_children(&mut self, prefix: &str, children: &[ParameterId], level: usize) {
        let stem = self.build_child_stem(prefix);
        for (i, &child) in children.iter().enumerate() {
            let connector = if i == children.len() - 1 { "`--" } else { "|--" };
            let full_prefix = format!("{}{}", stem, connector);
            self.trace_parameter(child, level + 1, &full_prefix);
        }
    }

    fn format_value(&self, id: ParameterId) -> String {
        match self.ledger.get(id) {
            Some(v) => format!("[{:.3}]", v),
            None => "[?]".to_string(),
        }
    }

    fn build_child_stem(&self, current_prefix: &str) -> String {
        current_prefix.replace("`--", "   ").replace("|--", "|  ")
    }
}
