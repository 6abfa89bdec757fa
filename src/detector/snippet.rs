//! Suggested configuration snippets
//!
//! Builds the smallest block tree that sets each requested field path and
//! renders it as a resource declaration. Leaves get a placeholder value that
//! is replaced by a comment marker, so the snippet reads as valid syntax
//! while flagging every value a contributor still has to fill in.

const PLACEHOLDER: &str = "\"VALUE\"";

#[derive(Debug, Default)]
struct Body {
    items: Vec<Item>,
}

#[derive(Debug)]
enum Item {
    Attribute(String),
    Block(String, Body),
}

impl Body {
    fn insert(&mut self, path: &[&str]) {
        match path {
            [] => {}
            [leaf] => {
                let exists = self
                    .items
                    .iter()
                    .any(|item| matches!(item, Item::Attribute(name) if name == leaf));
                if !exists {
                    self.items.push(Item::Attribute(leaf.to_string()));
                }
            }
            [head, rest @ ..] => {
                let position = self
                    .items
                    .iter()
                    .position(|item| matches!(item, Item::Block(name, _) if name == head));
                let index = match position {
                    Some(index) => index,
                    None => {
                        self.items.push(Item::Block(head.to_string(), Body::default()));
                        self.items.len() - 1
                    }
                };
                if let Item::Block(_, body) = &mut self.items[index] {
                    body.insert(rest);
                }
            }
        }
    }

    fn render(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let mut i = 0;
        while i < self.items.len() {
            match &self.items[i] {
                Item::Attribute(_) => {
                    // Consecutive attributes share one alignment column.
                    let run: Vec<&str> = self.items[i..]
                        .iter()
                        .map_while(|item| match item {
                            Item::Attribute(name) => Some(name.as_str()),
                            Item::Block(..) => None,
                        })
                        .collect();
                    let width = run.iter().map(|name| name.len()).max().unwrap_or(0);
                    for name in &run {
                        out.push_str(&format!("{indent}{name:<width$} = {PLACEHOLDER}\n"));
                    }
                    i += run.len();
                }
                Item::Block(name, body) => {
                    out.push_str(&format!("{indent}{name} {{\n"));
                    body.render(out, depth + 1);
                    out.push_str(&format!("{indent}}}\n"));
                    i += 1;
                }
            }
        }
    }
}

/// Render a `resource` block setting every dot-joined path in `fields`.
///
/// Paths are inserted in the given order; blocks with the same name are
/// reused so siblings share a parent.
pub fn suggested_config<S: AsRef<str>>(resource: &str, label: &str, fields: &[S], marker: &str) -> String {
    let mut root = Body::default();
    for field in fields {
        let path: Vec<&str> = field.as_ref().split('.').filter(|s| !s.is_empty()).collect();
        root.insert(&path);
    }
    let mut out = format!("resource \"{resource}\" \"{label}\" {{\n");
    root.render(&mut out, 1);
    out.push_str("}\n");
    out.replace(PLACEHOLDER, marker)
}
