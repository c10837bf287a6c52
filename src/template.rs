use std::collections::BTreeMap;

/// Name of the only variable the service ever supplies to templates
pub const PORT_VARIABLE: &str = "port";

/// Variables available to response body templates.
///
/// Derived from the bound port on every render and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
    variables: BTreeMap<String, String>,
}

impl TemplateContext {
    /// Create the context for a server bound to `port`
    pub fn for_port(port: u16) -> Self {
        let mut variables = BTreeMap::new();
        variables.insert(PORT_VARIABLE.to_string(), port.to_string());
        Self { variables }
    }

    /// Look up a variable value
    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// Render `template` against this context
    pub fn render(&self, template: &str) -> String {
        render_template(template, &self.variables)
    }
}

/// Substitute `${name}` placeholders with values from `variables`.
///
/// A placeholder name is made of ASCII letters, digits and `_`. Anything else
/// after `${` is not a placeholder: the `${` is copied and scanning resumes
/// right after it. Single left-to-right pass, substituted values are never
/// rescanned, unknown names are copied through literally.
pub fn render_template(template: &str, variables: &BTreeMap<String, String>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        let name_len = after_open
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after_open.len());
        let name = &after_open[..name_len];

        if name.is_empty() || !after_open[name_len..].starts_with('}') {
            output.push_str("${");
            rest = after_open;
            continue;
        }

        match variables.get(name) {
            Some(value) => output.push_str(value),
            None => {
                output.push_str("${");
                output.push_str(name);
                output.push('}');
            }
        }
        rest = &after_open[name_len + 1..];
    }

    output.push_str(rest);
    output
}
