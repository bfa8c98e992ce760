#![allow(dead_code)]

use std::sync::Arc;

use dagmake::exec::Action;
use dagmake::spec::Rule;

/// Programmatic rule with one literal output.
pub fn rule(output: &str, inputs: &[&str], action: Arc<dyn Action>) -> Rule {
    Rule::output(output, action).with_inputs(inputs.iter().copied())
}

/// Builder for `Dagmake.toml` contents.
#[derive(Debug, Default, Clone)]
pub struct SpecTomlBuilder {
    config: Vec<String>,
    rules: Vec<String>,
}

impl SpecTomlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shell(mut self, shell: &str) -> Self {
        self.config.push(format!("shell = {shell:?}"));
        self
    }

    pub fn track_changes(mut self, on: bool) -> Self {
        self.config.push(format!("track_changes = {on}"));
        self
    }

    /// `[[rule]]` with literal outputs.
    pub fn rule(mut self, outputs: &[&str], inputs: &[&str], cmd: &str) -> Self {
        self.rules.push(format!(
            "[[rule]]\noutput = {}\ninputs = {}\ncmd = {cmd:?}\n",
            toml_list(outputs),
            toml_list(inputs)
        ));
        self
    }

    /// `[[rule]]` with tags.
    pub fn tagged_rule(mut self, output: &str, inputs: &[&str], tags: &[&str], cmd: &str) -> Self {
        self.rules.push(format!(
            "[[rule]]\noutput = {output:?}\ninputs = {}\ntags = {}\ncmd = {cmd:?}\n",
            toml_list(inputs),
            toml_list(tags)
        ));
        self
    }

    /// `[[rule]]` with per-input outputs.
    pub fn template_rule(mut self, template: &str, inputs: &[&str], cmd: &str) -> Self {
        self.rules.push(format!(
            "[[rule]]\noutput_template = {template:?}\ninputs = {}\ncmd = {cmd:?}\n",
            toml_list(inputs)
        ));
        self
    }

    /// Raw text appended as-is.
    pub fn raw(mut self, text: &str) -> Self {
        self.rules.push(text.to_string());
        self
    }

    pub fn build(self) -> String {
        let mut out = String::new();
        if !self.config.is_empty() {
            out.push_str("[config]\n");
            for line in &self.config {
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
        for rule in &self.rules {
            out.push_str(rule);
            out.push('\n');
        }
        out
    }
}

fn toml_list(items: &[&str]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| format!("{i:?}")).collect();
    format!("[{}]", quoted.join(", "))
}
