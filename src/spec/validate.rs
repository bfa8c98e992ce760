// src/spec/validate.rs

use crate::errors::{DagmakeError, Result};
use crate::spec::model::{RawSpecFile, RuleConfig, SpecFile};
use crate::spec::template::OutputTemplate;

impl TryFrom<RawSpecFile> for SpecFile {
    type Error = DagmakeError;

    fn try_from(raw: RawSpecFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_spec(&raw)?;
        Ok(SpecFile::new_unchecked(raw.config, raw.rule))
    }
}

fn validate_raw_spec(spec: &RawSpecFile) -> Result<()> {
    ensure_has_rules(spec)?;
    validate_global_config(spec)?;
    for (index, rule) in spec.rule.iter().enumerate() {
        validate_rule(index, rule)?;
    }
    Ok(())
}

fn ensure_has_rules(spec: &RawSpecFile) -> Result<()> {
    if spec.rule.is_empty() {
        return Err(DagmakeError::Config(
            "spec must declare at least one [[rule]]".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(spec: &RawSpecFile) -> Result<()> {
    if spec.config.shell.trim().is_empty() {
        return Err(DagmakeError::Config(
            "[config].shell must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_rule(index: usize, rule: &RuleConfig) -> Result<()> {
    let label = rule.label(index);

    match (&rule.output, &rule.output_template) {
        (Some(_), Some(_)) => {
            return Err(DagmakeError::Config(format!(
                "rule '{label}' sets both `output` and `output_template`; use one"
            )));
        }
        (None, None) => {
            return Err(DagmakeError::Config(format!(
                "rule '{label}' needs an `output` or an `output_template`"
            )));
        }
        (Some(output), None) => {
            let outputs = output.to_vec();
            if outputs.is_empty() {
                return Err(DagmakeError::Config(format!(
                    "rule '{label}' has an empty `output` list"
                )));
            }
            if outputs.iter().any(|o| o.trim().is_empty()) {
                return Err(DagmakeError::Config(format!(
                    "rule '{label}' has an empty output path"
                )));
            }
        }
        (None, Some(template)) => {
            OutputTemplate::parse(template)?;
            if rule.inputs.to_vec().is_empty() {
                return Err(DagmakeError::Config(format!(
                    "rule '{label}' uses `output_template` but declares no inputs"
                )));
            }
        }
    }

    if rule.inputs.to_vec().iter().any(|i| i.trim().is_empty()) {
        return Err(DagmakeError::Config(format!(
            "rule '{label}' has an empty input path"
        )));
    }

    if rule.cmd.trim().is_empty() {
        return Err(DagmakeError::Config(format!(
            "rule '{label}' has an empty `cmd`"
        )));
    }

    Ok(())
}
