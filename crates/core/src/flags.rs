//! Worker flag assembly.
//!
//! A [`ParameterSet`] collects toggle and override requests and renders
//! them into the ordered flag list handed to the worker subprocess.
//! Assembly is purely syntactic: scalar values are never validated against
//! the worker's accepted domain, that is the worker's job.
//!
//! Resolution rules:
//! - A boolean toggle renders as `--name`, its negation as `--no-name` by
//!   default; options whose negation is spelled differently on the worker
//!   command line (e.g. `--single-stage` negating `--multi-stage`) render
//!   the spelling given to [`ParameterSet::disable_as`].
//! - If both the positive and the negated form are requested for the same
//!   option, the negation wins and a diagnostic is recorded (negations
//!   typically arrive from a more specific override).
//! - Scalar overrides render as `--name <value>`.
//! - Unset options contribute nothing; no default flags are injected.
//!
//! Rendering is deterministic: options appear in first-touch order, and
//! identical inputs always produce identical output.

/// Resolved value for a single option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Positive boolean toggle (`--name`).
    Enabled,
    /// Negated boolean toggle; carries its rendered spelling (`no-name`
    /// for uniform pairs, a distinct flag name otherwise).
    Disabled(String),
    /// Valued override (`--name <value>`).
    Scalar(String),
}

/// Ordered option-name → value mapping, built once per job invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    /// First-touch ordered entries. Small enough that linear scans beat
    /// a map here, and the order is observable to the worker.
    entries: Vec<(String, ParamValue)>,
    diagnostics: Vec<String>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the positive form of a boolean toggle.
    ///
    /// If the negation was already requested, the negation stands and a
    /// diagnostic is recorded.
    pub fn enable(&mut self, name: &str) -> &mut Self {
        match self.position(name) {
            Some(idx) => {
                if let ParamValue::Disabled(negated) = &self.entries[idx].1 {
                    self.diagnostics.push(format!(
                        "both --{name} and --{negated} requested; keeping --{negated}"
                    ));
                } else {
                    self.entries[idx].1 = ParamValue::Enabled;
                }
            }
            None => self
                .entries
                .push((name.to_string(), ParamValue::Enabled)),
        }
        self
    }

    /// Request the negated form of a boolean toggle, rendered `--no-name`.
    ///
    /// Always wins over a previously requested positive form.
    pub fn disable(&mut self, name: &str) -> &mut Self {
        self.disable_as(name, &format!("no-{name}"))
    }

    /// Request the negated form of a toggle whose negation is its own flag
    /// name on the worker command line (rendered `--<negated>`).
    pub fn disable_as(&mut self, name: &str, negated: &str) -> &mut Self {
        match self.position(name) {
            Some(idx) => {
                if self.entries[idx].1 == ParamValue::Enabled {
                    self.diagnostics.push(format!(
                        "both --{name} and --{negated} requested; keeping --{negated}"
                    ));
                }
                self.entries[idx].1 = ParamValue::Disabled(negated.to_string());
            }
            None => self
                .entries
                .push((name.to_string(), ParamValue::Disabled(negated.to_string()))),
        }
        self
    }

    /// Set a scalar override. A repeated set replaces the previous value
    /// in place, keeping the original position.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        let value = ParamValue::Scalar(value.into());
        match self.position(name) {
            Some(idx) => self.entries[idx].1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
        self
    }

    /// Apply an optional three-state toggle: `Some(true)` enables,
    /// `Some(false)` disables, `None` contributes nothing.
    pub fn toggle(&mut self, name: &str, requested: Option<bool>) -> &mut Self {
        match requested {
            Some(true) => self.enable(name),
            Some(false) => self.disable(name),
            None => self,
        }
    }

    /// Render the ordered flag list for the worker invocation.
    pub fn args(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.entries.len() * 2);
        for (name, value) in &self.entries {
            match value {
                ParamValue::Enabled => out.push(format!("--{name}")),
                ParamValue::Disabled(negated) => out.push(format!("--{negated}")),
                ParamValue::Scalar(v) => {
                    out.push(format!("--{name}"));
                    out.push(v.clone());
                }
            }
        }
        out
    }

    /// Non-fatal conflicts recorded during assembly.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
