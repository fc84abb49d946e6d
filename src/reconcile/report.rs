//! Structured results of a reconciliation.

use serde::Serialize;
use std::fmt;

/// What the engine did for a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Install,
    Uninstall,
    Skip,
}

/// How it went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Warning,
    Error,
}

/// Machine-readable reason for an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Installed,
    Uninstalled,
    /// License key missing or not exactly 40 characters. Nothing was done.
    InvalidLicense,
    /// Script exited non-zero, could not start, or timed out.
    ScriptExecutionFailed,
    /// APM requested but none of the requested runtimes exist.
    NoRuntimeSelected,
    /// A variant is still selected while APM is not being installed.
    VariantsStillSelected,
    /// No uninstall script exists for this feature.
    UninstallNotSupported,
    NothingToUninstall,
    /// Install succeeded but the uninstall tracking list was not updated.
    TrackingFailed,
}

impl OutcomeKind {
    fn status(self) -> Status {
        match self {
            OutcomeKind::Installed | OutcomeKind::Uninstalled => Status::Ok,
            OutcomeKind::InvalidLicense | OutcomeKind::ScriptExecutionFailed => Status::Error,
            OutcomeKind::NoRuntimeSelected
            | OutcomeKind::VariantsStillSelected
            | OutcomeKind::UninstallNotSupported
            | OutcomeKind::NothingToUninstall
            | OutcomeKind::TrackingFailed => Status::Warning,
        }
    }
}

/// One entry in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// `"infrastructure"`, `"apm"`, `"license"`, or a runtime version label.
    pub subject: String,
    pub action: Action,
    pub status: Status,
    pub kind: OutcomeKind,
    pub message: String,
}

impl Outcome {
    /// Build an outcome; status follows from `kind`.
    pub fn new(
        subject: impl Into<String>,
        action: Action,
        kind: OutcomeKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            action,
            status: kind.status(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.subject)
        } else {
            write!(f, "{}: {}", self.subject, self.message)
        }
    }
}

/// Ordered outcomes of one reconcile or uninstall call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallationReport {
    outcomes: Vec<Outcome>,
}

impl InstallationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// True when no outcome has error status. Warnings are fine.
    pub fn is_success(&self) -> bool {
        !self.outcomes.iter().any(|o| o.status == Status::Error)
    }

    /// Outcomes of the given kind, in order.
    pub fn of_kind(&self, kind: OutcomeKind) -> Vec<&Outcome> {
        self.outcomes.iter().filter(|o| o.kind == kind).collect()
    }

    /// First outcome about `subject`.
    pub fn find(&self, subject: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.subject == subject)
    }
}

impl IntoIterator for InstallationReport {
    type Item = Outcome;
    type IntoIter = std::vec::IntoIter<Outcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_kind() {
        let ok = Outcome::new("apm", Action::Install, OutcomeKind::Installed, "");
        let warn = Outcome::new("apm", Action::Skip, OutcomeKind::NoRuntimeSelected, "");
        let err = Outcome::new(
            "infrastructure",
            Action::Install,
            OutcomeKind::ScriptExecutionFailed,
            "exit 1",
        );

        assert_eq!(ok.status, Status::Ok);
        assert_eq!(warn.status, Status::Warning);
        assert_eq!(err.status, Status::Error);
    }

    #[test]
    fn report_success_ignores_warnings() {
        let mut report = InstallationReport::new();
        report.push(Outcome::new(
            "8.1",
            Action::Skip,
            OutcomeKind::VariantsStillSelected,
            "",
        ));
        assert!(report.is_success());

        report.push(Outcome::new(
            "license",
            Action::Skip,
            OutcomeKind::InvalidLicense,
            "",
        ));
        assert!(!report.is_success());
        assert_eq!(report.of_kind(OutcomeKind::InvalidLicense).len(), 1);
    }

    #[test]
    fn outcome_serializes_lowercase() {
        let outcome = Outcome::new("apm", Action::Install, OutcomeKind::Installed, "done");
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["subject"], "apm");
        assert_eq!(json["action"], "install");
        assert_eq!(json["status"], "ok");
        assert_eq!(json["kind"], "installed");
    }

    #[test]
    fn outcome_display() {
        let outcome = Outcome::new("8.1", Action::Skip, OutcomeKind::VariantsStillSelected, "x");
        assert_eq!(outcome.to_string(), "8.1: x");
    }
}
