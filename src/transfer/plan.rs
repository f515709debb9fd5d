//! Exclusion filtering and local path assignment.
//!
//! The plan is computed in full before any remote I/O so the set of files to
//! copy, and their order, can be logged and inspected up front. Excluded files
//! never reach the remote store.

use std::fmt;

use super::{ExclusionRules, TransferRequest};

/// Which rule removed a file from the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// The basename is listed in `exclude.name`.
    Name,
    /// The full identifier is listed in `exclude.path`.
    Path,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Path => f.write_str("path"),
        }
    }
}

/// A file that survived exclusion, paired with where it will be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTransfer {
    /// Remote identifier, verbatim from the request.
    pub identifier: String,
    /// `destination + "/" + identifier`.
    pub local_path: String,
}

/// A file removed by an exclusion rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    /// Remote identifier, verbatim from the request.
    pub identifier: String,
    /// Rule that matched.
    pub reason: ExclusionReason,
}

/// Ordered set of files a request will copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferPlan {
    transfers: Vec<PlannedTransfer>,
    skipped: Vec<SkippedFile>,
}

impl TransferPlan {
    /// Filters `request.files` through its exclusion rules.
    ///
    /// Surviving files keep their original relative order. Duplicates are kept.
    #[must_use]
    pub fn build(request: &TransferRequest) -> Self {
        let mut plan = Self::default();
        for identifier in &request.files {
            if let Some(reason) = exclusion_reason(&request.exclude, identifier) {
                plan.skipped.push(SkippedFile {
                    identifier: identifier.clone(),
                    reason,
                });
                continue;
            }
            plan.transfers.push(PlannedTransfer {
                identifier: identifier.clone(),
                local_path: local_path(&request.destination, identifier),
            });
        }
        plan
    }

    /// Files to copy, in request order.
    #[must_use]
    pub fn transfers(&self) -> &[PlannedTransfer] {
        &self.transfers
    }

    /// Files removed by exclusion rules, in request order.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    /// Number of files to copy.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transfers.len()
    }

    /// Returns true if nothing survived exclusion.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }
}

/// Returns the rule excluding `identifier`, if any.
///
/// The name rule is consulted first, so a file listed in both sets is
/// reported as excluded by name.
#[must_use]
pub fn exclusion_reason(rules: &ExclusionRules, identifier: &str) -> Option<ExclusionReason> {
    if !rules.names.is_empty() && rules.names.contains(basename(identifier)) {
        return Some(ExclusionReason::Name);
    }
    if !rules.paths.is_empty() && rules.paths.contains(identifier) {
        return Some(ExclusionReason::Path);
    }
    None
}

/// Final `/`-separated segment of an identifier, ignoring trailing slashes.
#[must_use]
pub fn basename(identifier: &str) -> &str {
    let trimmed = identifier.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

fn local_path(destination: &str, identifier: &str) -> String {
    format!("{destination}/{identifier}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_files() -> Vec<&'static str> {
        vec!["tmp/test.txt", "tmp/test2.txt", "tmp2/test.txt"]
    }

    #[test]
    fn test_basename_takes_last_segment() {
        assert_eq!(basename("tmp/test.txt"), "test.txt");
        assert_eq!(basename("/tmp/a/b.csv"), "b.csv");
        assert_eq!(basename("plain.txt"), "plain.txt");
        assert_eq!(basename("dir/sub/"), "sub");
    }

    #[test]
    fn test_plan_without_rules_keeps_everything_in_order() {
        let request = TransferRequest::new(sample_files(), "temp");
        let plan = TransferPlan::build(&request);

        let locals: Vec<&str> = plan.transfers().iter().map(|t| t.local_path.as_str()).collect();
        assert_eq!(
            locals,
            vec!["temp/tmp/test.txt", "temp/tmp/test2.txt", "temp/tmp2/test.txt"]
        );
        assert!(plan.skipped().is_empty());
    }

    #[test]
    fn test_name_rule_matches_basename_in_any_directory() {
        let request = TransferRequest::new(sample_files(), "temp").exclude_names(["test.txt"]);
        let plan = TransferPlan::build(&request);

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.transfers()[0].identifier, "tmp/test2.txt");
        assert_eq!(plan.transfers()[0].local_path, "temp/tmp/test2.txt");
        assert!(
            plan.skipped()
                .iter()
                .all(|s| s.reason == ExclusionReason::Name)
        );
    }

    #[test]
    fn test_path_rule_matches_full_identifier_only() {
        let request = TransferRequest::new(sample_files(), "temp")
            .exclude_paths(["tmp/test.txt", "tmp/test2.txt"]);
        let plan = TransferPlan::build(&request);

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.transfers()[0].identifier, "tmp2/test.txt");
        assert_eq!(plan.skipped().len(), 2);
    }

    #[test]
    fn test_path_rule_is_not_a_basename_match() {
        let request = TransferRequest::new(sample_files(), "temp").exclude_paths(["test.txt"]);
        assert_eq!(TransferPlan::build(&request).len(), 3);
    }

    #[test]
    fn test_both_rules_apply_with_name_reported_first() {
        let request = TransferRequest::new(sample_files(), "temp")
            .exclude_names(["test2.txt"])
            .exclude_paths(["tmp2/test.txt", "tmp/test2.txt"]);
        let plan = TransferPlan::build(&request);

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.transfers()[0].identifier, "tmp/test.txt");
        assert_eq!(
            plan.skipped(),
            &[
                SkippedFile {
                    identifier: "tmp/test2.txt".to_string(),
                    reason: ExclusionReason::Name,
                },
                SkippedFile {
                    identifier: "tmp2/test.txt".to_string(),
                    reason: ExclusionReason::Path,
                },
            ]
        );
    }

    #[test]
    fn test_duplicates_are_planned_independently() {
        let request = TransferRequest::new(["a.txt", "a.txt"], "out");
        let plan = TransferPlan::build(&request);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_identifier_is_used_verbatim_in_local_path() {
        let request = TransferRequest::new(["/tmp/Test.TXT"], "temp").exclude_names(["test.txt"]);
        let plan = TransferPlan::build(&request);
        assert_eq!(plan.transfers()[0].local_path, "temp//tmp/Test.TXT");
    }

    #[test]
    fn test_everything_excluded_yields_empty_plan() {
        let request = TransferRequest::new(sample_files(), "temp").exclude_names(["test.txt", "test2.txt"]);
        let plan = TransferPlan::build(&request);
        assert!(plan.is_empty());
        assert_eq!(plan.skipped().len(), 3);
    }
}
