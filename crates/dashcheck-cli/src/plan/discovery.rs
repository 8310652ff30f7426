//! Plan discovery - find `*.check.toml` files under a directory

use super::{CheckPlan, PLAN_SUFFIX};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every plan found under a root
#[derive(Debug, Default)]
pub struct PlanSet {
    /// Loaded plans, sorted by path
    pub plans: Vec<CheckPlan>,
    /// Files that failed to load
    pub parse_errors: Vec<(PathBuf, String)>,
}

impl PlanSet {
    /// Discover all check plans in a directory tree
    pub fn discover(root: &Path) -> Self {
        let mut set = PlanSet::default();

        let mut paths: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| is_plan_file(path))
            .collect();
        paths.sort();

        for path in paths {
            match CheckPlan::load(&path) {
                Ok(plan) => set.plans.push(plan),
                Err(e) => set
                    .parse_errors
                    .push((path, format!("{:#}", anyhow::Error::from(e)))),
            }
        }

        set
    }

    /// Keep tests whose name or suite contains `pattern`
    pub fn filter(&self, pattern: &str) -> Self {
        let plans = self
            .plans
            .iter()
            .filter_map(|plan| {
                let suites: Vec<_> = plan
                    .suites
                    .iter()
                    .filter_map(|suite| {
                        let mut suite = suite.clone();
                        if !suite.name.contains(pattern) {
                            suite.tests.retain(|t| t.name.contains(pattern));
                        }
                        (!suite.tests.is_empty()).then_some(suite)
                    })
                    .collect();
                (!suites.is_empty()).then(|| CheckPlan {
                    suites,
                    ..plan.clone()
                })
            })
            .collect();

        PlanSet {
            plans,
            parse_errors: Vec::new(),
        }
    }

    /// Check if the set has any tests
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get count of tests
    pub fn len(&self) -> usize {
        self.plans.iter().map(CheckPlan::test_count).sum()
    }
}

fn is_plan_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(PLAN_SUFFIX))
}
