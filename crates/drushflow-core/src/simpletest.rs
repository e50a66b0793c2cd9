//! Simpletest test classes and the exclusion filter applied before a run.

use serde::Deserialize;

use crate::error::DrushError;

/// A test class reported by `drush test-run --format=json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TestCase {
    pub group: String,
    #[serde(rename = "class")]
    pub class_name: String,
}

pub fn parse_tests(text: &str) -> Result<Vec<TestCase>, DrushError> {
    serde_json::from_str::<Vec<TestCase>>(text).map_err(|source| DrushError::Malformed {
        what: "test listing",
        source,
    })
}

/// Groups and classes to leave out of a run. Matching is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct TestFilter {
    groups: Vec<String>,
    classes: Vec<String>,
}

impl TestFilter {
    pub fn new<G, C>(groups: G, classes: C) -> Self
    where
        G: IntoIterator,
        G::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            groups: normalize(groups),
            classes: normalize(classes),
        }
    }

    /// Builds a filter from comma-separated lists, as typed in a job form.
    pub fn from_lists(groups: &str, classes: &str) -> Self {
        Self::new(groups.split(','), classes.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.classes.is_empty()
    }

    pub fn excludes(&self, test: &TestCase) -> bool {
        self.groups.contains(&test.group.to_lowercase())
            || self.classes.contains(&test.class_name.to_lowercase())
    }

    /// Class names of the tests that survive the filter, sorted.
    pub fn targets(&self, tests: &[TestCase]) -> Vec<String> {
        let mut targets: Vec<String> = tests
            .iter()
            .filter(|test| !self.excludes(test))
            .map(|test| test.class_name.clone())
            .collect();
        targets.sort();
        targets.dedup();
        targets
    }
}

fn normalize<I>(values: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| v.as_ref().trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str =
        r#"[{"group":"Core","class":"FooTest"},{"group":"Contrib","class":"BarTest"}]"#;

    #[test]
    fn parses_test_listing() {
        let tests = parse_tests(LISTING).unwrap();
        assert_eq!(tests.len(), 2);
        assert_eq!(tests[0].group, "Core");
        assert_eq!(tests[0].class_name, "FooTest");
    }

    #[test]
    fn excludes_groups_case_insensitively() {
        let tests = parse_tests(LISTING).unwrap();
        let filter = TestFilter::from_lists("core", "");
        assert_eq!(filter.targets(&tests), vec!["BarTest".to_string()]);
    }

    #[test]
    fn excludes_classes_and_sorts_the_rest() {
        let tests = vec![
            TestCase {
                group: "A".into(),
                class_name: "ZedTest".into(),
            },
            TestCase {
                group: "A".into(),
                class_name: "AlphaTest".into(),
            },
            TestCase {
                group: "B".into(),
                class_name: "SkipMeTest".into(),
            },
        ];
        let filter = TestFilter::from_lists("", " skipmetest ,");
        assert_eq!(filter.targets(&tests), vec!["AlphaTest", "ZedTest"]);
    }

    #[test]
    fn blank_lists_make_an_empty_filter() {
        assert!(TestFilter::from_lists("", " , ").is_empty());
        assert!(!TestFilter::from_lists("Core", "").is_empty());
    }

    #[test]
    fn malformed_listing_is_an_error() {
        assert!(parse_tests("").is_err());
        assert!(parse_tests(r#"{"group":"Core"}"#).is_err());
        assert!(parse_tests(r#"[{"group":"Core"}]"#).is_err());
    }
}
