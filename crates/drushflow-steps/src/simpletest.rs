use anyhow::Result;
use drushflow_core::config::TestConfig;
use drushflow_core::TestFilter;
use tracing::{error, info, instrument, warn};

use crate::StepContext;

/// Enables Simpletest if needed and runs it, minus excluded groups and classes.
#[instrument(skip_all)]
pub fn run(ctx: &StepContext<'_>, cfg: &TestConfig) -> Result<bool> {
    let logs = ctx.ensure_logs_dir(&cfg.logs)?;
    let drush = ctx.drush(&cfg.root);
    let mut ok = true;

    if drush.is_extension_installed("simpletest", true) {
        info!(target: "drupal", "Simpletest is already enabled");
    } else {
        info!(target: "drupal", "Simpletest is not enabled. Enabling Simpletest...");
        ok &= drush.enable(&["simpletest"]);
    }

    let filter = TestFilter::new(&cfg.except_groups, &cfg.except_classes);
    let targets = if filter.is_empty() {
        Vec::new()
    } else {
        let tests = match drush.query_tests() {
            Ok(tests) => tests,
            Err(e) => {
                error!(target: "drupal", "Could not list tests to apply exclusions: {e}");
                return Ok(false);
            }
        };
        let targets = filter.targets(&tests);
        if targets.is_empty() {
            warn!(target: "drupal", "No tests left to run after exclusions, skipping Simpletest");
            return Ok(ok);
        }
        targets
    };

    ok &= drush.test_run(&logs, cfg.uri.as_deref(), &targets);
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeDrush;
    use drushflow_core::DrushSettings;

    const TESTS: &str =
        r#"[{"group":"Core","class":"FooTest"},{"group":"Contrib","class":"BarTest"}]"#;

    fn config(except_groups: &[&str]) -> TestConfig {
        TestConfig {
            uri: Some("http://localhost".to_string()),
            root: "drupal".into(),
            logs: "logs".into(),
            except_groups: except_groups.iter().map(|s| s.to_string()).collect(),
            except_classes: Vec::new(),
        }
    }

    #[test]
    fn enables_simpletest_and_runs_everything() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeDrush::new().reply("pm-list", "{}");
        let ctx = StepContext::new(dir.path(), DrushSettings::default(), &fake);

        assert!(run(&ctx, &config(&[])).unwrap());
        assert!(dir.path().join("logs").is_dir());

        let commands = fake.commands();
        assert_eq!(commands[1], "pm-enable simpletest");
        assert_eq!(
            commands[2],
            format!(
                "test-run --xml={} --uri=http://localhost --all",
                dir.path().join("logs").display()
            )
        );
    }

    #[test]
    fn filters_excluded_groups() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeDrush::new()
            .reply(
                "pm-list",
                r#"{"simpletest":{"type":"module","status":"enabled","version":"7.34"}}"#,
            )
            .reply("test-run", TESTS);
        let ctx = StepContext::new(dir.path(), DrushSettings::default(), &fake);

        assert!(run(&ctx, &config(&["core"])).unwrap());

        let commands = fake.commands();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[1], "test-run --format=json");
        assert!(commands[2].ends_with("--uri=http://localhost BarTest"));
    }

    #[test]
    fn skips_the_run_when_everything_is_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeDrush::new()
            .reply(
                "pm-list",
                r#"{"simpletest":{"type":"module","status":"enabled","version":"7.34"}}"#,
            )
            .reply("test-run", TESTS);
        let ctx = StepContext::new(dir.path(), DrushSettings::default(), &fake);

        assert!(run(&ctx, &config(&["Core", "Contrib"])).unwrap());
        assert!(!fake.commands().iter().any(|c| c.contains("--xml=")));
    }

    #[test]
    fn fails_when_the_test_listing_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeDrush::new()
            .reply(
                "pm-list",
                r#"{"simpletest":{"type":"module","status":"enabled","version":"7.34"}}"#,
            )
            .reply("test-run", "Drush command terminated abnormally");
        let ctx = StepContext::new(dir.path(), DrushSettings::default(), &fake);

        assert!(!run(&ctx, &config(&["Core"])).unwrap());
        assert!(!fake.commands().iter().any(|c| c.contains("--xml=")));
    }
}
