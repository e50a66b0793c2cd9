use anyhow::Result;
use drushflow_core::config::InstallConfig;
use tracing::{info, instrument};

use crate::StepContext;

/// Installs the site unless one is already there, then optionally runs `updatedb`.
#[instrument(skip_all, fields(profile = %cfg.profile))]
pub fn run(ctx: &StepContext<'_>, cfg: &InstallConfig) -> Result<bool> {
    let drush = ctx.drush(&cfg.root);
    let mut ok = true;

    if cfg.refresh {
        info!(target: "drupal", "Refresh requested, reinstalling Drupal...");
        ok &= drush.site_install(&cfg.db_url, &cfg.profile);
    } else if !drush.is_site_installed() {
        info!(target: "drupal", "No Drupal installation detected, installing Drupal...");
        ok &= drush.site_install(&cfg.db_url, &cfg.profile);
    } else {
        info!(target: "drupal", "Drupal is already installed, skipping installation");
    }

    if cfg.update_db {
        ok &= drush.update_db();
    }

    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeDrush;
    use drushflow_core::DrushSettings;

    fn install(refresh: bool, update_db: bool) -> InstallConfig {
        InstallConfig {
            db_url: "mysql://u:p@db/site".to_string(),
            root: "drupal".into(),
            profile: "standard".to_string(),
            refresh,
            update_db,
        }
    }

    #[test]
    fn installs_when_no_site_is_detected() {
        let fake = FakeDrush::new().reply("status", "{}");
        let ctx = StepContext::new("/ws", DrushSettings::default(), &fake);

        assert!(run(&ctx, &install(false, false)).unwrap());
        assert_eq!(
            fake.commands(),
            vec![
                "status --format=json",
                "site-install standard --db-url=mysql://u:p@db/site"
            ]
        );
        assert_eq!(fake.calls()[1].args[2], "--root=/ws/drupal");
    }

    #[test]
    fn skips_installed_site_but_still_updates() {
        let fake = FakeDrush::new().reply("status", r#"{"db-name":"site"}"#);
        let ctx = StepContext::new("/ws", DrushSettings::default(), &fake);

        assert!(run(&ctx, &install(false, true)).unwrap());
        assert_eq!(fake.commands(), vec!["status --format=json", "updatedb"]);
    }

    #[test]
    fn refresh_reinstalls_without_asking() {
        let fake = FakeDrush::new().reply("status", r#"{"db-name":"site"}"#);
        let ctx = StepContext::new("/ws", DrushSettings::default(), &fake);

        assert!(run(&ctx, &install(true, false)).unwrap());
        assert_eq!(
            fake.commands(),
            vec!["site-install standard --db-url=mysql://u:p@db/site"]
        );
    }
}
