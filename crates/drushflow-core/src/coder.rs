//! Argument construction for `drush coder-review`.
//!
//! Coder changed its command-line syntax between 7.x-1 and 7.x-2, so the
//! installed version picks the dialect. Unknown versions are rejected rather
//! than guessed at.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::DrushError;

/// Rule groups accepted by Coder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewCategory {
    Style,
    Comment,
    Sql,
    Security,
    I18n,
}

impl ReviewCategory {
    pub const ALL: [ReviewCategory; 5] = [
        Self::Style,
        Self::Comment,
        Self::Sql,
        Self::Security,
        Self::I18n,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::Comment => "comment",
            Self::Sql => "sql",
            Self::Security => "security",
            Self::I18n => "i18n",
        }
    }
}

impl Display for ReviewCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewCategory {
    type Err = DrushError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| DrushError::UnexpectedShape {
                what: "review category",
                expected: "style, comment, sql, security or i18n",
            })
    }
}

/// The two incompatible flag syntaxes Coder has shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoderDialect {
    /// `coder-review minor checkstyle <review>...`
    V1,
    /// `coder-review --minor --checkstyle --reviews=<a,b>`; `patch` is the
    /// numeric release after `7.x-2.`, when there is one.
    V2 { patch: Option<u32> },
}

impl CoderDialect {
    pub fn detect(version: &str) -> Result<Self, DrushError> {
        if has_prefix(version, "7.x-2") {
            let patch = version
                .strip_prefix("7.x-2.")
                .and_then(|rest| rest.parse::<u32>().ok());
            Ok(Self::V2 { patch })
        } else if has_prefix(version, "7.x-1") {
            Ok(Self::V1)
        } else {
            Err(DrushError::UnsupportedCoder(version.to_string()))
        }
    }

    /// `--ignores-pass` exists from 7.x-2.4 on.
    pub fn supports_ignores_pass(self) -> bool {
        matches!(self, Self::V2 { patch: Some(p) } if p >= 4)
    }
}

fn has_prefix(version: &str, prefix: &str) -> bool {
    match version.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

/// Arguments for one review, plus what was left out and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPlan {
    pub dialect: CoderDialect,
    /// Everything after the global drush options, starting with `coder-review`.
    pub args: Vec<String>,
    /// Project names dropped because they collide with a category name.
    pub conflicts: Vec<String>,
    /// `--ignores-pass` was requested but this Coder cannot honour it.
    pub ignores_pass_dropped: bool,
}

/// Builds the `coder-review` arguments for the given Coder version.
///
/// Coder 7.x-2 fails with "use --reviews or --comment" when a project shares
/// a name with a review, so such projects are removed from the target list.
pub fn plan_review(
    version: &str,
    categories: &[ReviewCategory],
    projects: &[String],
    ignores_pass: bool,
) -> Result<ReviewPlan, DrushError> {
    let dialect = CoderDialect::detect(version)?;

    let mut args = vec!["coder-review".to_string()];
    match dialect {
        CoderDialect::V2 { .. } => {
            args.push("--minor".to_string());
            args.push("--checkstyle".to_string());
            let reviews = categories
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(",");
            args.push(format!("--reviews={reviews}"));
        }
        CoderDialect::V1 => {
            args.push("minor".to_string());
            args.push("checkstyle".to_string());
            args.extend(categories.iter().map(|c| c.as_str().to_string()));
        }
    }

    let mut ignores_pass_dropped = false;
    if ignores_pass {
        if dialect.supports_ignores_pass() {
            args.push("--ignores-pass".to_string());
        } else {
            ignores_pass_dropped = true;
        }
    }

    let (conflicts, kept): (Vec<String>, Vec<String>) = projects
        .iter()
        .cloned()
        .partition(|name| categories.iter().any(|c| c.as_str() == name.as_str()));
    args.extend(kept);

    Ok(ReviewPlan {
        dialect,
        args,
        conflicts,
        ignores_pass_dropped,
    })
}
