use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimaryCommand {
    Init,
    Make,
    Install,
    Test,
    Review,
    Status,
    List,
    Run,
}

impl PrimaryCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Make => "make",
            Self::Install => "install",
            Self::Test => "test",
            Self::Review => "review",
            Self::Status => "status",
            Self::List => "list",
            Self::Run => "run",
        }
    }

    /// Whether the command is a build step that may appear in a pipeline profile.
    pub fn is_step(self) -> bool {
        matches!(self, Self::Make | Self::Install | Self::Test | Self::Review)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandRef {
    pub primary: PrimaryCommand,
    pub selector: Option<String>,
}

impl CommandRef {
    pub fn canonical(&self) -> String {
        match &self.selector {
            Some(selector) => format!("{}:{}", self.primary.as_str(), selector),
            None => self.primary.as_str().to_string(),
        }
    }
}

impl Display for CommandRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("unknown command '{0}'")]
    UnknownPrimary(String),
    #[error("empty selector in '{0}'")]
    EmptySelector(String),
}

impl FromStr for CommandRef {
    type Err = CommandParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.splitn(2, ':');
        let primary_text = parts.next().unwrap_or_default().trim();
        let selector = parts.next().map(|s| s.trim().to_owned());

        let primary = match primary_text {
            "init" => PrimaryCommand::Init,
            "make" => PrimaryCommand::Make,
            "install" => PrimaryCommand::Install,
            "test" => PrimaryCommand::Test,
            "review" => PrimaryCommand::Review,
            "status" => PrimaryCommand::Status,
            "list" => PrimaryCommand::List,
            "run" => PrimaryCommand::Run,
            _ => return Err(CommandParseError::UnknownPrimary(primary_text.to_string())),
        };

        if selector.as_deref() == Some("") {
            return Err(CommandParseError::EmptySelector(value.to_string()));
        }

        Ok(Self { primary, selector })
    }
}
