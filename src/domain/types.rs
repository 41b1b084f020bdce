//! Shared domain enumerations aligned with deployment configuration values.

use std::str::FromStr;

use serde::Serialize;

/// Deployment mode reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Default,
    Demo,
    Pr,
    CloudBeta,
    Development,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Default => "default",
            Mode::Demo => "demo",
            Mode::Pr => "pr",
            Mode::CloudBeta => "cloud_beta",
            Mode::Development => "development",
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Mode::Default),
            "demo" => Ok(Mode::Demo),
            "pr" => Ok(Mode::Pr),
            "cloud_beta" | "cloud-beta" => Ok(Mode::CloudBeta),
            "development" | "dev" => Ok(Mode::Development),
            other => Err(format!("unknown mode `{other}`")),
        }
    }
}

/// How the instance was installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallType {
    #[default]
    Unknown,
    DockerImage,
    Bash,
    Heroku,
}

impl FromStr for InstallType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unknown" => Ok(InstallType::Unknown),
            "docker_image" | "docker" => Ok(InstallType::DockerImage),
            "bash" => Ok(InstallType::Bash),
            "heroku" => Ok(InstallType::Heroku),
            other => Err(format!("unknown install type `{other}`")),
        }
    }
}
