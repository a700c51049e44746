//! Version and build information.

use std::fmt;

#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: Option<&'static str>,
    pub build_date: Option<&'static str>,
    pub target: &'static str,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "certcheck {}", self.version)?;
        if let Some(commit) = self.commit {
            write!(f, "\nCommit: {}", commit)?;
        }
        if let Some(date) = self.build_date {
            write!(f, "\nBuilt: {}", date)?;
        }
        write!(f, "\nTarget: {}", self.target)
    }
}

pub fn get_build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("CERTCHECK_GIT_HASH"),
        build_date: option_env!("CERTCHECK_BUILD_DATE"),
        target: option_env!("CERTCHECK_TARGET").unwrap_or(std::env::consts::ARCH),
    }
}
