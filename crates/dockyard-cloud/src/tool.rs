use std::fmt;

/// External command-line tools dockyard drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Docker,
    Git,
    Gh,
}

impl Tool {
    pub fn program(self) -> &'static str {
        match self {
            Self::Docker => "docker",
            Self::Git => "git",
            Self::Gh => "gh",
        }
    }

    pub fn install_hint(self) -> &'static str {
        match self {
            Self::Docker => "https://docs.docker.com/engine/install/",
            Self::Git => "https://git-scm.com/downloads",
            Self::Gh => "https://cli.github.com",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{tool} is not installed (see {})", tool.install_hint())]
    NotFound { tool: Tool, source: std::io::Error },

    #[error("could not run {tool}")]
    Io { tool: Tool, source: std::io::Error },

    #[error("{tool} command failed: {args:?}\n{stderr}")]
    CommandFailed {
        tool: Tool,
        args: Vec<String>,
        stderr: String,
    },

    #[error("{tool} output was not valid UTF-8")]
    InvalidUtf8 {
        tool: Tool,
        source: std::string::FromUtf8Error,
    },

    #[error("failed to write to {tool} stdin")]
    StdinWrite { tool: Tool, source: std::io::Error },
}
