use anyhow::Result;
use asyncbox::Truthy;
use serde::Serialize;
use std::io;
use tokio::process::Command;

/// An external command given on the command line after `--`.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn from_argv(argv: Vec<String>) -> Result<Self> {
        let mut argv = argv.into_iter();
        let program = argv
            .next()
            .ok_or_else(|| anyhow::anyhow!("No command given. Pass one after `--`."))?;

        Ok(Self {
            program,
            args: argv.collect(),
        })
    }

    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs the command to completion, capturing its output.
    ///
    /// A non-zero exit is reported through [`CommandRun::success`]; only a
    /// failure to launch the process is an error.
    pub async fn run_once(&self) -> io::Result<CommandRun> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await?;

        let run = CommandRun {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(
            program = %self.program,
            success = run.success,
            code = ?run.code,
            "Command finished"
        );
        Ok(run)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandRun {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    pub stdout: String,
    #[serde(skip_serializing)]
    pub stderr: String,
}

impl CommandRun {
    pub fn exit_description(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "termination by signal".to_string(),
        }
    }
}

impl Truthy for CommandRun {
    fn is_truthy(&self) -> bool {
        self.success
    }
}
