//! Child-process plumbing for command-line collaborators.

use std::process::Command;

use tracing::debug;

use crate::errors::OpError;

const STDERR_SNIPPET_LIMIT: usize = 4096;

/// One external tool call: program name plus argument vector.
///
/// Building the invocation is split from running it so tests can assert on
/// the exact command line without the tool being installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    program: String,
    args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Rendered command line, for logs and diagnostics.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Runs the tool to completion and returns captured stdout. A non-zero
    /// exit status is an error carrying a bounded stderr snippet.
    pub fn run(&self) -> Result<Vec<u8>, OpError> {
        debug!(command = %self.command_line(), "running external tool");
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|source| OpError::Spawn { program: self.program.clone(), source })?;
        if !output.status.success() {
            let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            stderr.truncate(STDERR_SNIPPET_LIMIT);
            return Err(OpError::ToolFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }
        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_renders_program_and_args() {
        let inv = ToolInvocation::new("3dAutobox").arg("-input").arg("in.nii.gz");
        assert_eq!(inv.command_line(), "3dAutobox -input in.nii.gz");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = ToolInvocation::new("definitely-not-a-real-tool-xyz")
            .run()
            .expect_err("spawn fails");
        assert!(matches!(err, OpError::Spawn { .. }));
    }
}
