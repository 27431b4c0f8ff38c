use std::fmt;

use crate::generators::GeneratorNotFound;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    InvalidArgs,
    RunFailed,
    WriteFailed,
}

impl ExitCode {
    pub const fn as_i32(self) -> i32 {
        match self {
            ExitCode::InvalidArgs => 2,
            ExitCode::RunFailed => 10,
            ExitCode::WriteFailed => 20,
        }
    }
}

#[derive(Debug)]
pub struct ExitError {
    pub code: ExitCode,
    pub err: anyhow::Error,
}

impl ExitError {
    pub fn new(code: ExitCode, err: anyhow::Error) -> Self {
        Self { code, err }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.err.fmt(f)
    }
}

impl std::error::Error for ExitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.err.as_ref())
    }
}

pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(exit) = err.downcast_ref::<ExitError>() {
        return exit.code.as_i32();
    }
    if err.downcast_ref::<GeneratorNotFound>().is_some() {
        return ExitCode::InvalidArgs.as_i32();
    }
    if err.chain().any(|cause| cause.is::<std::io::Error>()) {
        return ExitCode::WriteFailed.as_i32();
    }
    ExitCode::RunFailed.as_i32()
}

pub fn invalid_args(message: impl Into<String>) -> anyhow::Error {
    ExitError::new(ExitCode::InvalidArgs, anyhow::anyhow!(message.into())).into()
}

pub fn invalid_args_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::InvalidArgs, err).into()
}

pub fn write_failed_err(err: anyhow::Error) -> anyhow::Error {
    ExitError::new(ExitCode::WriteFailed, err).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(exit_code(&invalid_args("bad flag")), 2);
        assert_eq!(exit_code(&write_failed_err(anyhow::anyhow!("disk full"))), 20);
        assert_eq!(exit_code(&anyhow::anyhow!("plugin fault")), 10);
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(exit_code(&anyhow::Error::new(io).context("writing test")), 20);

        let not_found = GeneratorNotFound {
            name: "nope".to_string(),
            available: vec!["dummy".to_string()],
        };
        assert_eq!(exit_code(&anyhow::Error::new(not_found)), 2);
    }
}
