//! Remote command execution over SSH
//!
//! Uses the system OpenSSH client so the server inherits the user's default
//! key material and `known_hosts`:
//! - batch mode, never prompts for a password
//! - unknown host keys are accepted and recorded (trust on first use)
//! - the stored command is sent verbatim as a single remote command

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, info};

use crate::settings::SshConf;

/// Exit status used by the OpenSSH client for its own failures
const SSH_CLIENT_FAILURE: i32 = 255;

#[derive(Debug, thiserror::Error)]
pub enum SshError {
    #[error("failed to start ssh client: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("{0}")]
    Connection(String),
    #[error("invalid ssh extra arguments: {0}")]
    Args(#[from] shell_words::ParseError),
}

/// Result of a remote command that did reach the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOutput {
    pub stderr_lines: Vec<String>,
    pub exit_code: Option<i32>,
}

#[async_trait]
pub trait RemoteShell: Send + Sync {
    async fn exec(&self, username: &str, ip_address: &str, command: &str) -> Result<RemoteOutput, SshError>;
}

pub struct OpenSshShell {
    binary: String,
    extra_args: Vec<String>,
    connect_timeout_secs: Option<u32>,
}

impl OpenSshShell {
    pub fn from_conf(conf: &SshConf) -> Result<Self, SshError> {
        Ok(Self {
            binary: conf.binary.clone(),
            extra_args: conf.split_extra_args()?,
            connect_timeout_secs: conf.connect_timeout_secs,
        })
    }

    fn args(&self, username: &str, ip_address: &str, command: &str) -> Vec<String> {
        let mut args = self.extra_args.clone();
        args.extend(
            [
                "-o", "BatchMode=yes",
                "-o", "StrictHostKeyChecking=accept-new",
                "-o", "LogLevel=ERROR",
            ]
            .map(String::from),
        );
        if let Some(secs) = self.connect_timeout_secs {
            args.push("-o".into());
            args.push(format!("ConnectTimeout={secs}"));
        }
        args.push(format!("{username}@{ip_address}"));
        args.push(command.to_string());
        args
    }
}

#[async_trait]
impl RemoteShell for OpenSshShell {
    async fn exec(&self, username: &str, ip_address: &str, command: &str) -> Result<RemoteOutput, SshError> {
        info!(user = %username, ip = %ip_address, command = %command, "running remote command");

        let output = AsyncCommand::new(&self.binary)
            .args(self.args(username, ip_address, command))
            .stdin(Stdio::null())
            .output()
            .await?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code();

        if exit_code == Some(SSH_CLIENT_FAILURE) {
            let detail = stderr.trim();
            return Err(SshError::Connection(if detail.is_empty() {
                format!("ssh to {username}@{ip_address} failed (status {SSH_CLIENT_FAILURE})")
            } else {
                detail.to_string()
            }));
        }

        let stderr_lines: Vec<String> = stderr
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        debug!(?exit_code, stderr_lines = stderr_lines.len(), "remote command finished");

        Ok(RemoteOutput { stderr_lines, exit_code })
    }
}
