//! File-based request/response client (spec.md §4.9), grounded on
//! `altium_script_client.py`'s `_send_command`: a known command path and
//! a known result path, single writer on each side, stale-response
//! guards because both files are polled rather than locked.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::ClientError;
use crate::protocol::{is_heavy, Request, Response};

const CONSUME_WAIT: Duration = Duration::from_secs(5);
const CONSUME_POLL: Duration = Duration::from_millis(100);
const CLEAR_ATTEMPTS: u32 = 10;
const CLEAR_RETRY_DELAY: Duration = Duration::from_millis(50);
const RESPONSE_POLL: Duration = Duration::from_millis(150);
const MAX_STALE_DISCARDS: usize = 5;
const ROUTINE_TIMEOUT: Duration = Duration::from_secs(10);
const HEAVY_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AltiumClient {
    command_file: PathBuf,
    result_file: PathBuf,
}

impl AltiumClient {
    pub fn new(command_file: impl Into<PathBuf>, result_file: impl Into<PathBuf>) -> Self {
        AltiumClient { command_file: command_file.into(), result_file: result_file.into() }
    }

    pub fn ping(&self) -> Result<bool, ClientError> {
        Ok(self.send(crate::protocol::ping())?.success)
    }

    /// Sends `request`, blocking until a validated response arrives or
    /// the action's timeout elapses.
    pub fn send(&self, request: Request) -> Result<Response, ClientError> {
        let action = request.action.clone();
        let timeout = if is_heavy(&action) { HEAVY_TIMEOUT } else { ROUTINE_TIMEOUT };

        self.wait_for_prior_command_consumed(&action);
        self.clear_response_file(&action)?;
        self.write_command_atomically(&request)?;

        tracing::debug!(action = %action, timeout_s = timeout.as_secs(), "command sent");
        self.await_response(&action, timeout)
    }

    fn wait_for_prior_command_consumed(&self, action: &str) {
        let start = Instant::now();
        while self.command_file.exists() {
            if start.elapsed() >= CONSUME_WAIT {
                tracing::warn!(action, "previous command file still present after 5s, overwriting");
                break;
            }
            std::thread::sleep(CONSUME_POLL);
        }
    }

    fn clear_response_file(&self, action: &str) -> Result<(), ClientError> {
        for _ in 0..CLEAR_ATTEMPTS {
            if !self.result_file.exists() {
                return Ok(());
            }
            match fs::remove_file(&self.result_file) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                    std::thread::sleep(CLEAR_RETRY_DELAY * 6);
                }
                Err(_) => return Ok(()),
            }
        }
        tracing::warn!(action, "could not delete stale response file after 10 attempts");
        Ok(())
    }

    fn write_command_atomically(&self, request: &Request) -> Result<(), ClientError> {
        let temp = temp_path(&self.command_file);
        fs::write(&temp, serde_json::to_vec(&request.to_json())?)?;
        fs::rename(&temp, &self.command_file)?;
        Ok(())
    }

    fn await_response(&self, action: &str, timeout: Duration) -> Result<Response, ClientError> {
        let start = Instant::now();
        let mut discarded = 0usize;

        while start.elapsed() < timeout {
            if self.result_file.exists() {
                std::thread::sleep(Duration::from_millis(50));
                let content = match fs::read_to_string(&self.result_file) {
                    Ok(c) if !c.trim().is_empty() => c,
                    _ => {
                        std::thread::sleep(RESPONSE_POLL);
                        continue;
                    }
                };
                let response: Response = match serde_json::from_str(&content) {
                    Ok(r) => r,
                    Err(_) => {
                        std::thread::sleep(RESPONSE_POLL);
                        continue;
                    }
                };

                if !response.action.is_empty() && response.action != action {
                    discarded += 1;
                    let _ = fs::remove_file(&self.result_file);
                    tracing::warn!(expected = action, got = %response.action, discarded, "stale response discarded");
                    if discarded >= MAX_STALE_DISCARDS {
                        return Err(ClientError::StaleResponse { action: action.to_string(), discarded });
                    }
                    std::thread::sleep(Duration::from_millis(300));
                    continue;
                }

                let _ = fs::remove_file(&self.result_file);
                if !response.success {
                    return Err(ClientError::AppError {
                        action: action.to_string(),
                        message: response.error.clone().unwrap_or_else(|| "applicator reported failure".into()),
                    });
                }
                return Ok(response);
            }
            std::thread::sleep(RESPONSE_POLL);
        }

        Err(ClientError::ContainerUnreachable { action: action.to_string(), timeout })
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".tmp");
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use tempfile::tempdir;

    fn write_response(path: &Path, body: serde_json::Value) {
        fs::write(path, serde_json::to_vec(&body).unwrap()).unwrap();
    }

    #[test]
    #[serial]
    fn send_writes_command_file_atomically() {
        let dir = tempdir().unwrap();
        let cmd = dir.path().join("cmd.json");
        let res = dir.path().join("res.json");
        let client = AltiumClient::new(&cmd, &res);

        // respond in a background thread so `send` doesn't block the full timeout
        let res_clone = res.clone();
        let responder = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            write_response(&res_clone, json!({"success": true, "action": "ping"}));
        });

        let response = client.send(crate::protocol::ping()).unwrap();
        responder.join().unwrap();
        assert!(response.success);
        assert!(!cmd.exists() || fs::read_to_string(&cmd).is_ok());
    }

    #[test]
    #[serial]
    fn send_rejects_app_error_response() {
        let dir = tempdir().unwrap();
        let cmd = dir.path().join("cmd.json");
        let res = dir.path().join("res.json");
        let client = AltiumClient::new(&cmd, &res);

        let res_clone = res.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(80));
            write_response(&res_clone, json!({"success": false, "action": "add_track", "error": "net not found"}));
        });

        let err = client.send(crate::protocol::add_track("VCC", 0.0, 0.0, 1.0, 1.0, 0.2, "Top")).unwrap_err();
        match err {
            ClientError::AppError { message, .. } => assert_eq!(message, "net not found"),
            other => panic!("expected AppError, got {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn send_discards_stale_response_before_accepting_real_one() {
        // Simulates a stale response reappearing mid-wait (e.g. a late
        // write from a previous command) rather than being present
        // before `send` runs its upfront clear.
        let dir = tempdir().unwrap();
        let cmd = dir.path().join("cmd.json");
        let res = dir.path().join("res.json");
        let client = AltiumClient::new(&cmd, &res);

        let res_clone = res.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            write_response(&res_clone, json!({"success": true, "action": "previous_command"}));
            std::thread::sleep(Duration::from_millis(400));
            write_response(&res_clone, json!({"success": true, "action": "ping"}));
        });

        let response = client.send(crate::protocol::ping()).unwrap();
        assert!(response.success);
    }
}
