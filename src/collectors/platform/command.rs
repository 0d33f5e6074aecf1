use anyhow::{Result, anyhow};
use serde::{Deserialize, Deserializer};
use tokio::process::Command;

/// Runs `cmd` and returns its trimmed stdout; a non-zero exit is an error
///
/// The child is killed when the returned future is dropped, e.g. on timeout.
pub async fn run_cmd(cmd: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(cmd)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| anyhow!("Failed to spawn {cmd}: {e}"))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(anyhow!("{cmd} exited with {}: {}", output.status, stderr.trim()))
    }
}

/// mmcli prints "--" for values it does not have
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty() && *v != "--")
}

pub fn de_string_to_f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match present(s.as_deref()) {
        None => Ok(None),
        Some(val) => val
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

pub fn de_string_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(present(s.as_deref()).map(str::to_string))
}

/// Parses a hexadecimal identifier as printed by mmcli (cell id, LAC, TAC)
pub fn parse_hex(value: Option<&str>) -> Option<i64> {
    i64::from_str_radix(present(value)?, 16).ok()
}
