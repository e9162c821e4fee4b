//! Human-readable error descriptions and structured JSON error formatting.

use gluview_api::ApiError;
use gluview_core::MonitorError;

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(me) = err.downcast_ref::<MonitorError>() {
        return match me {
            MonitorError::Auth(msg) => format!(
                "What happened: The vendor API refused authentication ({msg}).\nLikely causes: Wrong email/password, or the LibreLinkUp account has no sharing connection.\nHow to fix: Check GLUVIEW_EMAIL / GLUVIEW_PASSWORD and confirm the account sees a patient in the LibreLinkUp app."
            ),
            MonitorError::Timeout => {
                "What happened: The vendor API did not answer within the configured timeout.\nLikely causes: Slow network or a vendor outage.\nHow to fix: Retry, or raise api.timeout_ms in the config.".to_string()
            }
            MonitorError::Source(msg) => format!(
                "What happened: Fetching readings failed ({msg}).\nLikely causes: No connectivity or a vendor-side error.\nHow to fix: Check the network and retry; the monitor keeps showing stored history meanwhile."
            ),
            MonitorError::Storage(msg) => format!(
                "What happened: Reading or writing the history file failed ({msg}).\nLikely causes: Missing directory or no write permission at storage.history_path.\nHow to fix: Point storage.history_path at a writable location."
            ),
            MonitorError::Data(msg) => format!(
                "What happened: The vendor response could not be interpreted ({msg}).\nLikely causes: An API format change.\nHow to fix: Re-run with --log-level=debug and file an issue with the log."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(ae) = err.downcast_ref::<ApiError>() {
        if matches!(ae, ApiError::MissingCredentials) {
            return "What happened: No account credentials were found.\nLikely causes: GLUVIEW_EMAIL / GLUVIEW_PASSWORD are not set in the environment.\nHow to fix: Export both variables, or run with --simulate to try the monitor offline.".to_string();
        }
        return format!(
            "What happened: {ae}.\nLikely causes: Vendor API trouble.\nHow to fix: Re-run with --log-level=debug for the full exchange."
        );
    }

    // String-based heuristics for errors coming from init or config; scan
    // the whole chain so wrapped contexts do not hide the detail.
    let msg = err.to_string();
    let chain = err
        .chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ");
    let lower = chain.to_ascii_lowercase();

    if lower.contains("invalid configuration")
        || lower.contains("must be")
        || lower.contains("must not")
    {
        return format!(
            "What happened: Configuration is invalid ({}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/gluview.toml for a sample.",
            err.root_cause()
        );
    }

    if lower.contains("config") && (lower.contains("no such file") || lower.contains("not found")) {
        return format!(
            "What happened: The config file could not be read.\nLikely causes: Wrong --config path.\nHow to fix: Pass --config <FILE> or create the default etc/gluview.toml. Original: {msg}"
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per failure family; unknown errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(me) = err.downcast_ref::<MonitorError>() {
        return match me {
            MonitorError::Auth(_) => 2,
            MonitorError::Timeout | MonitorError::Source(_) => 3,
            MonitorError::Storage(_) => 4,
            _ => 1,
        };
    }
    if let Some(ae) = err.downcast_ref::<ApiError>() {
        return match ae {
            ApiError::MissingCredentials
            | ApiError::Unauthorized
            | ApiError::LoginRejected(_) => 2,
            ApiError::Timeout | ApiError::Transport(_) | ApiError::Status(_) => 3,
            _ => 1,
        };
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(me) = err.downcast_ref::<MonitorError>() {
        return match me {
            MonitorError::Auth(_) => "Auth",
            MonitorError::Timeout => "Timeout",
            MonitorError::Source(_) => "Source",
            MonitorError::Storage(_) => "Storage",
            MonitorError::Data(_) => "Data",
            MonitorError::Config(_) => "Config",
            MonitorError::State(_) => "State",
        };
    }
    if let Some(ae) = err.downcast_ref::<ApiError>() {
        return match ae {
            ApiError::MissingCredentials | ApiError::Unauthorized | ApiError::LoginRejected(_) => {
                "Auth"
            }
            ApiError::Timeout => "Timeout",
            _ => "Source",
        };
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "message": humanize(err),
    })
    .to_string()
}
