//! `get` and `send` command handlers
//!
//! Both commands build [`FetchOptions`] from their arguments, apply the
//! per-call overrides on top of the configured defaults and print the
//! response.

use crate::cli::{GetArgs, RequestArgs, SendArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::{apply_progress, OutputWriter};
use rebound_core::{CancelHandle, FetchOptions, Fetcher, MultipartForm, PendingRequests, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Handle the get command
pub async fn handle_get(args: GetArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let options = FetchOptions::new().with_method("GET");
    execute(&args.url, options, &args.request, config, output).await
}

/// Handle the send command
pub async fn handle_send(args: SendArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let options = FetchOptions::new()
        .with_method(args.method.to_uppercase())
        .with_read(args.read);
    let options = attach_body(options, &args)?;
    execute(&args.url, options, &args.request, config, output).await
}

/// Put the body selected by `--data`, `--json`, `--file` or `--binary` on the request
fn attach_body(options: FetchOptions, args: &SendArgs) -> Result<FetchOptions> {
    if !args.fields.is_empty() && args.file.is_none() {
        return Err(Error::invalid_args("--field can only be used together with --file"));
    }

    if let Some(text) = &args.data {
        return Ok(options.with_text(text.clone()));
    }

    if let Some(json) = &args.json {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| Error::invalid_args(format!("--json is not valid JSON: {}", e)))?;
        return Ok(options.with_json(&value)?);
    }

    if let Some(path) = &args.file {
        if !path.exists() {
            return Err(Error::FileNotFound { path: path.clone() });
        }
        let mut form = MultipartForm::new().file(args.file_field.clone(), path)?;
        for field in &args.fields {
            let (name, value) = parse_field(field)?;
            form = form.text(name, value);
        }
        return Ok(options.with_multipart(form));
    }

    if let Some(path) = &args.binary {
        if !path.exists() {
            return Err(Error::FileNotFound { path: path.clone() });
        }
        let bytes = std::fs::read(path)?;
        return Ok(options.with_bytes(bytes));
    }

    Ok(options)
}

/// Shared request flow for both commands
async fn execute(
    url: &str,
    options: FetchOptions,
    request: &RequestArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("fetch", url);

    let mut options = options;
    for header in &request.headers {
        let (name, value) = parse_header(header)?;
        options = options.with_header(name, value);
    }
    if let Some(retryable) = request.retryable {
        options = options.with_retryable(retryable);
    }

    // The deadline covers every attempt and wait, not a single exchange
    let cancel = CancelHandle::new();
    let deadline = request
        .timeout_secs
        .map(|secs| cancel.cancel_after(Duration::from_secs(secs)));
    options = options.with_cancel(cancel);

    let progress = if config.output.progress && options.body.is_binary_form() {
        output.upload_bar(0)
    } else {
        None
    };
    if let Some(bar) = &progress {
        let bar = bar.clone();
        options = options.on_upload_progress(move |event| apply_progress(&bar, event));
    }

    let tracker = Arc::new(PendingRequests::new());
    let fetcher = Fetcher::from_config(config.fetch.clone())?.with_tracker(tracker.clone());

    let max_attempts = request.attempts.unwrap_or(config.fetch.max_attempts);
    let base_delay = request
        .base_delay_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.fetch.base_delay());
    let offline_retry = config.fetch.offline_retry && !request.no_offline_retry;

    info!(
        url,
        max_attempts,
        base_delay_ms = base_delay.as_millis() as u64,
        offline_retry,
        "Sending request"
    );

    let result = fetcher
        .fetch_with(url, options, max_attempts, base_delay, offline_retry)
        .await;

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }
    if let Some(deadline) = deadline {
        deadline.abort();
    }
    debug!(idle = tracker.is_idle(), "Request concluded");

    let response = result?;
    print_response(&response, request, config, output)
}

fn print_response(
    response: &Response,
    request: &RequestArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    match &request.save_to {
        Some(path) => {
            std::fs::write(path, response.bytes())?;
            output.success(&format!(
                "✓ HTTP {} - saved {} bytes to {}",
                response.status(),
                response.bytes().len(),
                path.display()
            ))
        }
        None => output.response(response, request.include || config.output.show_headers),
    }
}

/// Parse a `Name: value` header argument
fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| Error::invalid_args(format!("header '{}' must look like 'Name: value'", raw)))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid_args(format!("header '{}' has an empty name", raw)));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Parse a `name=value` form field argument
fn parse_field(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(Error::invalid_args(format!("field '{}' must look like 'name=value'", raw))),
    }
}
