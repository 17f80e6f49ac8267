use super::core::{RenderDirective, ReturnValue};
use super::descriptor::InvocationDescriptor;
use crate::error::RenderError;
use crate::server::ServletResponse;
use std::io::{self, Read, Write};
use tracing::{debug, warn};

/// Placeholder substituted by the return value in redirect targets and view names.
pub const PLACEHOLDER: &str = "{}";

/// Apply the method's render directive to its return value.
///
/// Error, redirect and write directives answer the request themselves and yield `None`.
/// Otherwise the result is the view to render, if there is one. A declared default view
/// skips the error, redirect and write directives entirely.
///
/// # Errors
///
/// [`RenderError::NullWrite`] when a write directive gets no value, [`RenderError::Io`]
/// when streaming the value fails.
pub fn apply_directive(
    descriptor: &InvocationDescriptor,
    value: Option<ReturnValue>,
    res: &mut ServletResponse,
    default_buffer_size: usize,
) -> Result<Option<String>, RenderError> {
    let mut view = descriptor.default_view().map(str::to_string);

    if view.is_none() {
        match descriptor.directive() {
            RenderDirective::Error { status, message } => {
                let mut status = *status;
                let mut message = message.clone();
                match &value {
                    Some(ReturnValue::Integer(code)) => match u16::try_from(*code) {
                        Ok(code) if (100..=999).contains(&code) => status = code,
                        _ => warn!(
                            method = %descriptor.name(),
                            returned = *code,
                            status,
                            "Returned status out of range, keeping declared status"
                        ),
                    },
                    Some(other) => {
                        if let Some(text) = other.text() {
                            message = text;
                        }
                    }
                    None => {}
                }
                debug!(method = %descriptor.name(), status, message = %message, "Error directive");
                res.send_error(status, Some(&message));
                return Ok(None);
            }
            RenderDirective::Redirect { target } => {
                let mut to = target.clone();
                if let Some(text) = value.as_ref().and_then(ReturnValue::text) {
                    if to.is_empty() {
                        to = text;
                    } else if to.contains(PLACEHOLDER) {
                        to = to.replace(PLACEHOLDER, &text);
                    }
                }
                if !to.is_empty() {
                    debug!(method = %descriptor.name(), location = %to, "Redirect directive");
                    res.send_redirect(to);
                    return Ok(None);
                }
                // No target and nothing returned: fall through to the view logic.
            }
            RenderDirective::Write { buffer_size } => {
                let value = value.ok_or_else(|| RenderError::NullWrite {
                    method: format!("{}.{}", descriptor.controller(), descriptor.name()),
                })?;
                let written = write_value(value, buffer_size.unwrap_or(default_buffer_size), res)?;
                debug!(method = %descriptor.name(), bytes = written, "Write directive");
                return Ok(None);
            }
            RenderDirective::View => {}
        }
    }

    if let Some(text) = value.as_ref().and_then(ReturnValue::text) {
        view = match view {
            Some(v) if v.contains(PLACEHOLDER) => Some(v.replace(PLACEHOLDER, &text)),
            _ => Some(text),
        };
    }
    Ok(view)
}

/// Copy a return value into the response body, `buffer_size` bytes at a time.
///
/// Stream values are dropped (closed) once copied.
pub fn write_value(
    value: ReturnValue,
    buffer_size: usize,
    res: &mut ServletResponse,
) -> io::Result<u64> {
    match value {
        ReturnValue::Integer(i) => {
            let text = i.to_string();
            res.write_all(text.as_bytes())?;
            Ok(text.len() as u64)
        }
        ReturnValue::Value(text) => {
            res.write_all(text.as_bytes())?;
            Ok(text.len() as u64)
        }
        ReturnValue::Bytes(reader) | ReturnValue::Chars(reader) => {
            copy_chunked(reader, buffer_size.max(1), res)
        }
    }
}

fn copy_chunked(
    mut reader: Box<dyn Read + Send>,
    buffer_size: usize,
    res: &mut ServletResponse,
) -> io::Result<u64> {
    let mut buf = vec![0u8; buffer_size];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        res.write_all(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}
