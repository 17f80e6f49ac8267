use std::collections::HashMap;
use std::io;

/// Canonical reason phrase for the status codes this layer produces.
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        302 => "Found",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        _ => "OK",
    }
}

/// The response a dispatch servlet writes into.
///
/// Errors and redirects are "committed" states: once `send_error` or `send_redirect`
/// ran, the surrounding HTTP layer answers with that status.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServletResponse {
    status: u16,
    message: Option<String>,
    headers: HashMap<String, String>,
    location: Option<String>,
    body: Vec<u8>,
    committed: bool,
}

impl ServletResponse {
    pub fn new() -> Self {
        Self {
            status: 200,
            ..Default::default()
        }
    }

    #[inline]
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Message attached by [`send_error`](Self::send_error), if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Answer with an error status; `None` or an empty message sends the status only.
    pub fn send_error(&mut self, status: u16, message: Option<&str>) {
        self.status = status;
        self.message = message.filter(|m| !m.is_empty()).map(str::to_string);
        self.body.clear();
        self.committed = true;
    }

    /// Answer with `302 Found` pointing at `location`.
    pub fn send_redirect(&mut self, location: impl Into<String>) {
        let location = location.into();
        self.status = 302;
        self.set_header("location", location.clone());
        self.location = Some(location);
        self.committed = true;
    }
}

impl io::Write for ServletResponse {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
