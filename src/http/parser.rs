use crate::error::ParseError;
use crate::http::request::{Method, Request};

/// Locates the end of the request line.
///
/// Returns the length of the line (without terminator) and the number of
/// bytes consumed including the terminator. `\r\n` is the protocol
/// terminator; a bare `\n` is tolerated.
pub fn find_line_end(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = buf.iter().position(|&b| b == b'\n')?;
    if lf > 0 && buf[lf - 1] == b'\r' {
        Some((lf - 1, lf + 1))
    } else {
        Some((lf, lf + 1))
    }
}

/// Parses `METHOD SP PATH SP VERSION` from the start of `buf`.
///
/// Returns the request and the number of bytes consumed. Fails with
/// [`ParseError::Incomplete`] when no terminator has arrived yet; the caller
/// decides whether to read more or give up.
pub fn parse_request_line(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let (line_len, consumed) = find_line_end(buf).ok_or(ParseError::Incomplete)?;
    let line = &buf[..line_len];

    if line.is_empty() {
        return Err(ParseError::malformed("empty request line"));
    }
    if !line.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        return Err(ParseError::malformed("non-printable byte in request line"));
    }

    // All bytes are ASCII at this point.
    let line = std::str::from_utf8(line).map_err(|_| ParseError::malformed("invalid utf-8"))?;

    let mut parts = line.split(' ');
    let (Some(method), Some(path), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::malformed("expected exactly three tokens"));
    };

    if method.is_empty() || path.is_empty() || version.is_empty() {
        return Err(ParseError::malformed("empty token"));
    }

    let method =
        Method::from_token(method).ok_or_else(|| ParseError::UnsupportedMethod(method.to_string()))?;

    if !is_valid_version(version) {
        return Err(ParseError::InvalidVersion(version.to_string()));
    }

    Ok((Request::new(method, path, version), consumed))
}

fn is_valid_version(version: &str) -> bool {
    let Some(number) = version.strip_prefix("HTTP/") else {
        return false;
    };
    let mut digits = number.split('.');
    let major = digits.next().unwrap_or("");
    let minor = digits.next();

    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    numeric(major) && minor.is_none_or(numeric) && digits.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let (parsed, consumed) = parse_request_line(req).unwrap();

        assert_eq!(parsed.method, Method::GET);
        assert_eq!(parsed.path, "/");
        assert_eq!(parsed.version, "HTTP/1.1");
        assert_eq!(consumed, "GET / HTTP/1.1\r\n".len());
    }

    #[test]
    fn version_grammar() {
        assert!(is_valid_version("HTTP/1.1"));
        assert!(is_valid_version("HTTP/1.0"));
        assert!(is_valid_version("HTTP/2"));
        assert!(!is_valid_version("HTTP/"));
        assert!(!is_valid_version("HTTP/1."));
        assert!(!is_valid_version("HTTP/1.1.1"));
        assert!(!is_valid_version("http/1.1"));
        assert!(!is_valid_version("FTP/1.1"));
    }
}
