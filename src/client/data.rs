//! DATA transparency (RFC 5321 Section 4.5.2).

/// Prepares a message for transmission after a `354` reply.
///
/// Line endings are normalised to CRLF (a bare CR or a bare LF each become
/// one CRLF), every line starting with `.` gets an extra leading `.`, and the
/// terminating `CRLF.CRLF` is appended, completing an unterminated last line
/// first.
#[must_use]
pub fn encode(message: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(message.len() + message.len() / 32 + 5);
    let mut at_line_start = true;
    let mut bytes = message.iter().copied().peekable();

    while let Some(byte) = bytes.next() {
        match byte {
            b'\r' => {
                bytes.next_if_eq(&b'\n');
                out.extend_from_slice(b"\r\n");
                at_line_start = true;
            }
            b'\n' => {
                out.extend_from_slice(b"\r\n");
                at_line_start = true;
            }
            _ => {
                if at_line_start && byte == b'.' {
                    out.push(b'.');
                }
                out.push(byte);
                at_line_start = false;
            }
        }
    }

    if !at_line_start {
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b".\r\n");

    out
}
