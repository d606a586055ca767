//! Text codec for the object-gateway protocol.
//!
//! Commands are newline-separated parts closed by an `e` line. Each argument
//! part is a one-character type tag followed by its payload. Replies are a
//! single line: `!y` + typed value on success, `!x` + payload on error.

use super::{Arg, GatewayError, RemoteHandle, RemoteValue};

pub const END_COMMAND: &str = "e\n";

const CALL: &str = "c\n";
const CONSTRUCT: &str = "i\n";
const ARRAY: &str = "a\n";
const ARRAY_CREATE: &str = "c\n";
const ARRAY_SET: &str = "s\n";
const ARRAY_GET: &str = "g\n";
const ARRAY_LEN: &str = "e\n";
const AUTH: &str = "A\n";

const STATIC_PREFIX: &str = "z:";

/// A decoded reply line, before any array has been read back.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Value(RemoteValue),
    /// A Java array; its elements still live on the engine side.
    Array(RemoteHandle),
}

pub fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}

pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn double_part(v: f64) -> String {
    if v.is_nan() {
        "dNaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "dInfinity".to_string()
        } else {
            "d-Infinity".to_string()
        }
    } else {
        format!("d{:?}", v)
    }
}

fn integer_part(v: i64) -> String {
    if i32::try_from(v).is_ok() {
        format!("i{}", v)
    } else {
        format!("L{}", v)
    }
}

pub fn reference_part(handle: &RemoteHandle) -> String {
    format!("r{}", handle.as_str())
}

/// Encode a scalar argument. Arrays have to be created on the engine first.
pub fn encode_arg(arg: &Arg) -> Result<String, GatewayError> {
    Ok(match arg {
        Arg::Integer(v) => integer_part(*v),
        Arg::Long(v) => format!("L{}", v),
        Arg::Double(v) => double_part(*v),
        Arg::Boolean(v) => format!("b{}", v),
        Arg::String(s) => format!("s{}", escape(s)),
        Arg::Null => "n".to_string(),
        Arg::Object(h) => reference_part(h),
        Arg::IntArray(_) | Arg::LongArray(_) | Arg::DoubleArray(_) | Arg::BooleanArray(_) => {
            return Err(GatewayError::InvalidArgument(
                "array arguments must be materialized before encoding".to_string(),
            ))
        }
    })
}

/// Java element type name and encoded cells of an array argument.
pub fn array_parts(arg: &Arg) -> Option<(&'static str, Vec<String>)> {
    match arg {
        Arg::IntArray(v) => Some(("int", v.iter().map(|x| integer_part(*x)).collect())),
        Arg::LongArray(v) => Some(("long", v.iter().map(|x| format!("L{}", x)).collect())),
        Arg::DoubleArray(v) => Some(("double", v.iter().map(|x| double_part(*x)).collect())),
        Arg::BooleanArray(v) => Some(("boolean", v.iter().map(|x| format!("b{}", x)).collect())),
        _ => None,
    }
}

fn with_args(mut command: String, parts: &[String]) -> String {
    for part in parts {
        command.push_str(part);
        command.push('\n');
    }
    command.push_str(END_COMMAND);
    command
}

pub fn call_command(target: &str, method: &str, parts: &[String]) -> String {
    with_args(format!("{CALL}{target}\n{method}\n"), parts)
}

pub fn static_target(class: &str) -> String {
    format!("{STATIC_PREFIX}{class}")
}

pub fn construct_command(class: &str, parts: &[String]) -> String {
    with_args(format!("{CONSTRUCT}{class}\n"), parts)
}

pub fn array_create_command(element_type: &str, len: usize) -> String {
    with_args(
        format!("{ARRAY}{ARRAY_CREATE}"),
        &[format!("s{}", element_type), integer_part(len as i64)],
    )
}

pub fn array_set_command(array: &RemoteHandle, index: usize, value_part: &str) -> String {
    with_args(
        format!("{ARRAY}{ARRAY_SET}"),
        &[
            reference_part(array),
            integer_part(index as i64),
            value_part.to_string(),
        ],
    )
}

pub fn array_get_command(array: &RemoteHandle, index: usize) -> String {
    with_args(
        format!("{ARRAY}{ARRAY_GET}"),
        &[reference_part(array), integer_part(index as i64)],
    )
}

pub fn array_len_command(array: &RemoteHandle) -> String {
    with_args(format!("{ARRAY}{ARRAY_LEN}"), &[reference_part(array)])
}

pub fn auth_command(token: &str) -> String {
    format!("{AUTH}{}\n", escape(token))
}

fn protocol(msg: impl Into<String>) -> GatewayError {
    GatewayError::Protocol(msg.into())
}

fn decode_value(payload: &str) -> Result<Reply, GatewayError> {
    let mut chars = payload.chars();
    let tag = chars.next().ok_or_else(|| protocol("empty return value"))?;
    let body = chars.as_str();
    let value = match tag {
        'v' => RemoteValue::Void,
        'n' => RemoteValue::Null,
        'i' | 'L' => RemoteValue::Integer(
            body.parse()
                .map_err(|_| protocol(format!("bad integer '{}'", body)))?,
        ),
        'd' | 'D' => RemoteValue::Double(
            body.parse()
                .map_err(|_| protocol(format!("bad double '{}'", body)))?,
        ),
        'b' => match body {
            "true" => RemoteValue::Boolean(true),
            "false" => RemoteValue::Boolean(false),
            _ => return Err(protocol(format!("bad boolean '{}'", body))),
        },
        's' => RemoteValue::String(unescape(body)),
        // Plain references, lists, sets, maps and iterators are all objects here.
        'r' | 'l' | 'h' | 'a' | 'g' => RemoteValue::Object(RemoteHandle::new(body)),
        't' => return Ok(Reply::Array(RemoteHandle::new(body))),
        other => return Err(protocol(format!("unsupported return type '{}'", other))),
    };
    Ok(Reply::Value(value))
}

/// Decode one reply line (trailing newline optional).
pub fn decode_reply(line: &str) -> Result<Reply, GatewayError> {
    let line = line.trim_end_matches(['\n', '\r']);
    let rest = line
        .strip_prefix('!')
        .ok_or_else(|| protocol(format!("reply without return marker: '{}'", line)))?;
    let mut chars = rest.chars();
    match chars.next() {
        Some('y') => decode_value(chars.as_str()),
        Some('x') | Some('z') => {
            let payload = chars.as_str();
            let message = match payload.strip_prefix('s') {
                Some(msg) => unescape(msg),
                None => payload.to_string(),
            };
            Err(GatewayError::Remote(message))
        }
        _ => Err(protocol(format!("unknown reply status in '{}'", line))),
    }
}
