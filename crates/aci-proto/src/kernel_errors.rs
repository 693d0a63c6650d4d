//! Kernel error texts.
//!
//! Exact codes are looked up first, then the error class. Codes with no
//! entry have no text here; callers fall back to the error-text buffer the
//! stub fills on failure.

use crate::codes::ErrorCode;

/// Explanation for a kernel or interface error code.
pub fn message(code: ErrorCode) -> Option<&'static str> {
    if let Some(text) = exact(code) {
        return Some(text);
    }
    class_text(code.class()?)
}

fn exact(code: ErrorCode) -> Option<&'static str> {
    Some(match code.as_bytes() {
        b"00000000" => "Successful response",
        b"00740074" => "Wait timeout occurred",
        b"02150373" => "Transport timeout occurred",
        b"00200003" => "Broker not reachable",
        b"00200005" => "Kernel not active",
        b"00200009" => "Invalid API version",
        b"00200094" => "Transport module not loaded",
        _ => return None,
    })
}

fn class_text(class: u16) -> Option<&'static str> {
    Some(match class {
        2 => "User does not exist",
        3 => "Conversation ended",
        7 => "Service not registered",
        8 => "Invalid conversation ID",
        10 => "Invalid parameter",
        12 => "Broker function not allowed",
        20 => "Interface error in the broker stub",
        21 => "Wrong API version for this function",
        74 => "Wait timeout",
        80 => "Security violation",
        215 => "Transport error",
        _ => return None,
    })
}
