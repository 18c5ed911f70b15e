//! Positional argument handling for the alert-script entry point.
//!
//! SeisComP alert hooks call the dispatcher as `<message> <flag> <event_id> ...`,
//! so the event id is the third positional argument and anything after it
//! is ignored.

/// Zero-based position of the event id among the positional arguments.
pub const EVENT_ID_POSITION: usize = 2;

pub const DISPATCH_USAGE: &str = "Usage: shakemap-dispatch <message> <flag> <EventID> [...]";

/// Event id from the raw positional arguments, if enough were given.
pub fn event_id(positionals: &[String]) -> Option<&str> {
    positionals
        .get(EVENT_ID_POSITION)
        .map(String::as_str)
        .filter(|id| !id.is_empty())
}
