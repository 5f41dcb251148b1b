//! Transport error classification

use kelp_core::Error;
use std::error::Error as StdError;

/// Map a transport error onto the kelp error taxonomy
pub(crate) fn transport_error(err: reqwest::Error) -> Error {
    let message = error_chain(&err);

    if err.is_timeout() {
        Error::Timeout(message)
    } else if err.is_connect() {
        Error::Connect(message)
    } else if err.is_redirect() {
        Error::Redirect(message)
    } else if err.is_body() || err.is_decode() {
        Error::Body(message)
    } else {
        Error::Transport(message)
    }
}

fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_message = cause.to_string();
        if !message.contains(&cause_message) {
            message.push_str(": ");
            message.push_str(&cause_message);
        }
        source = cause.source();
    }
    message
}
