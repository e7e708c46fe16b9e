//! Output formatting module.
//!
//! [`ChatFormatter`] turns results into size-limited chat messages; the terminal
//! printers back the command-line front end, in styled text or JSON.

mod chat;
mod json_format;
mod plain;

pub use chat::{chunk_message, ChatFormatter};
pub use json_format::print_json;
pub use plain::{
    print_error, print_info, print_reachability, print_scan, print_success, print_whois,
};
