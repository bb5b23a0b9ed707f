//! Request classification and canned responses.
//!
//! The router only looks for fixed tokens in the raw bytes of the first
//! read; there is no HTTP parser.  The same bytes always yield the same
//! [`Route`].
//!
//! | Tokens present                       | Route      |
//! |--------------------------------------|------------|
//! | `GET / ` without `Upgrade: websocket`| `Index`    |
//! | `GET / ` with `Upgrade: websocket`   | `Upgrade`  |
//! | `GET /main.js ` etc.                 | `Asset`    |
//! | `GET /`                              | `NotFound` |
//! | none of the above                    | `Reject`   |

use std::io::{self, Write};

use super::assets::{self, Asset};

const ROOT_TOKEN: &[u8] = b"GET / ";
const PREFIX_TOKEN: &[u8] = b"GET /";
const UPGRADE_HEADER: &[u8] = b"upgrade: websocket";

/// Where a request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Index,
    Upgrade,
    Asset(&'static Asset),
    NotFound,
    /// Not a recognisable request.  Close without a response.
    Reject,
}

pub fn classify(request: &[u8]) -> Route {
    if contains(request, ROOT_TOKEN) {
        return if contains_ignore_case(request, UPGRADE_HEADER) {
            Route::Upgrade
        } else {
            Route::Index
        };
    }
    for asset in assets::STATIC_ASSETS {
        if contains_request_for(request, asset.path) {
            return Route::Asset(asset);
        }
    }
    if contains(request, PREFIX_TOKEN) {
        return Route::NotFound;
    }
    Route::Reject
}

/// `GET <path> ` with the trailing space, so `/main.jsx` does not match.
fn contains_request_for(request: &[u8], path: &str) -> bool {
    let path = path.as_bytes();
    request
        .windows(4 + path.len() + 1)
        .any(|w| w.starts_with(b"GET ") && &w[4..4 + path.len()] == path && w[4 + path.len()] == b' ')
}

fn contains(hay: &[u8], needle: &[u8]) -> bool {
    hay.windows(needle.len()).any(|w| w == needle)
}

fn contains_ignore_case(hay: &[u8], needle: &[u8]) -> bool {
    hay.windows(needle.len()).any(|w| w.eq_ignore_ascii_case(needle))
}

// ───────────────────────────────────────────────────────────────
// Responses
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NotFound,
}

impl Status {
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::NotFound => 404,
        }
    }

    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NotFound => "Not Found",
        }
    }
}

/// A complete canned reply.  The head uses bare `\n` line endings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub content_type: &'static str,
    pub body: &'static [u8],
}

impl Response {
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        write!(
            w,
            "HTTP/1.1 {} {}\nContent-type: {}\n\n",
            self.status.code(),
            self.status.reason(),
            self.content_type
        )?;
        w.write_all(self.body)?;
        w.flush()
    }
}

impl Route {
    /// The reply for routes served directly.  `None` for `Upgrade` and `Reject`.
    pub fn response(self) -> Option<Response> {
        match self {
            Self::Index => Some(Response {
                status: Status::Ok,
                content_type: assets::HTML,
                body: assets::INDEX_HTML,
            }),
            Self::Asset(asset) => Some(Response {
                status: Status::Ok,
                content_type: asset.content_type,
                body: asset.body,
            }),
            Self::NotFound => Some(Response {
                status: Status::NotFound,
                content_type: assets::HTML,
                body: assets::ERROR_HTML,
            }),
            Self::Upgrade | Self::Reject => None,
        }
    }
}
