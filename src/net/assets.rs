//! Web UI files compiled into the binary.

/// One embedded static file.
#[derive(Debug, PartialEq, Eq)]
pub struct Asset {
    pub path: &'static str,
    pub content_type: &'static str,
    pub body: &'static [u8],
}

pub const HTML: &str = "text/html";

pub static INDEX_HTML: &[u8] = include_bytes!("../../assets/index.html");
pub static ERROR_HTML: &[u8] = include_bytes!("../../assets/error.html");

pub static MAIN_JS: Asset = Asset {
    path: "/main.js",
    content_type: "text/javascript",
    body: include_bytes!("../../assets/main.js"),
};

pub static INDEX_CSS: Asset = Asset {
    path: "/index.css",
    content_type: "text/css",
    body: include_bytes!("../../assets/index.css"),
};

pub static FAVICON: Asset = Asset {
    path: "/favicon.ico",
    content_type: "image/x-icon",
    body: include_bytes!("../../assets/favicon.ico"),
};

/// Every file served from its own path, in lookup order.
pub static STATIC_ASSETS: [&Asset; 3] = [&MAIN_JS, &INDEX_CSS, &FAVICON];
