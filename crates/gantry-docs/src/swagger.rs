//! Swagger UI page generation.
//!
//! The page pulls Swagger UI from a CDN and points it at a descriptor URL.
//! The default URL is relative (`./api.swagger.json`) so the page resolves it
//! against wherever the documentation prefix is mounted.
//!
//! ```rust
//! use gantry_docs::SwaggerUi;
//!
//! let html = SwaggerUi::new().title("Billing API").html();
//! assert!(html.contains("<title>Billing API</title>"));
//! ```

use bytes::Bytes;

/// Descriptor URL used when none is configured.
pub const DEFAULT_SPEC_URL: &str = "./api.swagger.json";

/// Where the Swagger UI scripts and stylesheet are loaded from.
pub const DEFAULT_CDN: &str = "https://unpkg.com/swagger-ui-dist@5.18.2";

/// A Swagger UI index page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwaggerUi {
    spec_url: String,
    title: String,
    cdn: String,
    try_it_out: bool,
}

impl Default for SwaggerUi {
    fn default() -> Self {
        Self::new()
    }
}

impl SwaggerUi {
    /// Creates a page that loads [`DEFAULT_SPEC_URL`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            spec_url: DEFAULT_SPEC_URL.to_string(),
            title: "API Documentation".to_string(),
            cdn: DEFAULT_CDN.to_string(),
            try_it_out: true,
        }
    }

    /// Points the page at another descriptor.
    #[must_use]
    pub fn spec_url(mut self, url: impl Into<String>) -> Self {
        self.spec_url = url.into();
        self
    }

    /// Sets the `<title>`.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Loads Swagger UI from another base URL, e.g. a self-hosted copy.
    #[must_use]
    pub fn cdn(mut self, base: impl Into<String>) -> Self {
        self.cdn = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Shows or hides the "Try it out" buttons.
    #[must_use]
    pub fn try_it_out(mut self, enabled: bool) -> Self {
        self.try_it_out = enabled;
        self
    }

    /// Returns the descriptor URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.spec_url
    }

    /// Renders the page.
    #[must_use]
    pub fn html(&self) -> String {
        let cdn = html_escape(&self.cdn);
        let supported = if self.try_it_out {
            "['get', 'put', 'post', 'delete', 'options', 'head', 'patch']"
        } else {
            "[]"
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>{title}</title>
    <link rel="stylesheet" href="{cdn}/swagger-ui.css">
  </head>
  <body>
    <div id="swagger-ui"></div>
    <script src="{cdn}/swagger-ui-bundle.js"></script>
    <script>
      window.ui = SwaggerUIBundle({{
        url: '{url}',
        dom_id: '#swagger-ui',
        deepLinking: true,
        supportedSubmitMethods: {supported}
      }});
    </script>
  </body>
</html>
"#,
            title = html_escape(&self.title),
            url = js_escape(&self.spec_url),
        )
    }

    /// Renders the page as a response body.
    #[must_use]
    pub fn html_bytes(&self) -> Bytes {
        Bytes::from(self.html())
    }
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Escapes a value placed inside a single-quoted JavaScript string.
fn js_escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('<', "\\x3c")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page_loads_relative_descriptor() {
        let ui = SwaggerUi::new();
        assert_eq!(ui.url(), DEFAULT_SPEC_URL);

        let html = ui.html();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("url: './api.swagger.json'"));
        assert!(html.contains(&format!("{DEFAULT_CDN}/swagger-ui-bundle.js")));
    }

    #[test]
    fn test_custom_cdn_and_title() {
        let html = SwaggerUi::new()
            .cdn("/assets/swagger/")
            .title("Billing & Payments")
            .try_it_out(false)
            .html();

        assert!(html.contains(r#"href="/assets/swagger/swagger-ui.css""#));
        assert!(html.contains("<title>Billing &amp; Payments</title>"));
        assert!(html.contains("supportedSubmitMethods: []"));
    }

    #[test]
    fn test_spec_url_is_escaped() {
        let html = SwaggerUi::new().spec_url("x');alert('1").html();
        assert!(html.contains(r"url: 'x\');alert(\'1'"));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<b>\"hi\"</b>"), "&lt;b&gt;&quot;hi&quot;&lt;/b&gt;");
    }

    #[test]
    fn test_js_escape() {
        assert_eq!(js_escape("it's"), "it\\'s");
        assert_eq!(js_escape("</script>"), "\\x3c/script>");
    }
}
