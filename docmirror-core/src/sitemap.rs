//! Sitemap resolution: fetch a sitemap document and extract its URLs.
//!
//! Sitemaps come namespaced (`http://www.sitemaps.org/schemas/sitemap/0.9`)
//! and bare; matching on the local element name covers both. Any failure
//! degrades to an empty URL list so one broken source never aborts a run.

use crate::fetch::{DocumentFetcher, FetchError};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Fetch `sitemap_url` and return the URLs it lists, in document order.
///
/// Fetch and parse failures are reported to stderr and yield an empty list.
pub fn resolve(fetcher: &dyn DocumentFetcher, sitemap_url: &str) -> Vec<String> {
    let body = match fetcher.fetch(sitemap_url) {
        Ok(body) => body,
        Err(e) => {
            eprintln!("Error: failed to fetch sitemap from {sitemap_url}: {e}");
            return Vec::new();
        }
    };

    match parse_sitemap(&body) {
        Ok(urls) => urls,
        Err(e) => {
            eprintln!("Error: {e}");
            Vec::new()
        }
    }
}

/// Parse sitemap XML and collect the text of every `loc` element.
pub fn parse_sitemap(xml: &str) -> Result<Vec<String>, FetchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut urls = Vec::new();
    let mut buf = Vec::new();
    let mut in_loc = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                in_loc = e.local_name().as_ref() == b"loc";
            }
            Ok(Event::End(_)) => {
                in_loc = false;
            }
            Ok(Event::Text(e)) => {
                if in_loc {
                    let text = e.unescape().unwrap_or_default();
                    let text = text.trim();
                    if !text.is_empty() {
                        urls.push(text.to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FetchError::SitemapParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_namespaced_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <url><loc>https://ex.com/docs/guide/intro</loc></url>
          <url><loc>https://ex.com/docs/guide/setup</loc></url>
        </urlset>"#;

        let urls = parse_sitemap(xml).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://ex.com/docs/guide/intro".to_string(),
                "https://ex.com/docs/guide/setup".to_string(),
            ]
        );
    }

    #[test]
    fn parses_prefixed_namespace() {
        let xml = r#"<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
          <sm:url><sm:loc>https://ex.com/a</sm:loc></sm:url>
        </sm:urlset>"#;

        let urls = parse_sitemap(xml).unwrap();
        assert_eq!(urls, vec!["https://ex.com/a".to_string()]);
    }

    #[test]
    fn parses_bare_urlset() {
        let xml = "<urlset><url><loc>https://ex.com/b</loc></url></urlset>";
        let urls = parse_sitemap(xml).unwrap();
        assert_eq!(urls, vec!["https://ex.com/b".to_string()]);
    }

    #[test]
    fn preserves_document_order() {
        let xml = "<urlset>\
            <url><loc>https://ex.com/3</loc></url>\
            <url><loc>https://ex.com/1</loc></url>\
            <url><loc>https://ex.com/2</loc></url>\
        </urlset>";
        let urls = parse_sitemap(xml).unwrap();
        assert_eq!(urls, vec!["https://ex.com/3", "https://ex.com/1", "https://ex.com/2"]);
    }

    /// Parser must never panic on arbitrary input.
    #[test]
    fn fuzz_inputs_never_panic() {
        let fuzz_inputs = [
            "",
            "not xml at all",
            "<",
            "<url>",
            "<url><loc>",
            "<<<>>>",
            "<urlset><url></url></urlset>",
            "<urlset><url><loc></loc></url></urlset>",
            "\x00\x01\x02\x03",
            "<?xml version=\"1.0\"?><urlset></urlset>",
            "<sitemapindex></sitemapindex>",
        ];

        for input in &fuzz_inputs {
            // Err or an empty Vec are both fine
            let _ = parse_sitemap(input);
        }
    }

    struct FailingFetcher;

    impl DocumentFetcher for FailingFetcher {
        fn fetch(&self, url: &str) -> Result<String, FetchError> {
            Err(FetchError::Status {
                status: 500,
                url: url.to_string(),
            })
        }
    }

    #[test]
    fn resolve_returns_empty_on_fetch_failure() {
        let urls = resolve(&FailingFetcher, "https://ex.com/sitemap.xml");
        assert!(urls.is_empty());
    }
}
