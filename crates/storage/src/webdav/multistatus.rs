//! Parsing of `PROPFIND` (`Depth: 1`) multistatus responses.
//!
//! Servers disagree on namespace prefixes (`D:`, `d:`, `lp1:`), so elements are
//! matched on their local name only.

use crate::Listing;
use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use quick_xml::events::Event;
use quick_xml::Reader;

pub(crate) const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:propfind xmlns:D="DAV:">
  <D:prop>
    <D:resourcetype/>
    <D:getcontentlength/>
    <D:getlastmodified/>
  </D:prop>
</D:propfind>"#;

#[derive(Clone, Copy)]
enum Property {
    Href,
    ContentLength,
    LastModified,
}

#[derive(Default)]
struct Response {
    href: String,
    size: u64,
    last_modified: Option<DateTime<Utc>>,
    is_dir: bool,
}

/// Converts a multistatus body into listing records for the children of `collection_url`.
/// The collection's own entry and hidden entries are dropped.
pub(crate) fn parse_multistatus(
    xml: &str,
    collection_url: &str,
) -> Result<Vec<Listing>, quick_xml::Error> {
    let collection = href_path(collection_url);
    let mut reader = Reader::from_str(xml);

    let mut listing = Vec::new();
    let mut current: Option<Response> = None;
    let mut property: Option<Property> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"response" => current = Some(Response::default()),
                b"href" => property = Some(Property::Href),
                b"getcontentlength" => property = Some(Property::ContentLength),
                b"getlastmodified" => property = Some(Property::LastModified),
                b"collection" => mark_collection(&mut current),
                _ => {}
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"collection" {
                    mark_collection(&mut current);
                }
            }
            Event::Text(e) => {
                if let (Some(property), Some(response)) = (property, current.as_mut()) {
                    apply(response, property, &e.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"response" => {
                    if let Some(response) = current.take() {
                        if let Some(record) = into_listing(response, &collection) {
                            listing.push(record);
                        }
                    }
                }
                b"href" | b"getcontentlength" | b"getlastmodified" => property = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(listing)
}

fn mark_collection(current: &mut Option<Response>) {
    if let Some(response) = current.as_mut() {
        response.is_dir = true;
    }
}

fn apply(response: &mut Response, property: Property, text: &str) {
    let text = text.trim();
    match property {
        Property::Href => response.href.push_str(text),
        Property::ContentLength => response.size = text.parse().unwrap_or(0),
        Property::LastModified => {
            response.last_modified = DateTime::parse_from_rfc2822(text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }
}

fn into_listing(response: Response, collection: &str) -> Option<Listing> {
    let path = href_path(&response.href);
    if path == collection {
        return None;
    }

    let name = path.rsplit('/').next()?;
    Listing::visible(name, response.size, response.last_modified, response.is_dir)
}

/// Decoded URL path without trailing slash. Accepts absolute URLs and bare paths.
fn href_path(href: &str) -> String {
    let raw = match reqwest::Url::parse(href) {
        Ok(url) => url.path().to_string(),
        Err(_) => href.to_string(),
    };

    percent_decode_str(&raw)
        .decode_utf8_lossy()
        .trim_end_matches('/')
        .to_string()
}
