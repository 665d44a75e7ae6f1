//! Newznab XML rendering.
//!
//! Generates RSS 2.0 with the `newznab:attr` extension, the static caps
//! document and error documents.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::document::{categories, ResultDocument, ResultEntry};

pub const NEWZNAB_NAMESPACE: &str = "http://www.newznab.com/DTD/2010/feeds/attributes/";

const SERVER_TITLE: &str = "MediathekArr";
const CHANNEL_DESCRIPTION: &str = "German public broadcaster archives as a Newznab indexer";

/// Newznab error codes used by this indexer.
pub mod error_codes {
    pub const INCORRECT_CREDENTIALS: u32 = 100;
    pub const MISSING_PARAMETER: u32 = 200;
    pub const INCORRECT_PARAMETER: u32 = 201;
    pub const NO_SUCH_FUNCTION: u32 = 202;
    pub const NO_SUCH_ITEM: u32 = 300;
    pub const UNKNOWN_ERROR: u32 = 900;
}

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn new_writer() -> XmlWriter {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .ok();
    writer
}

fn finish(writer: XmlWriter) -> String {
    String::from_utf8(writer.into_inner().into_inner()).unwrap_or_default()
}

/// Render a result document as a Newznab RSS feed.
pub fn render_results(document: &ResultDocument, link: &str, offset: usize) -> String {
    let mut writer = new_writer();

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:atom", "http://www.w3.org/2005/Atom"));
    rss.push_attribute(("xmlns:newznab", NEWZNAB_NAMESPACE));
    writer.write_event(Event::Start(rss)).ok();

    writer
        .write_event(Event::Start(BytesStart::new("channel")))
        .ok();
    write_text_element(&mut writer, "title", SERVER_TITLE);
    write_text_element(&mut writer, "description", CHANNEL_DESCRIPTION);
    write_text_element(&mut writer, "link", link);
    write_text_element(&mut writer, "language", "de-de");

    let mut response = BytesStart::new("newznab:response");
    response.push_attribute(("offset", offset.to_string().as_str()));
    response.push_attribute(("total", document.total().to_string().as_str()));
    writer.write_event(Event::Empty(response)).ok();

    for entry in &document.entries {
        write_entry(&mut writer, entry);
    }

    writer
        .write_event(Event::End(BytesEnd::new("channel")))
        .ok();
    writer.write_event(Event::End(BytesEnd::new("rss"))).ok();

    finish(writer)
}

/// The static capabilities document.
pub fn render_caps() -> String {
    let mut writer = new_writer();

    writer.write_event(Event::Start(BytesStart::new("caps"))).ok();

    let mut server = BytesStart::new("server");
    server.push_attribute(("version", env!("CARGO_PKG_VERSION")));
    server.push_attribute(("title", SERVER_TITLE));
    writer.write_event(Event::Empty(server)).ok();

    let mut limits = BytesStart::new("limits");
    limits.push_attribute(("max", "10000"));
    limits.push_attribute(("default", "10000"));
    writer.write_event(Event::Empty(limits)).ok();

    writer
        .write_event(Event::Start(BytesStart::new("searching")))
        .ok();
    write_search_element(&mut writer, "search", "q");
    write_search_element(&mut writer, "tv-search", "q,season,ep,tvdbid");
    write_search_element(&mut writer, "movie-search", "q");
    writer
        .write_event(Event::End(BytesEnd::new("searching")))
        .ok();

    writer
        .write_event(Event::Start(BytesStart::new("categories")))
        .ok();
    write_category(
        &mut writer,
        categories::MOVIES,
        "Movies",
        &[(categories::MOVIES_SD, "Movies/SD"), (categories::MOVIES_HD, "Movies/HD")],
    );
    write_category(
        &mut writer,
        categories::TV,
        "TV",
        &[(categories::TV_SD, "TV/SD"), (categories::TV_HD, "TV/HD")],
    );
    writer
        .write_event(Event::End(BytesEnd::new("categories")))
        .ok();

    writer.write_event(Event::End(BytesEnd::new("caps"))).ok();

    finish(writer)
}

/// `<error code=".." description=".."/>`
pub fn render_error(code: u32, description: &str) -> String {
    let mut writer = new_writer();

    let mut error = BytesStart::new("error");
    error.push_attribute(("code", code.to_string().as_str()));
    error.push_attribute(("description", description));
    writer.write_event(Event::Empty(error)).ok();

    finish(writer)
}

/// RFC 1123 date as used in RSS.
pub fn format_rfc1123(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn write_text_element(writer: &mut XmlWriter, name: &str, text: &str) {
    writer.write_event(Event::Start(BytesStart::new(name))).ok();
    writer.write_event(Event::Text(BytesText::new(text))).ok();
    writer.write_event(Event::End(BytesEnd::new(name))).ok();
}

fn write_search_element(writer: &mut XmlWriter, name: &str, params: &str) {
    let mut elem = BytesStart::new(name);
    elem.push_attribute(("available", "yes"));
    elem.push_attribute(("supportedParams", params));
    writer.write_event(Event::Empty(elem)).ok();
}

fn write_category(writer: &mut XmlWriter, id: u32, name: &str, subcats: &[(u32, &str)]) {
    let mut category = BytesStart::new("category");
    category.push_attribute(("id", id.to_string().as_str()));
    category.push_attribute(("name", name));
    writer.write_event(Event::Start(category)).ok();
    for (sub_id, sub_name) in subcats {
        let mut subcat = BytesStart::new("subcat");
        subcat.push_attribute(("id", sub_id.to_string().as_str()));
        subcat.push_attribute(("name", *sub_name));
        writer.write_event(Event::Empty(subcat)).ok();
    }
    writer
        .write_event(Event::End(BytesEnd::new("category")))
        .ok();
}

fn write_newznab_attr(writer: &mut XmlWriter, name: &str, value: &str) {
    let mut attr = BytesStart::new("newznab:attr");
    attr.push_attribute(("name", name));
    attr.push_attribute(("value", value));
    writer.write_event(Event::Empty(attr)).ok();
}

fn write_entry(writer: &mut XmlWriter, entry: &ResultEntry) {
    writer
        .write_event(Event::Start(BytesStart::new("item")))
        .ok();

    write_text_element(writer, "title", &entry.title);

    let mut guid = BytesStart::new("guid");
    guid.push_attribute(("isPermaLink", "false"));
    writer.write_event(Event::Start(guid)).ok();
    writer
        .write_event(Event::Text(BytesText::new(&entry.guid)))
        .ok();
    writer.write_event(Event::End(BytesEnd::new("guid"))).ok();

    write_text_element(writer, "link", &entry.link);
    write_text_element(writer, "comments", &entry.link);
    write_text_element(writer, "pubDate", &format_rfc1123(&entry.pub_date));
    if let Some(category) = entry.categories.first() {
        write_text_element(writer, "category", &category.to_string());
    }
    write_text_element(writer, "description", &entry.description);

    let mut enclosure = BytesStart::new("enclosure");
    enclosure.push_attribute(("url", entry.download_url.as_str()));
    enclosure.push_attribute(("length", entry.size.to_string().as_str()));
    enclosure.push_attribute(("type", "application/x-nzb"));
    writer.write_event(Event::Empty(enclosure)).ok();

    for category in &entry.categories {
        write_newznab_attr(writer, "category", &category.to_string());
    }
    write_newznab_attr(writer, "size", &entry.size.to_string());
    if let Some(season) = &entry.attributes.season {
        write_newznab_attr(writer, "season", season);
    }
    if let Some(episode) = &entry.attributes.episode {
        write_newznab_attr(writer, "episode", episode);
    }
    if entry.attributes.subtitles {
        write_newznab_attr(writer, "subs", "German");
    }
    if let Some(series_type) = entry.attributes.series_type {
        write_newznab_attr(writer, "seriestype", series_type.as_str());
    }

    writer.write_event(Event::End(BytesEnd::new("item"))).ok();
}
