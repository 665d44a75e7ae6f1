//! Synthetic download references.
//!
//! A result entry's download link carries the real source URLs and the
//! release name, base64 encoded. Resolving the link yields a placeholder NZB
//! whose comments hold the decoded values for the download pipeline.

use std::io::Cursor;

use base64::engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use regex_lite::Regex;
use thiserror::Error;

const COMMENT_PREFIX: &str = "mediathekarr";

static COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<!--\s*mediathekarr:(video|subtitle|title)\s(.*?)\s*-->").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadReferenceError {
    #[error("Missing parameter: {0}")]
    MissingField(&'static str),

    #[error("Parameter '{0}' is not valid base64")]
    InvalidBase64(&'static str),

    #[error("Parameter '{0}' is not valid UTF-8")]
    InvalidUtf8(&'static str),

    #[error("Malformed placeholder document: {0}")]
    MalformedPlaceholder(String),
}

/// Real source locations behind a result entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReference {
    pub video_url: String,
    pub subtitle_url: Option<String>,
    pub title: String,
}

impl DownloadReference {
    /// Link served in result documents: `{public_url}/download?video=..&subtitle=..&title=..`.
    pub fn link(&self, public_url: &str) -> String {
        let mut link = format!(
            "{}/download?video={}",
            public_url.trim_end_matches('/'),
            URL_SAFE_NO_PAD.encode(&self.video_url)
        );
        if let Some(subtitle) = &self.subtitle_url {
            link.push_str("&subtitle=");
            link.push_str(&URL_SAFE_NO_PAD.encode(subtitle));
        }
        link.push_str("&title=");
        link.push_str(&URL_SAFE_NO_PAD.encode(&self.title));
        link
    }

    /// Decode the query parameters of a download link.
    pub fn decode(
        video: Option<&str>,
        subtitle: Option<&str>,
        title: Option<&str>,
    ) -> Result<Self, DownloadReferenceError> {
        let video = video
            .filter(|v| !v.is_empty())
            .ok_or(DownloadReferenceError::MissingField("video"))?;
        let title = title
            .filter(|t| !t.is_empty())
            .ok_or(DownloadReferenceError::MissingField("title"))?;

        Ok(Self {
            video_url: decode_param("video", video)?,
            subtitle_url: subtitle
                .filter(|s| !s.is_empty())
                .map(|s| decode_param("subtitle", s))
                .transpose()?,
            title: decode_param("title", title)?,
        })
    }

    /// Minimal NZB carrying the reference as structured comments.
    pub fn to_placeholder(&self) -> String {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .ok();
        writer
            .write_event(Event::DocType(BytesText::from_escaped(
                r#"nzb PUBLIC "-//newzBin//DTD NZB 1.1//EN" "http://www.newzbin.com/DTD/nzb/nzb-1.1.dtd""#,
            )))
            .ok();

        write_comment(&mut writer, "video", &self.video_url);
        if let Some(subtitle) = &self.subtitle_url {
            write_comment(&mut writer, "subtitle", subtitle);
        }
        write_comment(&mut writer, "title", &self.title);

        let mut nzb = BytesStart::new("nzb");
        nzb.push_attribute(("xmlns", "http://www.newzbin.com/DTD/2003/nzb"));
        writer.write_event(Event::Start(nzb)).ok();
        writer
            .write_event(Event::Start(BytesStart::new("head")))
            .ok();
        let mut meta = BytesStart::new("meta");
        meta.push_attribute(("type", "title"));
        writer.write_event(Event::Start(meta)).ok();
        writer
            .write_event(Event::Text(BytesText::new(&self.title)))
            .ok();
        writer.write_event(Event::End(BytesEnd::new("meta"))).ok();
        writer.write_event(Event::End(BytesEnd::new("head"))).ok();
        writer.write_event(Event::End(BytesEnd::new("nzb"))).ok();

        String::from_utf8(writer.into_inner().into_inner()).unwrap_or_default()
    }

    /// Read a reference back from a placeholder document.
    pub fn from_placeholder(document: &str) -> Result<Self, DownloadReferenceError> {
        let mut video = None;
        let mut subtitle = None;
        let mut title = None;
        for caps in COMMENT.captures_iter(document) {
            let value = unescape_comment(&caps[2]);
            match &caps[1] {
                "video" => video = Some(value),
                "subtitle" => subtitle = Some(value),
                _ => title = Some(value),
            }
        }

        Ok(Self {
            video_url: video.ok_or_else(|| {
                DownloadReferenceError::MalformedPlaceholder("no video comment".to_string())
            })?,
            subtitle_url: subtitle,
            title: title.ok_or_else(|| {
                DownloadReferenceError::MalformedPlaceholder("no title comment".to_string())
            })?,
        })
    }
}

/// Accepts URL-safe base64 with or without padding, and standard base64 as
/// long as '+' survived query decoding.
fn decode_param(name: &'static str, value: &str) -> Result<String, DownloadReferenceError> {
    let value = value.trim().replace(' ', "+");
    let bytes = URL_SAFE_NO_PAD
        .decode(&value)
        .or_else(|_| URL_SAFE.decode(&value))
        .or_else(|_| STANDARD.decode(&value))
        .map_err(|_| DownloadReferenceError::InvalidBase64(name))?;
    String::from_utf8(bytes).map_err(|_| DownloadReferenceError::InvalidUtf8(name))
}

// XML comments must not contain "--".
/// Comment bodies may not contain `--`. `%` becomes `%25` and every dash that
/// would follow another dash becomes `%2D`, so the mapping stays reversible.
fn escape_comment(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut after_dash = false;
    for c in value.chars() {
        match c {
            '%' => {
                out.push_str("%25");
                after_dash = false;
            }
            '-' if after_dash => {
                out.push_str("%2D");
                after_dash = false;
            }
            '-' => {
                out.push('-');
                after_dash = true;
            }
            _ => {
                out.push(c);
                after_dash = false;
            }
        }
    }
    out
}

fn unescape_comment(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("%25") {
            out.push('%');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("%2D") {
            out.push('-');
            rest = after;
        } else {
            out.push('%');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

fn write_comment(writer: &mut Writer<Cursor<Vec<u8>>>, key: &str, value: &str) {
    let text = format!(" {}:{} {} ", COMMENT_PREFIX, key, escape_comment(value));
    writer
        .write_event(Event::Comment(BytesText::from_escaped(text)))
        .ok();
}
