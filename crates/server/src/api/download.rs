use axum::{
    extract::Query,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use mediathekarr_core::DownloadReference;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::metrics::DOWNLOAD_RESOLUTIONS_TOTAL;

const NZB_CONTENT_TYPE: &str = "application/x-nzb";

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub video: Option<String>,
    pub subtitle: Option<String>,
    pub title: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Resolve a synthetic download link into a placeholder NZB.
pub async fn resolve_download(
    Query(params): Query<DownloadParams>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let reference = DownloadReference::decode(
        params.video.as_deref(),
        params.subtitle.as_deref(),
        params.title.as_deref(),
    )
    .map_err(|e| {
        DOWNLOAD_RESOLUTIONS_TOTAL.with_label_values(&["invalid"]).inc();
        debug!(error = %e, "Invalid download reference");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    DOWNLOAD_RESOLUTIONS_TOTAL.with_label_values(&["ok"]).inc();
    info!(
        title = %reference.title,
        has_subtitle = reference.subtitle_url.is_some(),
        "Resolved download reference"
    );

    let disposition = format!(
        "attachment; filename=\"{}.nzb\"",
        attachment_name(&reference.title)
    );
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, NZB_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        reference.to_placeholder(),
    )
        .into_response())
}

/// Header-safe file name: ASCII only, no quotes or path separators.
fn attachment_name(title: &str) -> String {
    let name: String = title
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .map(|c| match c {
            '"' | '\\' | '/' => '_',
            c => c,
        })
        .collect();
    if name.trim().is_empty() {
        "download".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_name() {
        assert_eq!(
            attachment_name("Tatort.S01E01.GERMAN.720p.WEB.h264-MEDiATHEK"),
            "Tatort.S01E01.GERMAN.720p.WEB.h264-MEDiATHEK"
        );
        assert_eq!(attachment_name("a\"b/c\\d"), "a_b_c_d");
        assert_eq!(attachment_name("Mörder\n"), "Mrder");
        assert_eq!(attachment_name("ü"), "download");
    }
}
