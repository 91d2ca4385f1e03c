//! `data:` URLs, answered without touching the network.

use crate::protocol::{HttpResponse, NetworkError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use http::header;
use percent_encoding::percent_decode_str;
use url::{Position, Url};

pub const DEFAULT_MEDIA_TYPE: &str = "text/plain;charset=US-ASCII";

const BASE64_SUFFIX: &str = ";base64";

/// Resolves `data:[<media type>][;base64],<data>` into a `200` response.
pub(crate) fn fetch_data_url(url: &Url) -> Result<HttpResponse, NetworkError> {
    let content = &url[Position::BeforePath..Position::AfterQuery];
    let (meta, data) = content
        .split_once(',')
        .ok_or_else(|| NetworkError::invalid_url(format!("data url without ',': {content}")))?;

    let (media_type, base64) = match meta.strip_suffix(BASE64_SUFFIX) {
        Some(media_type) => (media_type, true),
        None => (meta, false),
    };

    let media_type = match media_type.trim() {
        "" => DEFAULT_MEDIA_TYPE.to_owned(),
        parameters if parameters.starts_with(';') => format!("{}{parameters}", mime::TEXT_PLAIN),
        media_type => media_type.to_owned(),
    };
    media_type
        .parse::<mime::Mime>()
        .map_err(|e| NetworkError::invalid_url(format!("invalid media type {media_type:?}: {e}")))?;

    // `+` is data, not an encoded space
    let decoded: Vec<u8> = percent_decode_str(data).collect();
    let body = if base64 {
        STANDARD
            .decode(&decoded)
            .map_err(|e| NetworkError::invalid_url(format!("invalid base64 data: {e}")))?
    } else {
        decoded
    };

    Ok(HttpResponse::new(200).with_header(header::CONTENT_TYPE, media_type).with_body(Bytes::from(body)))
}
