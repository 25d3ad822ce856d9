// ============================================================================
// SWITCHBOT-CLOUD - Request Builder
// ============================================================================
// Assembles the signed POST for one device command. Pure: no I/O happens
// here, the dispatcher hands the finished request to reqwest.
//
//   POST {base}/v1.1/devices/{deviceId}/commands
//   Authorization: {token}
//   t / nonce / sign: the AuthTriple
//   { "command": ..., "parameter": ..., "commandType": ... }
// ============================================================================

use crate::device::DeviceDescriptor;
use crate::error::CloudError;
use crate::signing::AuthTriple;
use crate::Result;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Body, Method, Request};
use serde::{Deserialize, Serialize};
use url::Url;

/// API version segment of the command endpoint
pub const API_VERSION: &str = "v1.1";

/// Content type the vendor expects on command bodies
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf8";

const HEADER_TIMESTAMP: &str = "t";
const HEADER_NONCE: &str = "nonce";
const HEADER_SIGN: &str = "sign";

/// Wire payload of a command request, copied verbatim from the descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandBody {
    pub command: String,
    pub parameter: String,
    pub command_type: String,
}

impl From<&DeviceDescriptor> for CommandBody {
    fn from(descriptor: &DeviceDescriptor) -> Self {
        Self {
            command: descriptor.command.clone(),
            parameter: descriptor.parameter.clone(),
            command_type: descriptor.command_type.clone(),
        }
    }
}

/// Command endpoint for a device, with the id escaped as one path segment
pub fn command_url(base_url: &str, device_id: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|_| CloudError::InvalidEndpoint(base_url.to_string()))?
        .pop_if_empty()
        .extend([API_VERSION, "devices", device_id, "commands"]);
    Ok(url)
}

/// Build the signed HTTP request for `descriptor`.
///
/// Fails with [`CloudError::InvalidDescriptor`] before anything else when
/// `id`, `command` or `commandType` is empty.
pub fn build_request(
    base_url: &str,
    descriptor: &DeviceDescriptor,
    auth: &AuthTriple,
    token: &str,
) -> Result<Request> {
    descriptor.validate()?;

    let url = command_url(base_url, &descriptor.id)?;
    let body = serde_json::to_vec(&CommandBody::from(descriptor))?;

    let mut request = Request::new(Method::POST, url);
    *request.headers_mut() = auth_headers(auth, token)?;
    *request.body_mut() = Some(Body::from(body));

    Ok(request)
}

fn auth_headers(auth: &AuthTriple, token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(5);

    headers.insert(AUTHORIZATION, header_value("token", token)?);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    headers.insert(
        HeaderName::from_static(HEADER_TIMESTAMP),
        HeaderValue::from(auth.timestamp),
    );
    headers.insert(
        HeaderName::from_static(HEADER_NONCE),
        header_value("nonce", &auth.nonce)?,
    );
    headers.insert(
        HeaderName::from_static(HEADER_SIGN),
        header_value("signature", &auth.signature)?,
    );

    Ok(headers)
}

fn header_value(what: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| CloudError::Config(format!("{} contains characters not allowed in a header", what)))
}
