//! Outbound packet sending.
//!
//! # Responsibilities
//! - Attach a bearer token, content type and local peer name
//! - Resolve the peer URL, templated per tenant in multi-tenant mode
//! - Issue the POST over the transport pool and check the status

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use url::Url;

use super::BridgeContext;
use crate::error::BridgeError;
use crate::http::request::{ILP_CONTENT_TYPE, ILP_DESTINATION, ILP_PEER_NAME};
use crate::packet::Prepare;
use crate::transport::{FetchRequest, Transport, TransportError};

/// True when `segment` is a non-empty run of `[A-Za-z0-9_-]`.
pub fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Tenant routing key: the first segment of `destination` after `local_address`.
pub fn routing_segment<'a>(
    local_address: &str,
    destination: &'a str,
) -> Result<&'a str, BridgeError> {
    let rest = destination
        .strip_prefix(local_address)
        .and_then(|rest| rest.strip_prefix('.'))
        .ok_or_else(|| BridgeError::ForeignDestination {
            destination: destination.to_string(),
            prefix: local_address.to_string(),
        })?;

    let segment = rest.split('.').next().unwrap_or_default();
    if !is_valid_segment(segment) {
        return Err(BridgeError::InvalidAddressSegment(segment.to_string()));
    }
    Ok(segment)
}

/// Substitute the first `delimiter` in `template` with `segment`.
pub fn resolve_url(template: &str, delimiter: char, segment: &str) -> String {
    template.replacen(delimiter, segment, 1)
}

pub(crate) async fn send_data(ctx: &BridgeContext, data: Bytes) -> Result<Bytes, BridgeError> {
    if !ctx.is_connected() {
        return Err(BridgeError::NotConnected);
    }

    let token = ctx.auth.produce_outgoing()?;
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| BridgeError::InvalidHeader("Authorization"))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(ILP_CONTENT_TYPE));
    headers.insert(ILP_PEER_NAME, ctx.peer_name.clone());

    let config = &ctx.config;
    let mut url = config.outgoing.url.clone();
    if config.multi_tenant || config.outgoing.send_ilp_destination {
        let prepare = Prepare::from_bytes(&data)?;

        if config.outgoing.send_ilp_destination {
            headers.insert(
                ILP_DESTINATION,
                HeaderValue::from_str(&prepare.destination)
                    .map_err(|_| BridgeError::InvalidHeader("ILP-Destination"))?,
            );
        }

        if config.multi_tenant {
            let local = ctx.discovery.fetch(&ctx.handlers).await?;
            let segment = routing_segment(&local.client_address, &prepare.destination)?;
            url = resolve_url(&config.outgoing.url, config.multi_delimiter, segment);
        }
    }

    let url = Url::parse(&url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
    tracing::debug!(url = %url, bytes = data.len(), "Sending packet");

    let response = ctx
        .transport
        .fetch(
            &url,
            FetchRequest {
                method: Method::POST,
                headers,
                body: data,
            },
        )
        .await?;

    if !response.status.is_success() {
        tracing::warn!(url = %url, status = %response.status, "Peer rejected packet");
        return Err(BridgeError::UpstreamNonSuccess(response.status.as_u16()));
    }

    Ok(response.body)
}
