use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::soap;
use crate::error::{GatewayError, Result};

const NAMESPACE: &str = "http://www.intelli-track.com/";

#[derive(Clone, Deserialize)]
pub struct ArventoCredentials {
    /// WSDL location, e.g. `https://ws.arvento.com/v1/report.asmx?wsdl`.
    pub host: String,
    pub username: String,
    pub pin1: String,
    pub pin2: String,
    /// Serve the bundled sample fleet instead of calling the vendor.
    #[serde(default)]
    pub offline: bool,
}

impl ArventoCredentials {
    /// SOAP endpoint: the WSDL URL without its `?wsdl` query.
    pub fn endpoint(&self) -> &str {
        let host = self.host.trim();
        match host.to_ascii_lowercase().rfind("?wsdl") {
            Some(idx) => &host[..idx],
            None => host,
        }
    }
}

/// Arvento report-service operations used by the gateway.
#[async_trait]
pub trait ArventoApi: Send + Sync {
    /// Confirms the service description is reachable.
    async fn probe(&self, credentials: &ArventoCredentials) -> Result<()>;

    async fn node_from_plate(
        &self,
        credentials: &ArventoCredentials,
        license_plate: &str,
    ) -> Result<Option<String>>;

    /// The vehicle's `LastPacket`, untouched.
    async fn vehicle_status(
        &self,
        credentials: &ArventoCredentials,
        node: &str,
    ) -> Result<Option<Map<String, Value>>>;
}

pub struct SoapArventoClient {
    http: Client,
}

impl SoapArventoClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// One SOAP round trip with the account's auth parameters prepended.
    async fn call(
        &self,
        credentials: &ArventoCredentials,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<Value>> {
        let mut all_params = vec![
            ("Username", credentials.username.as_str()),
            ("PIN1", credentials.pin1.as_str()),
            ("PIN2", credentials.pin2.as_str()),
        ];
        all_params.extend_from_slice(params);

        debug!("Arvento SOAP call {}", method);
        let response = self
            .http
            .post(credentials.endpoint())
            .header(header::CONTENT_TYPE, soap::CONTENT_TYPE)
            .body(soap::envelope(NAMESPACE, method, &all_params))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        read_result(status, &body, method)
    }
}

/// Decodes one SOAP reply: faults become errors, otherwise the
/// `{method}Result` element, or the first `LastPacket` when the result
/// wrapper is missing.
fn read_result(status: StatusCode, body: &str, method: &str) -> Result<Option<Value>> {
    // Faults come back as HTTP 500 with a parseable body.
    let document = soap::parse(body);
    if let Ok(document) = &document {
        if let Some(reason) = soap::fault_reason(document) {
            warn!("Arvento {} fault: {}", method, reason);
            return Err(classify_fault(reason));
        }
    }
    if !status.is_success() {
        warn!("Arvento {} failed with {}", method, status);
        return Err(GatewayError::Vendor(format!(
            "arvento {} failed with {}",
            method, status
        )));
    }

    let document = document?;
    let result_tag = format!("{}Result", method);
    Ok(soap::find(&document, &result_tag)
        .or_else(|| soap::find(&document, "LastPacket"))
        .cloned())
}

/// The `LastPacket` inside a vehicle status result, or the result itself.
fn last_packet(result: Option<Value>) -> Option<Map<String, Value>> {
    let value = result?;
    match soap::find(&value, "LastPacket").cloned().unwrap_or(value) {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn classify_fault(reason: String) -> GatewayError {
    let lowered = reason.to_lowercase();
    if lowered.contains("pin") || lowered.contains("password") || lowered.contains("auth") {
        GatewayError::Auth(format!("arvento rejected credentials: {}", reason))
    } else {
        GatewayError::Vendor(format!("arvento fault: {}", reason))
    }
}

#[async_trait]
impl ArventoApi for SoapArventoClient {
    async fn probe(&self, credentials: &ArventoCredentials) -> Result<()> {
        let response = self.http.get(credentials.host.trim()).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(GatewayError::Auth(format!(
                "arvento service description returned {}",
                response.status()
            )))
        }
    }

    async fn node_from_plate(
        &self,
        credentials: &ArventoCredentials,
        license_plate: &str,
    ) -> Result<Option<String>> {
        let result = self
            .call(
                credentials,
                "GetNodeFromLicensePlate",
                &[("LicensePlate", license_plate)],
            )
            .await?;

        Ok(match result {
            Some(Value::String(node)) if !node.trim().is_empty() => Some(node.trim().to_string()),
            _ => None,
        })
    }

    async fn vehicle_status(
        &self,
        credentials: &ArventoCredentials,
        node: &str,
    ) -> Result<Option<Map<String, Value>>> {
        let result = self
            .call(
                credentials,
                "GetVehicleStatusByNodeV3",
                &[("Node", node), ("Language", "0")],
            )
            .await?;

        Ok(last_packet(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(host: &str) -> ArventoCredentials {
        ArventoCredentials {
            host: host.to_string(),
            username: "fleet".to_string(),
            pin1: "1111".to_string(),
            pin2: "2222".to_string(),
            offline: false,
        }
    }

    #[test]
    fn test_endpoint_strips_wsdl_query() {
        assert_eq!(
            credentials("https://ws.arvento.com/v1/report.asmx?wsdl").endpoint(),
            "https://ws.arvento.com/v1/report.asmx"
        );
        assert_eq!(
            credentials(" https://ws.arvento.com/v1/report.asmx?WSDL ").endpoint(),
            "https://ws.arvento.com/v1/report.asmx"
        );
        assert_eq!(
            credentials("https://ws.arvento.com/v1/report.asmx").endpoint(),
            "https://ws.arvento.com/v1/report.asmx"
        );
    }

    #[test]
    fn test_fault_classification() {
        assert!(matches!(
            classify_fault("Invalid PIN1".to_string()),
            GatewayError::Auth(_)
        ));
        assert!(matches!(
            classify_fault("Server was unable to process request".to_string()),
            GatewayError::Vendor(_)
        ));
    }

    const STATUS_ENVELOPE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
  <soap:Body>
    <GetVehicleStatusByNodeV3Response xmlns="http://www.intelli-track.com/">
      <GetVehicleStatusByNodeV3Result>
        <LastPacket>
          <strNode>K1200098807</strNode>
          <dtGMTDateTime>2023-06-01T03:42:23</dtGMTDateTime>
          <dLatitude>40.97681</dLatitude>
          <dLongitude>34.810963</dLongitude>
          <dSpeed>0</dSpeed>
          <strAddress />
        </LastPacket>
      </GetVehicleStatusByNodeV3Result>
    </GetVehicleStatusByNodeV3Response>
  </soap:Body>
</soap:Envelope>"#;

    fn fault(reason: &str) -> String {
        format!(
            concat!(
                r#"<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope"><soap:Body>"#,
                "<soap:Fault><soap:Code><soap:Value>soap:Receiver</soap:Value></soap:Code>",
                r#"<soap:Reason><soap:Text xml:lang="en">{}</soap:Text></soap:Reason>"#,
                "</soap:Fault></soap:Body></soap:Envelope>"
            ),
            reason
        )
    }

    #[test]
    fn test_fault_with_server_error_status() {
        let body = fault("Invalid PIN2");
        assert!(matches!(
            read_result(StatusCode::INTERNAL_SERVER_ERROR, &body, "GetNodeFromLicensePlate"),
            Err(GatewayError::Auth(_))
        ));

        let body = fault("Server was unable to process request");
        assert!(matches!(
            read_result(StatusCode::INTERNAL_SERVER_ERROR, &body, "GetNodeFromLicensePlate"),
            Err(GatewayError::Vendor(_))
        ));
    }

    #[test]
    fn test_unparseable_error_body_is_vendor_error() {
        assert!(matches!(
            read_result(StatusCode::BAD_GATEWAY, "<html>Bad gateway", "GetNodeFromLicensePlate"),
            Err(GatewayError::Vendor(_))
        ));
        assert!(matches!(
            read_result(StatusCode::OK, "<a><b></a>", "GetNodeFromLicensePlate"),
            Err(GatewayError::Vendor(_))
        ));
    }

    #[test]
    fn test_method_result_is_extracted() {
        let body = concat!(
            r#"<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope"><soap:Body>"#,
            r#"<GetNodeFromLicensePlateResponse xmlns="http://www.intelli-track.com/">"#,
            "<GetNodeFromLicensePlateResult>K1200098807</GetNodeFromLicensePlateResult>",
            "</GetNodeFromLicensePlateResponse></soap:Body></soap:Envelope>"
        );
        let result = read_result(StatusCode::OK, body, "GetNodeFromLicensePlate").unwrap();
        assert_eq!(result, Some(Value::String("K1200098807".to_string())));
    }

    #[test]
    fn test_status_envelope_yields_last_packet() {
        let result = read_result(StatusCode::OK, STATUS_ENVELOPE, "GetVehicleStatusByNodeV3").unwrap();
        let packet = last_packet(result).unwrap();
        assert_eq!(packet["strNode"], "K1200098807");
        assert_eq!(packet["dLatitude"], "40.97681");
        assert_eq!(packet["strAddress"], Value::Null);
    }

    #[test]
    fn test_last_packet_without_result_wrapper() {
        let body = STATUS_ENVELOPE
            .replace("<GetVehicleStatusByNodeV3Result>", "")
            .replace("</GetVehicleStatusByNodeV3Result>", "");
        let result = read_result(StatusCode::OK, &body, "GetVehicleStatusByNodeV3").unwrap();
        let packet = last_packet(result).unwrap();
        assert_eq!(packet["dtGMTDateTime"], "2023-06-01T03:42:23");
    }

    #[test]
    fn test_empty_result_has_no_packet() {
        let body = concat!(
            r#"<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope"><soap:Body>"#,
            "<GetVehicleStatusByNodeV3Response><GetVehicleStatusByNodeV3Result />",
            "</GetVehicleStatusByNodeV3Response></soap:Body></soap:Envelope>"
        );
        let result = read_result(StatusCode::OK, body, "GetVehicleStatusByNodeV3").unwrap();
        assert_eq!(result, Some(Value::Null));
        assert!(last_packet(result).is_none());
        assert!(last_packet(None).is_none());
    }
}
