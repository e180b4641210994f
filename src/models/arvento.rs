//! Arvento `LastPacket` fields, as returned by `GetVehicleStatusByNodeV3`.

use serde::Deserialize;

use super::de::{f64_option, string_option};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArventoPacket {
    #[serde(rename = "strNode", default, deserialize_with = "string_option")]
    pub node: Option<String>,
    /// GMT wall-clock, e.g. `2023-06-01T03:42:23`.
    #[serde(rename = "dtGMTDateTime", default, deserialize_with = "string_option")]
    pub gmt_date_time: Option<String>,
    #[serde(rename = "dLatitude", default, deserialize_with = "f64_option")]
    pub latitude: Option<f64>,
    #[serde(rename = "dLongitude", default, deserialize_with = "f64_option")]
    pub longitude: Option<f64>,
    #[serde(rename = "dSpeed", default, deserialize_with = "f64_option")]
    pub speed: Option<f64>,
    #[serde(rename = "strAddress", default, deserialize_with = "string_option")]
    pub address: Option<String>,
    #[serde(rename = "nCourse", default, deserialize_with = "f64_option")]
    pub course: Option<f64>,
    #[serde(rename = "dOdometer", default, deserialize_with = "f64_option")]
    pub odometer: Option<f64>,
    #[serde(rename = "nAltitude", default, deserialize_with = "f64_option")]
    pub altitude: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsing_soap_text_packet() {
        // SOAP element text arrives as strings
        let payload = r#"
        {
            "strNode": "K1200098807",
            "dtGMTDateTime": "2023-06-01T03:42:23",
            "dLatitude": "40.97681",
            "dLongitude": "34.810963",
            "dSpeed": "0",
            "strAddress": "Cumhuriyet Mh., Osmancık, Çorum",
            "nCourse": "0",
            "dOdometer": "24507",
            "nAltitude": null
        }
        "#;

        let packet: ArventoPacket = serde_json::from_str(payload).unwrap();
        assert_eq!(packet.node.as_deref(), Some("K1200098807"));
        assert_eq!(packet.latitude, Some(40.97681));
        assert_eq!(packet.speed, Some(0.0));
        assert_eq!(packet.course, Some(0.0));
        assert_eq!(packet.altitude, None);
    }
}
