//! Data models for the charge-point pipeline.
//!
//! `RawDevice` mirrors one OpenChargeMap POI record as fetched (every field
//! optional, PascalCase JSON names). `CleanRow` is the flat 22-column shape
//! written to the destination table. The transformation from one to the
//! other lives here as well, so defaulting rules for missing nested fields
//! stay in one place.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Constant source tag stamped on every output row.
pub const DATA_SOURCE: &str = "OpenChargeMap";

// ---

/// Location sub-record of a POI.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressInfo {
    // ---
    pub title: Option<String>,
    pub postcode: Option<String>,
    pub town: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Network operator sub-record of a POI.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OperatorInfo {
    pub title: Option<String>,
}

/// Usage/access sub-record of a POI (public, membership, pay-at-location).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UsageType {
    // ---
    pub title: Option<String>,
    pub is_pay_at_location: Option<bool>,
    pub is_membership_required: Option<bool>,
}

/// Operational status sub-record, used both at the device level (title)
/// and per connection (operational flag).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusType {
    pub title: Option<String>,
    pub is_operational: Option<bool>,
}

/// Connector-type reference data (e.g. "CCS (Type 2)", "CHAdeMO").
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConnectionType {
    pub title: Option<String>,
}

/// Current-type reference data (e.g. "AC (Three-Phase)", "DC").
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CurrentType {
    pub title: Option<String>,
}

/// One physical charging connector attached to a POI.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Connection {
    // ---
    #[serde(rename = "PowerKW")]
    pub power_kw: Option<f64>,
    pub connection_type: Option<ConnectionType>,
    pub current_type: Option<CurrentType>,
    pub status_type: Option<StatusType>,
}

/// Raw charge-point record from the OpenChargeMap API.
///
/// Every sub-group may be absent; the API returns `null` liberally.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawDevice {
    // ---
    #[serde(rename = "ID")]
    pub id: Option<i64>,
    pub address_info: Option<AddressInfo>,
    pub operator_info: Option<OperatorInfo>,
    pub usage_type: Option<UsageType>,
    pub status_type: Option<StatusType>,
    pub connections: Option<Vec<Connection>>,
    pub date_created: Option<String>,
    pub date_last_verified: Option<String>,
    pub data_quality_level: Option<i32>,
}

/// Flattened charge-point row for the destination table.
///
/// Field order matches the table's column order.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CleanRow {
    // ---
    pub charge_device_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub postcode: String,
    pub town: String,
    pub district: String,
    pub operator: String,
    pub usage_type: String,
    pub status: String,
    pub pay_at_location: bool,
    pub is_membership_required: bool,
    pub max_power_kw: f64,
    pub connector_types: String,
    pub current_type: String,
    pub total_plugs: i32,
    pub operational_plugs: i32,
    pub date_created: Option<DateTime<Utc>>,
    pub data_quality_level: i32,
    pub last_verified: Option<DateTime<Utc>>,
    pub data_source: String,
    pub ingested_at: DateTime<Utc>,
}

// ---

impl RawDevice {
    /// Postcode uppercased and trimmed, or empty if the address group or
    /// postcode field is missing. The area filter and the output row both
    /// use this normalized form.
    pub fn normalized_postcode(&self) -> String {
        // ---
        self.address_info
            .as_ref()
            .and_then(|a| a.postcode.as_deref())
            .unwrap_or("")
            .trim()
            .to_uppercase()
    }

    /// Flatten this device into a `CleanRow`.
    ///
    /// Missing nested fields resolve to documented defaults ("Unknown" for
    /// labels, 0 for numbers, false for flags, "London" for the town) and
    /// never fail. `ingested_at` is supplied by the caller so that every
    /// row of one run carries the same processing timestamp.
    pub fn to_clean_row(&self, ingested_at: DateTime<Utc>) -> CleanRow {
        // ---
        let postcode = self.normalized_postcode();
        let addr = self.address_info.as_ref();
        let usage = self.usage_type.as_ref();
        let conns: &[Connection] = self.connections.as_deref().unwrap_or(&[]);

        let max_power_kw = conns
            .iter()
            .map(|c| c.power_kw.unwrap_or(0.0))
            .fold(0.0, f64::max);

        // Distinct connector-type titles in first-seen order, so repeated
        // runs over the same response produce identical output.
        let mut connector_types: Vec<String> = Vec::new();
        for conn in conns {
            if let Some(ct) = &conn.connection_type {
                let title = ct.title.clone().unwrap_or_else(|| "Unknown".to_string());
                if !connector_types.contains(&title) {
                    connector_types.push(title);
                }
            }
        }

        let has_dc = conns
            .iter()
            .filter_map(|c| c.current_type.as_ref())
            .filter_map(|t| t.title.as_deref())
            .any(|t| t.contains("DC"));

        let operational_plugs = conns
            .iter()
            .filter(|c| {
                c.status_type
                    .as_ref()
                    .and_then(|s| s.is_operational)
                    .unwrap_or(false)
            })
            .count() as i32;

        // First whitespace-delimited token of the postcode, at most 4 chars.
        let district: String = postcode
            .split_whitespace()
            .next()
            .unwrap_or("")
            .chars()
            .take(4)
            .collect();

        CleanRow {
            charge_device_id: self
                .id
                .map_or_else(|| "Unknown".to_string(), |id| id.to_string()),
            name: addr
                .and_then(|a| a.title.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            latitude: addr.and_then(|a| a.latitude).unwrap_or(0.0),
            longitude: addr.and_then(|a| a.longitude).unwrap_or(0.0),
            postcode,
            town: addr
                .and_then(|a| a.town.clone())
                .unwrap_or_else(|| "London".to_string()),
            district,
            operator: self
                .operator_info
                .as_ref()
                .and_then(|o| o.title.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            usage_type: usage
                .and_then(|u| u.title.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            status: self
                .status_type
                .as_ref()
                .and_then(|s| s.title.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            pay_at_location: usage.and_then(|u| u.is_pay_at_location).unwrap_or(false),
            is_membership_required: usage
                .and_then(|u| u.is_membership_required)
                .unwrap_or(false),
            max_power_kw,
            connector_types: connector_types.join(", "),
            current_type: if has_dc { "DC" } else { "AC" }.to_string(),
            total_plugs: conns.len() as i32,
            operational_plugs,
            date_created: parse_lenient_datetime(self.date_created.as_deref()),
            data_quality_level: self.data_quality_level.unwrap_or(1),
            last_verified: parse_lenient_datetime(self.date_last_verified.as_deref()),
            data_source: DATA_SOURCE.to_string(),
            ingested_at,
        }
    }
}

// ---

/// Parse a timestamp string leniently.
///
/// Tries RFC 3339 first, then the naive formats the OCM API has been seen
/// to emit (treated as UTC), then a bare date. Missing or unparseable
/// values yield `None` rather than an error.
pub fn parse_lenient_datetime(value: Option<&str>) -> Option<DateTime<Utc>> {
    // ---
    let s = value?.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    None
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn test_connection(power_kw: f64, conn_type: &str, current: &str, operational: bool) -> Connection {
        // ---
        Connection {
            power_kw: Some(power_kw),
            connection_type: Some(ConnectionType {
                title: Some(conn_type.to_string()),
            }),
            current_type: Some(CurrentType {
                title: Some(current.to_string()),
            }),
            status_type: Some(StatusType {
                title: None,
                is_operational: Some(operational),
            }),
        }
    }

    fn test_device(postcode: &str, connections: Vec<Connection>) -> RawDevice {
        // ---
        RawDevice {
            id: Some(41230),
            address_info: Some(AddressInfo {
                title: Some("Test Charger".to_string()),
                postcode: Some(postcode.to_string()),
                town: Some("London".to_string()),
                latitude: Some(51.52),
                longitude: Some(-0.08),
            }),
            operator_info: Some(OperatorInfo {
                title: Some("Test Networks".to_string()),
            }),
            usage_type: Some(UsageType {
                title: Some("Public".to_string()),
                is_pay_at_location: Some(true),
                is_membership_required: Some(false),
            }),
            status_type: Some(StatusType {
                title: Some("Operational".to_string()),
                is_operational: Some(true),
            }),
            connections: Some(connections),
            date_created: Some("2021-06-15T09:30:00Z".to_string()),
            date_last_verified: None,
            data_quality_level: Some(3),
        }
    }

    #[test]
    fn test_zero_connection_defaults() {
        // ---
        let row = test_device("EC1V 2NX", vec![]).to_clean_row(Utc::now());

        assert_eq!(row.max_power_kw, 0.0);
        assert_eq!(row.total_plugs, 0);
        assert_eq!(row.operational_plugs, 0);
        assert_eq!(row.connector_types, "");
        assert_eq!(row.current_type, "AC");
    }

    #[test]
    fn test_max_power_and_plug_counts() {
        // ---
        let device = test_device(
            "EC2A 4BX",
            vec![
                test_connection(50.0, "CCS (Type 2)", "AC (Three-Phase)", true),
                test_connection(150.0, "CCS (Type 2)", "DC", false),
            ],
        );
        let row = device.to_clean_row(Utc::now());

        assert_eq!(row.postcode, "EC2A 4BX");
        assert_eq!(row.district, "EC2A");
        assert_eq!(row.max_power_kw, 150.0);
        assert_eq!(row.current_type, "DC");
        assert_eq!(row.total_plugs, 2);
        assert_eq!(row.operational_plugs, 1);
        // Duplicate connector title collapses to one entry
        assert_eq!(row.connector_types, "CCS (Type 2)");
    }

    #[test]
    fn test_connector_types_first_seen_order() {
        // ---
        let device = test_device(
            "WC1X 9PY",
            vec![
                test_connection(7.4, "Type 2 (Socket Only)", "AC (Single-Phase)", true),
                test_connection(50.0, "CHAdeMO", "DC", true),
                test_connection(7.4, "Type 2 (Socket Only)", "AC (Single-Phase)", true),
            ],
        );
        let row = device.to_clean_row(Utc::now());

        assert_eq!(row.connector_types, "Type 2 (Socket Only), CHAdeMO");
        assert!(row.operational_plugs <= row.total_plugs);
    }

    #[test]
    fn test_missing_power_treated_as_zero() {
        // ---
        let mut conn = test_connection(0.0, "Type 1", "AC (Single-Phase)", true);
        conn.power_kw = None;
        let row = test_device("SW1A 1AA", vec![conn]).to_clean_row(Utc::now());

        assert_eq!(row.max_power_kw, 0.0);
        assert_eq!(row.total_plugs, 1);
    }

    #[test]
    fn test_all_sub_groups_missing_resolve_to_defaults() {
        // ---
        let row = RawDevice::default().to_clean_row(Utc::now());

        assert_eq!(row.charge_device_id, "Unknown");
        assert_eq!(row.name, "Unknown");
        assert_eq!(row.latitude, 0.0);
        assert_eq!(row.longitude, 0.0);
        assert_eq!(row.postcode, "");
        assert_eq!(row.town, "London");
        assert_eq!(row.district, "");
        assert_eq!(row.operator, "Unknown");
        assert_eq!(row.usage_type, "Unknown");
        assert_eq!(row.status, "Unknown");
        assert!(!row.pay_at_location);
        assert!(!row.is_membership_required);
        assert_eq!(row.data_quality_level, 1);
        assert_eq!(row.date_created, None);
        assert_eq!(row.last_verified, None);
        assert_eq!(row.data_source, "OpenChargeMap");
    }

    #[test]
    fn test_connection_without_type_group_contributes_no_title() {
        // ---
        let conn = Connection {
            power_kw: Some(22.0),
            connection_type: None,
            current_type: None,
            status_type: None,
        };
        let row = test_device("EC1A 1BB", vec![conn]).to_clean_row(Utc::now());

        assert_eq!(row.connector_types, "");
        assert_eq!(row.current_type, "AC");
        assert_eq!(row.total_plugs, 1);
        assert_eq!(row.operational_plugs, 0);
    }

    #[test]
    fn test_district_truncated_to_four_chars() {
        // ---
        let row = test_device("EC1V2 9XX", vec![]).to_clean_row(Utc::now());
        assert_eq!(row.district, "EC1V");
    }

    #[test]
    fn test_ingested_at_passed_through() {
        // ---
        let ts = Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).unwrap();
        let row = test_device("SE1 7PB", vec![]).to_clean_row(ts);
        assert_eq!(row.ingested_at, ts);
    }

    #[test]
    fn test_lenient_datetime_rfc3339() {
        // ---
        let dt = parse_lenient_datetime(Some("2023-11-02T14:30:00Z")).unwrap();
        assert_eq!(dt.year(), 2023);
        assert_eq!(dt.month(), 11);

        // Offset form normalizes to UTC
        let dt = parse_lenient_datetime(Some("2023-11-02T14:30:00+01:00")).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 11, 2, 13, 30, 0).unwrap());
    }

    #[test]
    fn test_lenient_datetime_naive_and_date_only() {
        // ---
        let dt = parse_lenient_datetime(Some("2023-11-02T14:30:00")).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 11, 2, 14, 30, 0).unwrap());

        let dt = parse_lenient_datetime(Some("2023-11-02 14:30:00.500")).unwrap();
        assert_eq!(dt.day(), 2);

        let dt = parse_lenient_datetime(Some("2023-11-02")).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 11, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_lenient_datetime_invalid_is_none() {
        // ---
        assert_eq!(parse_lenient_datetime(None), None);
        assert_eq!(parse_lenient_datetime(Some("")), None);
        assert_eq!(parse_lenient_datetime(Some("   ")), None);
        assert_eq!(parse_lenient_datetime(Some("not a date")), None);
        assert_eq!(parse_lenient_datetime(Some("02/11/2023")), None);
    }

    #[test]
    fn test_raw_device_deserializes_ocm_json() {
        // ---
        let json = r#"{
            "ID": 98765,
            "AddressInfo": {
                "Title": "Finsbury Square Car Park",
                "Postcode": "ec2a 1ah",
                "Town": "London",
                "Latitude": 51.5208,
                "Longitude": -0.0857
            },
            "OperatorInfo": null,
            "UsageType": {"Title": "Public", "IsPayAtLocation": true},
            "StatusType": {"Title": "Operational", "IsOperational": true},
            "Connections": [
                {"PowerKW": 7.4, "ConnectionType": {"Title": "Type 2"}, "CurrentType": {"Title": "AC (Single-Phase)"}, "StatusType": {"IsOperational": true}}
            ],
            "DateCreated": "2020-01-05T10:00:00Z",
            "DataQualityLevel": 5
        }"#;

        let device: RawDevice = serde_json::from_str(json).unwrap();
        assert_eq!(device.normalized_postcode(), "EC2A 1AH");

        let row = device.to_clean_row(Utc::now());
        assert_eq!(row.charge_device_id, "98765");
        assert_eq!(row.operator, "Unknown");
        assert_eq!(row.max_power_kw, 7.4);
        assert_eq!(row.data_quality_level, 5);
        assert!(row.date_created.is_some());
    }
}
