use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One of the four physical sensor modalities. Used as the map key in
/// track provenance and as the tag on every [`Observation`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Ais,
    Radar,
    Satellite,
    Drone,
}

impl SensorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Ais => "ais",
            SensorKind::Radar => "radar",
            SensorKind::Satellite => "satellite",
            SensorKind::Drone => "drone",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ais" => Some(SensorKind::Ais),
            "radar" => Some(SensorKind::Radar),
            "satellite" => Some(SensorKind::Satellite),
            "drone" => Some(SensorKind::Drone),
            _ => None,
        }
    }

    /// 1-sigma position error, meters, per the sensor characteristics table.
    pub fn position_error_m(&self) -> f64 {
        match self {
            SensorKind::Ais => 10.0,
            SensorKind::Radar => 500.0,
            SensorKind::Satellite => 2000.0,
            SensorKind::Drone => 50.0,
        }
    }

    /// The bus topic this sensor's observations are published to.
    pub fn topic(&self) -> &'static str {
        match self {
            SensorKind::Ais => "ais:positions",
            SensorKind::Radar => "radar:contacts",
            SensorKind::Satellite => "satellite:detections",
            SensorKind::Drone => "drone:detections",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed, typed message off one of the four sensor streams. Bus field
/// parsing into this type is the boundary past which the correlator and
/// track manager never see stringly-typed data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Observation {
    Ais(AisObservation),
    Radar(RadarObservation),
    Satellite(SatelliteObservation),
    Drone(DroneObservation),
}

impl Observation {
    pub fn kind(&self) -> SensorKind {
        match self {
            Observation::Ais(_) => SensorKind::Ais,
            Observation::Radar(_) => SensorKind::Radar,
            Observation::Satellite(_) => SensorKind::Satellite,
            Observation::Drone(_) => SensorKind::Drone,
        }
    }

    pub fn latitude(&self) -> f64 {
        match self {
            Observation::Ais(o) => o.latitude,
            Observation::Radar(o) => o.latitude,
            Observation::Satellite(o) => o.latitude,
            Observation::Drone(o) => o.latitude,
        }
    }

    pub fn longitude(&self) -> f64 {
        match self {
            Observation::Ais(o) => o.longitude,
            Observation::Radar(o) => o.longitude,
            Observation::Satellite(o) => o.longitude,
            Observation::Drone(o) => o.longitude,
        }
    }

    pub fn mmsi(&self) -> Option<&str> {
        match self {
            Observation::Ais(o) => Some(o.mmsi.as_str()),
            Observation::Drone(o) => o.mmsi.as_deref(),
            _ => None,
        }
    }

    pub fn speed_knots(&self) -> Option<f64> {
        match self {
            Observation::Ais(o) => Some(o.speed_knots),
            Observation::Radar(o) => Some(o.speed_knots),
            Observation::Drone(_) => None,
            Observation::Satellite(_) => None,
        }
    }

    pub fn course_deg(&self) -> Option<f64> {
        match self {
            Observation::Ais(o) => Some(o.course),
            Observation::Radar(o) => Some(o.course),
            Observation::Drone(_) => None,
            Observation::Satellite(_) => None,
        }
    }

    pub fn timestamp_ms(&self) -> i64 {
        match self {
            Observation::Ais(o) => o.timestamp_ms,
            Observation::Radar(o) => o.timestamp_ms,
            Observation::Satellite(o) => o.timestamp_ms,
            Observation::Drone(o) => o.timestamp_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AisObservation {
    pub mmsi: String,
    pub ship_name: String,
    pub ship_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_knots: f64,
    pub course: f64,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarObservation {
    pub track_id: String,
    pub station_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_knots: f64,
    pub course: f64,
    pub quality: u8,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteObservation {
    pub detection_id: String,
    pub source_satellite: String,
    pub latitude: f64,
    pub longitude: f64,
    pub vessel_length_m: f64,
    pub confidence: f64,
    pub is_dark_ship: bool,
    pub timestamp_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneObservation {
    pub detection_id: String,
    pub drone_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub confidence: f64,
    pub object_class: String,
    pub estimated_length_m: f64,
    pub estimated_width_m: f64,
    pub frame_id: String,
    pub visual_name: String,
    pub mmsi: Option<String>,
    pub timestamp_ms: i64,
}

/// Raised when bus fields don't satisfy a topic's required schema. The
/// fusion runner counts and drops these rather than retrying parse.
#[derive(Debug, Clone, thiserror::Error)]
#[error("malformed observation on {topic}: missing or invalid field `{field}`")]
pub struct SchemaError {
    pub topic: String,
    pub field: String,
}

fn field<'a>(fields: &'a HashMap<String, String>, topic: &str, key: &str) -> Result<&'a str, SchemaError> {
    fields
        .get(key)
        .map(|s| s.as_str())
        .ok_or_else(|| SchemaError {
            topic: topic.to_string(),
            field: key.to_string(),
        })
}

fn parse_f64(fields: &HashMap<String, String>, topic: &str, key: &str) -> Result<f64, SchemaError> {
    field(fields, topic, key)?
        .parse::<f64>()
        .map_err(|_| SchemaError {
            topic: topic.to_string(),
            field: key.to_string(),
        })
}

fn parse_i64(fields: &HashMap<String, String>, topic: &str, key: &str) -> Result<i64, SchemaError> {
    field(fields, topic, key)?
        .parse::<i64>()
        .map_err(|_| SchemaError {
            topic: topic.to_string(),
            field: key.to_string(),
        })
}

impl Observation {
    /// Parse raw bus fields for a known topic into a typed observation.
    /// This is the sole boundary that sees stringly-typed wire data.
    pub fn parse(topic: &str, fields: &HashMap<String, String>) -> Result<Observation, SchemaError> {
        match topic {
            "ais:positions" => Ok(Observation::Ais(AisObservation {
                mmsi: field(fields, topic, "mmsi")?.to_string(),
                ship_name: fields.get("ship_name").cloned().unwrap_or_default(),
                ship_type: fields.get("ship_type").cloned().unwrap_or_default(),
                latitude: parse_f64(fields, topic, "latitude")?,
                longitude: parse_f64(fields, topic, "longitude")?,
                speed_knots: parse_f64(fields, topic, "speed_knots")?,
                course: parse_f64(fields, topic, "course")?,
                timestamp_ms: parse_i64(fields, topic, "timestamp")?,
            })),
            "radar:contacts" => Ok(Observation::Radar(RadarObservation {
                track_id: field(fields, topic, "track_id")?.to_string(),
                station_id: field(fields, topic, "station_id")?.to_string(),
                latitude: parse_f64(fields, topic, "latitude")?,
                longitude: parse_f64(fields, topic, "longitude")?,
                speed_knots: parse_f64(fields, topic, "speed_knots")?,
                course: parse_f64(fields, topic, "course")?,
                quality: field(fields, topic, "quality")?
                    .parse::<u8>()
                    .map_err(|_| SchemaError { topic: topic.into(), field: "quality".into() })?,
                timestamp_ms: parse_i64(fields, topic, "timestamp")?,
            })),
            "satellite:detections" => Ok(Observation::Satellite(SatelliteObservation {
                detection_id: field(fields, topic, "detection_id")?.to_string(),
                source_satellite: field(fields, topic, "source_satellite")?.to_string(),
                latitude: parse_f64(fields, topic, "latitude")?,
                longitude: parse_f64(fields, topic, "longitude")?,
                vessel_length_m: parse_f64(fields, topic, "vessel_length_m")?,
                confidence: parse_f64(fields, topic, "confidence")?,
                is_dark_ship: field(fields, topic, "is_dark_ship")? == "True",
                timestamp_ms: parse_i64(fields, topic, "timestamp")?,
            })),
            "drone:detections" => Ok(Observation::Drone(DroneObservation {
                detection_id: field(fields, topic, "detection_id")?.to_string(),
                drone_id: field(fields, topic, "drone_id")?.to_string(),
                latitude: parse_f64(fields, topic, "latitude")?,
                longitude: parse_f64(fields, topic, "longitude")?,
                confidence: parse_f64(fields, topic, "confidence")?,
                object_class: field(fields, topic, "object_class")?.to_string(),
                estimated_length_m: parse_f64(fields, topic, "estimated_length_m")?,
                estimated_width_m: parse_f64(fields, topic, "estimated_width_m")?,
                frame_id: field(fields, topic, "frame_id")?.to_string(),
                visual_name: fields.get("visual_name").cloned().unwrap_or_else(|| "UNREADABLE".into()),
                mmsi: fields.get("mmsi").filter(|s| !s.is_empty()).cloned(),
                timestamp_ms: parse_i64(fields, topic, "timestamp")?,
            })),
            other => Err(SchemaError {
                topic: other.to_string(),
                field: "<topic>".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_ais_observation() {
        let mut fields = HashMap::new();
        fields.insert("mmsi".into(), "123456789".into());
        fields.insert("ship_name".into(), "MV Test".into());
        fields.insert("ship_type".into(), "cargo".into());
        fields.insert("latitude".into(), "18.9".into());
        fields.insert("longitude".into(), "72.8".into());
        fields.insert("speed_knots".into(), "12.0".into());
        fields.insert("course".into(), "90.0".into());
        fields.insert("timestamp".into(), "1000".into());

        let obs = Observation::parse("ais:positions", &fields).unwrap();
        assert_eq!(obs.kind(), SensorKind::Ais);
        assert_eq!(obs.mmsi(), Some("123456789"));
    }

    #[test]
    fn rejects_missing_required_field() {
        let mut fields = HashMap::new();
        fields.insert("mmsi".into(), "123456789".into());
        let err = Observation::parse("ais:positions", &fields).unwrap_err();
        assert_eq!(err.topic, "ais:positions");
    }

    #[test]
    fn drone_defaults_visual_name_to_unreadable() {
        let mut fields = HashMap::new();
        fields.insert("detection_id".into(), "D1".into());
        fields.insert("drone_id".into(), "DRN-001".into());
        fields.insert("latitude".into(), "18.9".into());
        fields.insert("longitude".into(), "72.8".into());
        fields.insert("confidence".into(), "0.9".into());
        fields.insert("object_class".into(), "cargo".into());
        fields.insert("estimated_length_m".into(), "180".into());
        fields.insert("estimated_width_m".into(), "28".into());
        fields.insert("frame_id".into(), "F1".into());
        fields.insert("timestamp".into(), "1000".into());

        let obs = Observation::parse("drone:detections", &fields).unwrap();
        match obs {
            Observation::Drone(d) => assert_eq!(d.visual_name, "UNREADABLE"),
            _ => panic!("wrong variant"),
        }
    }
}
