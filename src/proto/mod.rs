//! Generated protobuf modules for the `pds` gRPC services.
//!
//! The message and service code is checked in rather than produced by a
//! build script, so building the crate does not need `protoc`. The source
//! definition lives in `proto/pds.proto` at the repository root.

#[allow(clippy::all, clippy::pedantic, clippy::clone_on_ref_ptr, missing_docs)]
pub mod pds {
    include!("pds.rs");

    include!("pds.tonic.rs");
}

pub use pds::port_guide_client::PortGuideClient;
pub use pds::port_guide_server::{PortGuide, PortGuideServer};
pub use pds::tool_guide_client::ToolGuideClient;
pub use pds::tool_guide_server::{ToolGuide, ToolGuideServer};
pub use pds::{Circle, Content, Key, Name, Point, Port, Ports, Quest, Summary};

impl Port {
    /// Canonical store key: the first location code, if any.
    pub fn key(&self) -> Option<&str> {
        self.unlocs.first().map(String::as_str)
    }

    /// Returns `(latitude, longitude)` when the record carries exactly two
    /// coordinates. Stored order is `[longitude, latitude]`.
    pub fn lat_lon(&self) -> Option<(f64, f64)> {
        match self.coordinates.as_slice() {
            [lon, lat] => Some((f64::from(*lat), f64::from(*lon))),
            _ => None,
        }
    }

    /// True when the record takes part in geospatial queries.
    pub fn is_geo(&self) -> bool {
        self.coordinates.len() == 2
    }
}

impl Point {
    /// Builds a point from latitude and longitude in degrees.
    pub fn new(latitude: f32, longitude: f32) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True for the zero point, which the gateway treats as "not given".
    pub fn is_origin(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

impl Quest {
    /// Case-insensitive substring query.
    pub fn contains(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            sensitive: false,
            whole: false,
        }
    }
}
