//! Read-only queries over the port store.
//!
//! Every query is a single pass over [`PortStore::for_each`]. Because the
//! scan is not a snapshot, results reflect whatever was present while the
//! pass ran, in store iteration order.
//!
//! The `lookup_*` methods report absence as `None`. The `get_*`/`find_nearest`
//! methods keep the wire contract, where absence is a zero-valued [`Port`].

pub mod text;

use crate::core::geo::haversine;
use crate::proto::{Circle, Point, Port, Quest};
use crate::storage::PortStore;
use std::ops::ControlFlow;
use std::sync::Arc;

pub use text::TextMatcher;

/// Query engine bound to one store.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: Arc<PortStore>,
}

impl QueryEngine {
    /// Create a query engine over the given store
    pub fn new(store: Arc<PortStore>) -> Self {
        Self { store }
    }

    /// The store this engine reads from.
    pub fn store(&self) -> &Arc<PortStore> {
        &self.store
    }

    /// Exact key lookup.
    pub fn lookup_key(&self, key: &str) -> Option<Arc<Port>> {
        self.store.get(key)
    }

    /// Exact key lookup; an absent key yields an empty record.
    pub fn get_by_key(&self, key: &str) -> Port {
        or_empty(self.lookup_key(key))
    }

    /// First record whose name equals `name` exactly. Which one is "first"
    /// depends on scan order when several records share a name.
    pub fn lookup_name(&self, name: &str) -> Option<Arc<Port>> {
        let mut found = None;
        self.store.for_each(|port| {
            if port.name == name {
                found = Some(Arc::clone(port));
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        found
    }

    /// Name lookup; no match yields an empty record.
    pub fn get_by_name(&self, name: &str) -> Port {
        or_empty(self.lookup_name(name))
    }

    /// Geo-enabled record closest to `point` by great-circle distance.
    pub fn lookup_nearest(&self, point: &Point) -> Option<Arc<Port>> {
        let (lat, lon) = (f64::from(point.latitude), f64::from(point.longitude));
        let mut best: Option<Arc<Port>> = None;
        let mut distance = f64::INFINITY;

        self.store.for_each(|port| {
            if let Some((plat, plon)) = port.lat_lon() {
                let d = haversine(lat, lon, plat, plon);
                if d < distance {
                    distance = d;
                    best = Some(Arc::clone(port));
                }
            }
            ControlFlow::Continue(())
        });
        best
    }

    /// Nearest record; an empty store yields an empty record.
    pub fn find_nearest(&self, point: &Point) -> Port {
        or_empty(self.lookup_nearest(point))
    }

    /// Geo-enabled records strictly inside the circle. A missing center is
    /// treated as the origin.
    pub fn find_in_circle(&self, circle: &Circle) -> Vec<Port> {
        let center = circle.center.unwrap_or_default();
        let (lat, lon) = (f64::from(center.latitude), f64::from(center.longitude));
        let radius = f64::from(circle.radius);

        let mut list = Vec::new();
        self.store.for_each(|port| {
            if let Some((plat, plon)) = port.lat_lon() {
                if haversine(lat, lon, plat, plon) < radius {
                    list.push(Port::clone(port));
                }
            }
            ControlFlow::Continue(())
        });
        list
    }

    /// Records where any of name, city, province or country matches.
    pub fn find_text(&self, quest: &Quest) -> Vec<Port> {
        let matcher = TextMatcher::new(quest);
        let mut list = Vec::new();
        self.store.for_each(|port| {
            if matcher.matches_port(port) {
                list.push(Port::clone(port));
            }
            ControlFlow::Continue(())
        });
        list
    }
}

fn or_empty(port: Option<Arc<Port>>) -> Port {
    port.map(|p| Port::clone(&p)).unwrap_or_default()
}
