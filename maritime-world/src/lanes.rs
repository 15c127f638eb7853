//! Named shipping lanes between major regional ports. Each lane is a
//! sequence of waypoints a vessel advances through in order, reversing or
//! hopping to a new lane at the end.

#[derive(Debug, Clone, Copy)]
pub struct Port {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

pub const PORTS: &[Port] = &[
    Port { name: "Mumbai", lat: 18.94, lon: 72.84 },
    Port { name: "Chennai", lat: 13.08, lon: 80.27 },
    Port { name: "Kochi", lat: 9.93, lon: 76.27 },
    Port { name: "Colombo", lat: 6.93, lon: 79.85 },
    Port { name: "Singapore", lat: 7.0, lon: 99.5 },
    Port { name: "Dubai", lat: 24.5, lon: 68.0 },
    Port { name: "Karachi", lat: 22.0, lon: 67.5 },
];

#[derive(Debug, Clone)]
pub struct Lane {
    pub id: &'static str,
    pub waypoints: Vec<(f64, f64)>,
}

/// Fixed set of named lanes connecting the port list. Endpoints are real
/// port coordinates (clamped into the AOI where the true port lies outside
/// it); intermediate waypoints are evenly spaced along the great-circle-ish
/// straight segment, matching the flat-earth kinematics the vessels use.
pub fn default_lanes() -> Vec<Lane> {
    let pairs: &[(&str, &str)] = &[
        ("Mumbai", "Dubai"),
        ("Mumbai", "Kochi"),
        ("Kochi", "Colombo"),
        ("Colombo", "Singapore"),
        ("Karachi", "Mumbai"),
        ("Chennai", "Colombo"),
        ("Chennai", "Singapore"),
    ];

    let find = |name: &str| -> Port {
        *PORTS.iter().find(|p| p.name == name).expect("known port")
    };

    pairs
        .iter()
        .map(|(a, b)| {
            let pa = find(a);
            let pb = find(b);
            let mut waypoints = Vec::new();
            const STEPS: usize = 4;
            for i in 0..=STEPS {
                let t = i as f64 / STEPS as f64;
                waypoints.push((
                    pa.lat + (pb.lat - pa.lat) * t,
                    pa.lon + (pb.lon - pa.lon) * t,
                ));
            }
            Lane {
                id: Box::leak(format!("{a}-{b}").into_boxed_str()),
                waypoints,
            }
        })
        .collect()
}

pub struct Lanes {
    lanes: Vec<Lane>,
}

impl Lanes {
    pub fn new() -> Self {
        Lanes { lanes: default_lanes() }
    }

    pub fn get(&self, id: &str) -> Option<&Lane> {
        self.lanes.iter().find(|l| l.id == id)
    }

    pub fn random(&self, rng: &mut impl rand::Rng) -> &Lane {
        use rand::seq::SliceRandom;
        self.lanes.choose(rng).expect("at least one lane")
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}

impl Default for Lanes {
    fn default() -> Self {
        Self::new()
    }
}

impl Lane {
    /// Waypoint at `index`, walked forward or backward depending on
    /// `forward`.
    pub fn waypoint(&self, index: usize, forward: bool) -> (f64, f64) {
        let idx = if forward {
            index.min(self.waypoints.len() - 1)
        } else {
            self.waypoints.len() - 1 - index.min(self.waypoints.len() - 1)
        };
        self.waypoints[idx]
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lanes_cover_all_pairs() {
        let lanes = Lanes::new();
        assert_eq!(lanes.len(), 7);
    }

    #[test]
    fn lane_waypoint_forward_and_backward_are_mirrored() {
        let lanes = Lanes::new();
        let lane = lanes.get("Mumbai-Dubai").unwrap();
        let first_forward = lane.waypoint(0, true);
        let first_backward = lane.waypoint(0, false);
        let last_forward = lane.waypoint(lane.len() - 1, true);
        assert_eq!(first_backward, last_forward);
        assert_ne!(first_forward, first_backward);
    }
}
