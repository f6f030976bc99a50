//! Static board topology.
//!
//! The board is a ring of resource tiles around a central desert:
//!
//! - inner spot `i` touches ring tiles `i`, `i + 1` and the desert
//! - outer spot `T + i` touches ring tile `i` only
//! - edges join neighbouring inner spots, and each inner spot to its
//!   outer spot
//!
//! Everything here is immutable after construction and shared between
//! states through an `Arc`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::SearchRng;
use crate::game::{Resource, ResourceVector};

/// Number tokens in placement order; the first `T` are shuffled onto the ring.
const NUMBER_POOL: [u8; 18] = [2, 3, 4, 5, 6, 8, 9, 10, 11, 12, 3, 4, 5, 6, 8, 9, 10, 11];

/// Probability that two dice sum to `number`.
#[must_use]
pub fn roll_probability(number: u8) -> f64 {
    if !(2..=12).contains(&number) {
        return 0.0;
    }
    (6 - (i32::from(number) - 7).abs()) as f64 / 36.0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// `None` for the desert.
    pub resource: Option<Resource>,
    pub number: Option<u8>,
}

/// Harbour attached to a spot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Port {
    /// Any resource at 3:1.
    Generic,
    /// One resource at 2:1.
    Special(Resource),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Spot {
    pub tiles: SmallVec<[usize; 3]>,
    pub neighbors: SmallVec<[usize; 3]>,
    pub edges: SmallVec<[usize; 3]>,
    pub port: Option<Port>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Board {
    tiles: Vec<Tile>,
    spots: Vec<Spot>,
    edges: Vec<(usize, usize)>,
    desert: usize,
}

impl Board {
    /// Ring board with `ring_tiles` resource tiles, shuffled with `rng`.
    pub fn ring(ring_tiles: usize, rng: &mut SearchRng) -> Self {
        let t = ring_tiles;

        let mut resources: Vec<Resource> = (0..t).map(|i| Resource::ALL[i % Resource::ALL.len()]).collect();
        rng.shuffle(&mut resources);
        let mut numbers: Vec<u8> = NUMBER_POOL.iter().copied().cycle().take(t).collect();
        rng.shuffle(&mut numbers);

        let mut tiles: Vec<Tile> = resources
            .into_iter()
            .zip(numbers)
            .map(|(resource, number)| Tile {
                resource: Some(resource),
                number: Some(number),
            })
            .collect();
        tiles.push(Tile {
            resource: None,
            number: None,
        });
        let desert = t;

        let mut spots: Vec<Spot> = (0..2 * t)
            .map(|s| Spot {
                tiles: if s < t {
                    SmallVec::from_slice(&[s, (s + 1) % t, desert])
                } else {
                    SmallVec::from_slice(&[s - t])
                },
                neighbors: SmallVec::new(),
                edges: SmallVec::new(),
                port: None,
            })
            .collect();

        let mut edges = Vec::with_capacity(2 * t);
        for i in 0..t {
            edges.push((i, (i + 1) % t));
        }
        for i in 0..t {
            edges.push((i, t + i));
        }
        for (e, &(a, b)) in edges.iter().enumerate() {
            spots[a].neighbors.push(b);
            spots[a].edges.push(e);
            spots[b].neighbors.push(a);
            spots[b].edges.push(e);
        }

        // Every third outer spot is a harbour, alternating generic and special.
        for i in (0..t).step_by(3) {
            spots[t + i].port = Some(if (i / 3) % 2 == 0 {
                Port::Generic
            } else {
                match tiles[i].resource {
                    Some(r) => Port::Special(r),
                    None => Port::Generic,
                }
            });
        }

        Self {
            tiles,
            spots,
            edges,
            desert,
        }
    }

    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    #[must_use]
    pub fn spots(&self) -> &[Spot] {
        &self.spots
    }

    #[must_use]
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    #[must_use]
    pub fn tile(&self, tile: usize) -> &Tile {
        &self.tiles[tile]
    }

    #[must_use]
    pub fn spot(&self, spot: usize) -> &Spot {
        &self.spots[spot]
    }

    #[must_use]
    pub fn desert(&self) -> usize {
        self.desert
    }

    /// The end of `edge` that is not `spot`.
    #[must_use]
    pub fn other_end(&self, edge: usize, spot: usize) -> usize {
        let (a, b) = self.edges[edge];
        if a == spot {
            b
        } else {
            a
        }
    }

    /// Expected resources per roll from one building on `spot`, ignoring
    /// the robber.
    #[must_use]
    pub fn spot_production(&self, spot: usize) -> ResourceVector {
        let mut production = ResourceVector::default();
        for &tile in &self.spots[spot].tiles {
            if let Tile {
                resource: Some(resource),
                number: Some(number),
            } = self.tiles[tile]
            {
                production[resource] += roll_probability(number);
            }
        }
        production
    }
}
