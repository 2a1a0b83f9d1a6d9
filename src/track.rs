use crate::bbox::{BBox, Ltrb};
use serde_derive::{Deserialize, Serialize};

/// Lifecycle of a track. Newly created tracks are `Tentative` until enough
/// evidence has been collected, then `Confirmed`. `Deleted` tracks are dropped
/// from the live set at the end of the frame.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrackState {
    Tentative,
    Confirmed,
    Deleted,
}

/// Externally visible view of a live track after an update
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Track {
    pub track_id: u32,
    pub state: TrackState,
    pub bbox: BBox<Ltrb>,
    pub hits: u32,
    pub age: u32,
    pub time_since_update: u32,

    // confirmed and updated within the last frame
    pub visible: bool,
}

impl Track {
    #[inline]
    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    #[inline]
    pub fn is_tentative(&self) -> bool {
        self.state == TrackState::Tentative
    }
}
