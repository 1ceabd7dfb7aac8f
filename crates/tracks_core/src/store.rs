pub type TrackId = i64;

/// Release year as reported by the server.
///
/// `Absent` (field not sent) and `Null` (sent as `null`) are both "missing";
/// a known year of `0` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Year {
    #[default]
    Absent,
    Null,
    Known(i32),
}

impl Year {
    pub fn is_missing(self) -> bool {
        !matches!(self, Year::Known(_))
    }

    pub fn value(self) -> Option<i32> {
        match self {
            Year::Known(year) => Some(year),
            Year::Absent | Year::Null => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    pub id: TrackId,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub year: Year,
    pub spotify_year_confidence: Option<f64>,
    pub spotify_matched_title: Option<String>,
    pub spotify_matched_artist: Option<String>,
    pub spotify_matched_album: Option<String>,
}

impl Track {
    pub fn new(id: TrackId, year: Year) -> Self {
        Self {
            id,
            year,
            ..Self::default()
        }
    }

    pub fn is_missing_year(&self) -> bool {
        self.year.is_missing()
    }
}

/// The current track collection plus the "only missing years" flag.
///
/// The collection is only ever replaced as a whole.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackStore {
    tracks: Vec<Track>,
    only_missing: bool,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracks(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            only_missing: false,
        }
    }

    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub(crate) fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn only_missing(&self) -> bool {
        self.only_missing
    }

    pub fn toggle_missing_filter(&mut self) {
        self.only_missing = !self.only_missing;
    }

    pub fn filtered_view(&self, only_missing: bool) -> Vec<&Track> {
        self.tracks
            .iter()
            .filter(|track| !only_missing || track.is_missing_year())
            .collect()
    }

    /// Filtered view using the stored flag.
    pub fn visible(&self) -> Vec<&Track> {
        self.filtered_view(self.only_missing)
    }

    pub fn missing_count(&self) -> usize {
        self.tracks
            .iter()
            .filter(|track| track.is_missing_year())
            .count()
    }

    pub fn missing_ids(&self) -> Vec<TrackId> {
        self.tracks
            .iter()
            .filter(|track| track.is_missing_year())
            .map(|track| track.id)
            .collect()
    }
}
