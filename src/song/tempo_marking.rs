// Tempo markings - Italian tempo names for a BPM value

/// Classic tempo marking with its BPM range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempoMarking {
    pub name: &'static str,
    pub bpm_min: u32,
    /// `None` means no upper bound
    pub bpm_max: Option<u32>,
}

/// Markings in ascending order; neighbouring ranges overlap
pub const TEMPO_MARKINGS: &[TempoMarking] = &[
    TempoMarking {
        name: "Larghissimo",
        bpm_min: 0,
        bpm_max: Some(24),
    },
    TempoMarking {
        name: "Grave",
        bpm_min: 25,
        bpm_max: Some(40),
    },
    TempoMarking {
        name: "Lento",
        bpm_min: 40,
        bpm_max: Some(60),
    },
    TempoMarking {
        name: "Largo",
        bpm_min: 40,
        bpm_max: Some(60),
    },
    TempoMarking {
        name: "Larghetto",
        bpm_min: 60,
        bpm_max: Some(66),
    },
    TempoMarking {
        name: "Adagio",
        bpm_min: 66,
        bpm_max: Some(76),
    },
    TempoMarking {
        name: "Andante",
        bpm_min: 76,
        bpm_max: Some(108),
    },
    TempoMarking {
        name: "Andantino",
        bpm_min: 80,
        bpm_max: Some(108),
    },
    TempoMarking {
        name: "Moderato",
        bpm_min: 108,
        bpm_max: Some(120),
    },
    TempoMarking {
        name: "Allegretto",
        bpm_min: 112,
        bpm_max: Some(120),
    },
    TempoMarking {
        name: "Allegro",
        bpm_min: 120,
        bpm_max: Some(156),
    },
    TempoMarking {
        name: "Vivace",
        bpm_min: 156,
        bpm_max: Some(176),
    },
    TempoMarking {
        name: "Presto",
        bpm_min: 168,
        bpm_max: Some(200),
    },
    TempoMarking {
        name: "Prestissimo",
        bpm_min: 200,
        bpm_max: None,
    },
];

impl TempoMarking {
    pub fn contains(&self, bpm: u32) -> bool {
        bpm >= self.bpm_min && self.bpm_max.is_none_or(|max| bpm <= max)
    }

    /// First marking whose range contains `bpm`
    pub fn for_bpm(bpm: u32) -> &'static TempoMarking {
        TEMPO_MARKINGS
            .iter()
            .find(|marking| marking.contains(bpm))
            .unwrap_or(&TEMPO_MARKINGS[TEMPO_MARKINGS.len() - 1])
    }
}
