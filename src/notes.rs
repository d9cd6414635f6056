//! The note table: note names to fixed frequencies.

use crate::error::ToneError;

/// C4 through G4 in chromatic order, rounded to 0.01 Hz.
const CHROMATIC_C4: [(&str, f64); 8] = [
    ("C", 261.63),
    ("C#", 277.18),
    ("D", 293.66),
    ("D#", 311.13),
    ("E", 329.63),
    ("F", 349.23),
    ("F#", 369.99),
    ("G", 392.00),
];

/// Ordered, read-only mapping from note name to frequency in Hz.
///
/// Entries are kept in chromatic order starting at the root, so the
/// position of an entry is its semitone offset from the root.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteTable {
    entries: Vec<(String, f64)>,
}

impl Default for NoteTable {
    fn default() -> Self {
        NoteTable::chromatic()
    }
}

impl NoteTable {
    /// The page's keyboard: C, C#, D, D#, E, F, F#, G.
    pub fn chromatic() -> Self {
        NoteTable {
            entries: CHROMATIC_C4
                .iter()
                .map(|&(name, freq)| (name.to_string(), freq))
                .collect(),
        }
    }

    /// Build a table from `(name, frequency)` pairs in chromatic order.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, ToneError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut table = NoteTable {
            entries: Vec::new(),
        };
        for (name, freq) in entries {
            let name = name.into();
            if !(freq > 0.0 && freq.is_finite()) {
                return Err(ToneError::Config(format!(
                    "note '{name}' has invalid frequency {freq}"
                )));
            }
            if table.get(&name).is_some() {
                return Err(ToneError::Config(format!("duplicate note '{name}'")));
            }
            table.entries.push((name, freq));
        }
        if table.entries.is_empty() {
            return Err(ToneError::Config("note table is empty".to_string()));
        }
        Ok(table)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, freq)| freq)
    }

    /// Like [`get`](Self::get), but an absent name is an `UnknownNote` error.
    pub fn lookup(&self, name: &str) -> Result<f64, ToneError> {
        self.get(name).ok_or_else(|| ToneError::UnknownNote {
            name: name.to_string(),
        })
    }

    pub fn entry(&self, index: usize) -> Option<(&str, f64)> {
        self.entries.get(index).map(|(n, f)| (n.as_str(), *f))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn frequencies(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|&(_, f)| f)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn root(&self) -> (&str, f64) {
        let (name, freq) = &self.entries[0];
        (name.as_str(), *freq)
    }

    /// Root, major third and fifth (semitone offsets 0, 4, 7).
    pub fn major_triad(&self) -> Result<[f64; 3], ToneError> {
        let degree = |offset: usize| {
            self.entry(offset)
                .map(|(_, f)| f)
                .ok_or_else(|| ToneError::UnknownNote {
                    name: format!("{}+{offset}", self.root().0),
                })
        };
        Ok([degree(0)?, degree(4)?, degree(7)?])
    }
}

/// Parse a note name with octave (e.g. "C4", "F#3", "Bb5") into a MIDI
/// note number. C4 = 60.
pub fn note_to_midi(note: &str) -> Option<i32> {
    let mut chars = note.chars();
    let mut semitone = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let rest = chars.as_str();
    let octave = if let Some(r) = rest.strip_prefix('#') {
        semitone += 1;
        r
    } else if let Some(r) = rest.strip_prefix('b') {
        semitone -= 1;
        r
    } else {
        rest
    };
    let octave: i32 = octave.parse().ok()?;
    Some((octave + 1) * 12 + semitone)
}

/// Equal-temperament frequency of a MIDI note, with A4 (69) at `tuning_pitch`.
pub fn midi_to_frequency(midi: i32, tuning_pitch: f64) -> f64 {
    tuning_pitch * 2.0_f64.powf((midi as f64 - 69.0) / 12.0)
}
