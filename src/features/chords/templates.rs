//! Chord template bank
//!
//! Builds the catalog of 24-element reference vectors the observation model
//! scores against. The dictionary describes each chord shape once, rooted on
//! A, as 12 bass + 12 treble pitch-class weights:
//!
//! ```text
//! m=1,0,0,0,0,0,0,0,0,0,0,0,1,0,0,1,0,0,0,1,0,0,0,0
//! ```
//!
//! Each shape is transposed to all 12 roots by rotating both halves, giving
//! names such as `Am`, `C#m` or `C/E` (bass differs from root). A flat "no
//! chord" template `N` is appended last. Template order is shape-major,
//! semitone-minor, and a template's index doubles as its HMM state.

use crate::error::AnalysisError;

/// Note names for A-rooted semitone indices
pub const NOTE_NAMES: [&str; 12] = [
    "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
];

/// Label of the "no chord" template
pub const NO_CHORD_LABEL: &str = "N";

/// Bass slots above this weight mark the sounding bass note
const BASS_THRESHOLD: f32 = 0.99;

/// Values per dictionary row (12 bass + 12 treble)
const TEMPLATE_SIZE: usize = 24;

/// Default chord dictionary
///
/// Field 1 is the chord type suffix, fields 2-13 bass pitch weights (A..G#),
/// fields 14-25 treble pitch weights (A..G#).
pub const DEFAULT_CHORD_DICTIONARY: &str = "
### Comma-separated chord dictionary
# field 1 is chord type name, 2-13 bass pitch (A-Ab), 14-25 treble pitch (A-Ab)

=1,0,0,0,0,0,0,0,0,0,0,0,1,0,0,0,1,0,0,1,0,0,0,0
=0,0,0,0,0,0,0,0,0,0,0,0,1,0,0,0,1,0,0,1,0,0,0,0
m=1,0,0,0,0,0,0,0,0,0,0,0,1,0,0,1,0,0,0,1,0,0,0,0
m=0,0,0,0,0,0,0,0,0,0,0,0,1,0,0,1,0,0,0,1,0,0,0,0
dim7=0,0,0,0,0,0,0,0,0,0,1,0,1,0,0,1,0,0,1,0,0,0,1,0
dim7=1,0,0,0,0,0,0,0,0,0,0,0,1,0,0,1,0,0,1,0,0,0,1,0
6=1,0,0,0,0,0,0,0,0,0,0,0,1,0,0,0,1,0,0,1,0,1,0,0
7=1,0,0,0,0,0,0,0,0,0,0,0,1,0,0,0,1,0,0,1,0,0,1,0
maj7=1,0,0,0,0,0,0,0,0,0,0,0,1,0,0,0,1,0,0,1,0,0,0,1
m7=1,0,0,0,0,0,0,0,0,0,0,0,1,0,0,1,0,0,0,1,0,0,1,0
m6=1,0,0,0,0,0,0,0,0,0,0,0,1,0,0,1,0,0,0,1,0,1,0,0
=0,0,0,0,1,0,0,0,0,0,0,0,1,0,0,0,1,0,0,1,0,0,0,0
=0,0,0,0,0,0,0,1,0,0,0,0,1,0,0,0,1,0,0,1,0,0,0,0
dim=1,0,0,0,0,0,0,0,0,0,0,0,1,0,0,1,0,0,1,0,0,0,0,0
aug=1,0,0,0,0,0,0,0,0,0,0,0,1,0,0,0,1,0,0,0,1,0,0,0
=0,0,1,0,0,0,0,0,0,0,0,0,1,0,0,0,1,0,0,1,0,0,0,0
=0,0,0,0,0,0,0,0,0,0,1,0,1,0,0,0,1,0,0,1,0,0,0,0
7=0,0,0,0,1,0,0,0,0,0,0,0,1,0,0,0,1,0,0,1,0,0,1,0
";

/// One chord shape as read from the dictionary (A-rooted)
#[derive(Debug, Clone, PartialEq)]
pub struct ChordShape {
    /// Chord type suffix (empty for major triads)
    pub suffix: String,
    /// 12 bass + 12 treble weights
    pub weights: [f32; TEMPLATE_SIZE],
}

/// A transposed, normalized chord template
#[derive(Debug, Clone, PartialEq)]
pub struct ChordTemplate {
    /// Display label, e.g. `C`, `F#m7`, `D/F#` or `N`
    pub name: String,
    /// Root as an A-rooted semitone (0 = A), `None` for `N`
    pub root: Option<usize>,
    /// Chord type suffix from the dictionary
    pub shape: String,
    /// Bass note (A-rooted) when it differs from the root
    pub bass: Option<usize>,
    /// Normalized 24-element vector
    pub vector: [f32; TEMPLATE_SIZE],
}

impl ChordTemplate {
    /// Whether this is the "no chord" template
    pub fn is_no_chord(&self) -> bool {
        self.root.is_none()
    }
}

/// Immutable bank of chord templates
#[derive(Debug, Clone)]
pub struct TemplateBank {
    templates: Vec<ChordTemplate>,
    no_chord_index: usize,
}

impl TemplateBank {
    /// Build the bank from the embedded default dictionary
    ///
    /// # Arguments
    ///
    /// * `no_chord_lenience` - Divisor applied to the `N` template norm (1.1 by default)
    pub fn with_default_dictionary(no_chord_lenience: f32) -> Result<Self, AnalysisError> {
        Self::from_dictionary(DEFAULT_CHORD_DICTIONARY, no_chord_lenience)
    }

    /// Build the bank from dictionary text
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::InvalidTemplate` on malformed rows or when the
    /// dictionary contains no shapes.
    pub fn from_dictionary(text: &str, no_chord_lenience: f32) -> Result<Self, AnalysisError> {
        if !(no_chord_lenience > 0.0) {
            return Err(AnalysisError::InvalidTemplate(format!(
                "No-chord lenience must be positive, got {}",
                no_chord_lenience
            )));
        }

        let shapes = parse_dictionary(text)?;
        if shapes.is_empty() {
            return Err(AnalysisError::InvalidTemplate(
                "Chord dictionary contains no shapes".to_string(),
            ));
        }

        let mut templates = Vec::with_capacity(shapes.len() * 12 + 1);
        for shape in &shapes {
            for semitone in 0..12 {
                templates.push(transpose_shape(shape, semitone));
            }
        }

        let mut n_vector = [0.0f32; TEMPLATE_SIZE];
        for k in 0..12 {
            n_vector[k] = 0.5;
            n_vector[k + 12] = 1.0;
        }
        templates.push(ChordTemplate {
            name: NO_CHORD_LABEL.to_string(),
            root: None,
            shape: String::new(),
            bass: None,
            vector: n_vector,
        });

        for template in &mut templates {
            let mut norm = rms(&template.vector);
            if template.is_no_chord() {
                norm /= no_chord_lenience;
            }
            if norm > 0.0 {
                for v in template.vector.iter_mut() {
                    *v /= norm;
                }
            }
        }

        let no_chord_index = templates.len() - 1;

        log::debug!(
            "Built chord template bank: {} shapes, {} templates",
            shapes.len(),
            templates.len()
        );

        Ok(Self {
            templates,
            no_chord_index,
        })
    }

    /// All templates in state order
    pub fn templates(&self) -> &[ChordTemplate] {
        &self.templates
    }

    /// Template at a state index
    pub fn get(&self, index: usize) -> Option<&ChordTemplate> {
        self.templates.get(index)
    }

    /// Display label for a state index
    pub fn name(&self, index: usize) -> Option<&str> {
        self.templates.get(index).map(|t| t.name.as_str())
    }

    /// State index of the `N` template (always the last entry)
    pub fn no_chord_index(&self) -> usize {
        self.no_chord_index
    }

    /// Number of templates, `N` included
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Always false for a constructed bank
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Parse dictionary rows of the form `<suffix>=<24 comma-separated weights>`
///
/// Blank lines and lines starting with `#` are skipped.
///
/// # Errors
///
/// Returns `AnalysisError::InvalidTemplate` naming the 1-based line number when
/// a row lacks `=`, has the wrong number of fields or a non-numeric weight.
pub fn parse_dictionary(text: &str) -> Result<Vec<ChordShape>, AnalysisError> {
    let mut shapes = Vec::new();

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (suffix, values) = line.split_once('=').ok_or_else(|| {
            AnalysisError::InvalidTemplate(format!(
                "line {}: expected '<shape>=<weights>', got '{}'",
                line_no + 1,
                line
            ))
        })?;

        let fields: Vec<&str> = values.split(',').map(str::trim).collect();
        if fields.len() != TEMPLATE_SIZE {
            return Err(AnalysisError::InvalidTemplate(format!(
                "line {}: expected {} weights, got {}",
                line_no + 1,
                TEMPLATE_SIZE,
                fields.len()
            )));
        }

        let mut weights = [0.0f32; TEMPLATE_SIZE];
        for (slot, field) in weights.iter_mut().zip(fields.iter()) {
            let value: f32 = field.parse().map_err(|_| {
                AnalysisError::InvalidTemplate(format!(
                    "line {}: weight '{}' is not a number",
                    line_no + 1,
                    field
                ))
            })?;
            if !value.is_finite() {
                return Err(AnalysisError::InvalidTemplate(format!(
                    "line {}: weight '{}' is not finite",
                    line_no + 1,
                    field
                )));
            }
            *slot = value;
        }

        shapes.push(ChordShape {
            suffix: suffix.trim().to_string(),
            weights,
        });
    }

    Ok(shapes)
}

/// Rotate both 12-slot halves right by `shift` semitones
pub fn rotate(vector: &[f32; TEMPLATE_SIZE], shift: i32) -> [f32; TEMPLATE_SIZE] {
    let shift = shift.rem_euclid(12) as usize;
    let mut out = [0.0f32; TEMPLATE_SIZE];
    for k in 0..12 {
        let src = (k + 12 - shift) % 12;
        out[k] = vector[src];
        out[k + 12] = vector[src + 12];
    }
    out
}

/// Transpose a shape to a root and derive its label (unnormalized)
fn transpose_shape(shape: &ChordShape, semitone: usize) -> ChordTemplate {
    let vector = rotate(&shape.weights, semitone as i32);
    let root = semitone % 12;
    let bass_slot = vector[..12].iter().position(|&v| v > BASS_THRESHOLD);

    let mut name = format!("{}{}", NOTE_NAMES[root], shape.suffix);
    let bass = match bass_slot {
        Some(b) if b != root => {
            name.push('/');
            name.push_str(NOTE_NAMES[b]);
            Some(b)
        }
        _ => None,
    };

    ChordTemplate {
        name,
        root: Some(root),
        shape: shape.suffix.clone(),
        bass,
        vector,
    }
}

/// Root-mean-square over all 24 slots
fn rms(vector: &[f32; TEMPLATE_SIZE]) -> f32 {
    (vector.iter().map(|v| v * v).sum::<f32>() / TEMPLATE_SIZE as f32).sqrt()
}
