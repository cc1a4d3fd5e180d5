/// Calculation method codes the timing provider understands, with labels.
/// The codes are passed through untouched.
pub const CALCULATION_METHODS: &[(&str, &str)] = &[
    ("MWL", "Muslim World League"),
    ("ISNA", "Islamic Society of North America"),
    ("Egypt", "Egyptian General Authority"),
    ("Makkah", "Umm Al-Qura University, Makkah"),
    ("Karachi", "University of Islamic Sciences, Karachi"),
    ("Tehran", "Institute of Geophysics, University of Tehran"),
    ("Jafari", "Shia Ithna-Ashari, Leva Institute, Qum"),
];

pub const DEFAULT_METHOD: &str = "MWL";

pub fn is_known_method(code: &str) -> bool {
    CALCULATION_METHODS.iter().any(|(c, _)| *c == code)
}

pub fn method_label(code: &str) -> Option<&'static str> {
    CALCULATION_METHODS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
}
