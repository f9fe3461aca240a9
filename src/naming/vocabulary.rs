//! The fixed word lists mutant names are drawn from.
//!
//! Order matters: the seeded shuffle permutes indices into these arrays, so
//! reordering or editing an entry changes every name a given seed produces.

pub const COLORS: [&str; 18] = [
    "red", "blue", "green", "pink", "black", "white", "cyan", "gold", "yellow", "purple",
    "orange", "silver", "violet", "indigo", "maroon", "magenta", "lavender", "crimson",
];

pub const SHAPES: [&str; 17] = [
    "square", "circle", "oval", "star", "heart", "cube", "cone", "line", "triangle", "pentagon",
    "hexagon", "octagon", "diamond", "sphere", "cylinder", "pyramid", "rhombus",
];

pub const ANIMALS: [&str; 19] = [
    "cat", "dog", "bird", "fish", "lion", "bear", "wolf", "fox", "elephant", "giraffe", "monkey",
    "rabbit", "turtle", "horse", "sheep", "tiger", "leopard", "kangaroo", "panther",
];

/// Number of distinct names a single zoo can ever issue
pub const NAME_SPACE: usize = COLORS.len() * SHAPES.len() * ANIMALS.len();

/// Render the name for a (color, shape, animal) index triple
pub fn compose(color: usize, shape: usize, animal: usize) -> String {
    format!("{}_{}_{}", COLORS[color], SHAPES[shape], ANIMALS[animal]).to_lowercase()
}

/// Split a name back into its three words, if it belongs to the vocabulary
pub fn decompose(name: &str) -> Option<(&'static str, &'static str, &'static str)> {
    let mut parts = name.split('_');
    let (c, s, a) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let color = COLORS.iter().find(|w| **w == c)?;
    let shape = SHAPES.iter().find(|w| **w == s)?;
    let animal = ANIMALS.iter().find(|w| **w == a)?;
    Some((color, shape, animal))
}
