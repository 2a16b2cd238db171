//! Built-in word lists for sprint names.
//!
//! Changing either list (or its order) changes every generated name, so edits
//! must go together with a new generator version.

pub const ADJECTIVES: &[&str] = &[
    "amber", "ancient", "arctic", "bold", "brave", "breezy", "bright", "calm", "clever", "cobalt",
    "cosmic", "crimson", "crisp", "curious", "daring", "dawn", "eager", "electric", "emerald",
    "fearless", "fierce", "gentle", "gilded", "glacial", "golden", "graceful", "hidden", "humble",
    "indigo", "jolly", "keen", "lively", "lucky", "lunar", "mellow", "mighty", "misty", "nimble",
    "noble", "orange", "patient", "polar", "proud", "quick", "quiet", "radiant", "rapid", "rustic",
    "scarlet", "silent", "silver", "solar", "steady", "stormy", "sunny", "swift", "tidal",
    "twilight", "valiant", "velvet", "vivid", "wandering", "wild", "witty",
];

pub const NOUNS: &[&str] = &[
    "aurora", "badger", "beacon", "canyon", "cascade", "comet", "condor", "coral", "cypress",
    "delta", "dolphin", "dune", "eagle", "ember", "falcon", "fjord", "forest", "fox", "galaxy",
    "geyser", "glacier", "harbor", "hawk", "heron", "horizon", "island", "jaguar", "lagoon",
    "lantern", "lynx", "maple", "meadow", "meteor", "mountain", "nebula", "oasis", "orbit",
    "otter", "owl", "panther", "pebble", "phoenix", "pine", "prairie", "quasar", "raven", "reef",
    "river", "sequoia", "summit", "thunder", "tiger", "tundra", "valley", "voyager", "walrus",
    "willow", "wolf", "zephyr", "atlas", "bison", "crane", "kestrel", "sparrow",
];

/// Returns the built-in adjectives as owned strings.
pub fn default_adjectives() -> Vec<String> {
    ADJECTIVES.iter().map(|w| w.to_string()).collect()
}

/// Returns the built-in nouns as owned strings.
pub fn default_nouns() -> Vec<String> {
    NOUNS.iter().map(|w| w.to_string()).collect()
}
