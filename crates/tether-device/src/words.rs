//! Word lists for generated device ids (`swift-tiger-42`).

pub const ADJECTIVES: &[&str] = &[
    "amber", "bold", "brave", "bright", "brisk", "calm", "clever", "cosmic",
    "crimson", "curious", "daring", "deep", "eager", "early", "fierce", "fleet",
    "gentle", "golden", "grand", "happy", "hazel", "humble", "icy", "jade",
    "keen", "late", "lively", "lucky", "mellow", "merry", "misty", "noble",
    "pale", "proud", "quick", "quiet", "rapid", "rustic", "sable", "sharp",
    "silent", "silver", "sly", "smooth", "solar", "swift", "vivid", "wild",
];

pub const NOUNS: &[&str] = &[
    "badger", "bear", "bison", "crane", "crow", "deer", "dingo", "eagle",
    "falcon", "ferret", "finch", "fox", "gecko", "hare", "hawk", "heron",
    "hound", "ibis", "jackal", "koala", "lemur", "lion", "llama", "lynx",
    "marmot", "marten", "mole", "moose", "otter", "owl", "panda", "pike",
    "puma", "raven", "robin", "salmon", "seal", "shrew", "sparrow", "stoat",
    "swan", "tiger", "trout", "viper", "vole", "walrus", "weasel", "wolf",
];
