use rand::seq::IndexedRandom;

const ADJECTIVES: &[&str] = &[
	"happy", "calm", "swift", "bright", "quiet", "bold", "keen", "warm", "cool", "fair", "kind",
	"wise", "brave", "quick", "sharp", "clear", "fresh", "light", "soft", "pure", "neat", "prime",
	"true", "fine",
];

const NOUNS: &[&str] = &[
	"fox", "bear", "owl", "wolf", "deer", "hawk", "lynx", "crow", "dove", "hare", "seal", "wren",
	"moth", "swan", "toad", "wasp", "crab", "goat", "lamb", "newt", "puma", "ram", "yak", "elk",
];

/// Generate a memorable `adjective-noun` session name.
pub fn generate_session_name() -> String {
	let mut rng = rand::rng();
	let adj = ADJECTIVES.choose(&mut rng).unwrap_or(&"happy");
	let noun = NOUNS.choose(&mut rng).unwrap_or(&"fox");
	format!("{adj}-{noun}")
}

/// Session names double as socket file names, so they are restricted to a
/// slug: lowercase alphanumerics separated by single hyphens.
pub fn is_valid_session_name(name: &str) -> bool {
	if name.is_empty() || name.contains("--") {
		return false;
	}
	let bytes = name.as_bytes();
	let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
	if !alnum(bytes[0]) || !alnum(bytes[bytes.len() - 1]) {
		return false;
	}
	bytes.iter().all(|&b| alnum(b) || b == b'-')
}
