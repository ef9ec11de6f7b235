//! # Engine Primitives
//!
//! Hardcoded runtime constants for the autstr engine.
//!
//! These primitives are compiled into the binary and are immutable at runtime.
//!
//! ## Primitives
//!
//! 1. **Tape alphabet**: binary digits plus one padding letter.
//! 2. **Reserved names**: the universe relation and internal name prefixes.
//! 3. **Limits**: default budgets and hard caps for product alphabets.

/// Digits of the default tape alphabet, least significant first on the tape.
pub const BINARY_DIGITS: [char; 2] = ['0', '1'];

/// The padding character that extends shorter tapes of a convolution.
pub const PADDING_CHAR: char = '*';

/// Name of the universe (domain) relation in every presentation.
pub const UNIVERSE: &str = "U";

/// Prefix of compiler-generated variable and relation names.
///
/// User identifiers cannot start with this character, so generated names
/// never collide with user names.
pub const INTERNAL_PREFIX: char = '%';

/// Magic bytes for the autstr binary format header.
///
/// - File Header = Magic Bytes ("AUTS") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"AUTS";

/// Current serialization format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;

/// Default cap on the number of states any single operator may create.
///
/// Determinization is exponential in the worst case; the cap turns a
/// runaway construction into a `ResourceExceeded` error.
pub const DEFAULT_MAX_STATES: usize = 1_000_000;

/// Maximum number of product symbols of one automaton.
///
/// With three letters per tape this admits up to 12 tapes.
pub const MAX_SYMBOLS: usize = 531_441;

/// Number of construction steps between two wall-clock checks.
pub const DEADLINE_CHECK_INTERVAL: usize = 256;
