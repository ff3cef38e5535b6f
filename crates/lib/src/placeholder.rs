//! Recipe reference tokens.
//!
//! When a recipe is resolved, every expression that mentions it by name sees
//! an opaque token instead of the recipe body:
//!
//! - `{{ <id> }}` - reference to the recipe whose content address is `<id>`
//!
//! Tokens are substituted *before* the referencing recipe is hashed, so a
//! recipe's identifier transitively covers the identifiers of everything it
//! references without re-serializing nested recipe bodies.
//!
//! Text between `{{` and `}}` that is not a well-formed identifier is kept
//! as a literal, so scripts may contain other brace templates.
//!
//! # Example
//!
//! ```
//! use lake_lib::placeholder::{parse, token, Segment};
//! use lake_lib::util::hash::ObjectHash;
//!
//! let id = ObjectHash("a".repeat(32));
//! let text = format!("cp {}/bin .", token(&id));
//! assert_eq!(parse(&text), vec![
//!     Segment::Literal("cp ".to_string()),
//!     Segment::Recipe(id),
//!     Segment::Literal("/bin .".to_string()),
//! ]);
//! ```

use crate::util::hash::{OBJ_HASH_BYTES, ObjectHash};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Length of a base32-encoded identifier.
const ID_LEN: usize = OBJ_HASH_BYTES * 8 / 5;

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text (no tokens)
  Literal(String),

  /// A reference to a recipe by content address
  Recipe(ObjectHash),
}

/// Format the token that stands in for a recipe inside expressions.
pub fn token(id: &ObjectHash) -> String {
  format!("{OPEN} {id} {CLOSE}")
}

/// Split a string into literal text and recipe references.
pub fn parse(input: &str) -> Vec<Segment> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut rest = input;

  while let Some(start) = rest.find(OPEN) {
    let after_open = &rest[start + OPEN.len()..];
    let Some(end) = after_open.find(CLOSE) else {
      break;
    };

    literal.push_str(&rest[..start]);
    match parse_id(&after_open[..end]) {
      Some(id) => {
        if !literal.is_empty() {
          segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Recipe(id));
      }
      None => {
        literal.push_str(&rest[start..start + OPEN.len() + end + CLOSE.len()]);
      }
    }
    rest = &after_open[end + CLOSE.len()..];
  }

  literal.push_str(rest);
  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  segments
}

/// All recipe identifiers referenced in `input`, in order of appearance.
pub fn references(input: &str) -> Vec<ObjectHash> {
  parse(input)
    .into_iter()
    .filter_map(|segment| match segment {
      Segment::Recipe(id) => Some(id),
      Segment::Literal(_) => None,
    })
    .collect()
}

fn parse_id(content: &str) -> Option<ObjectHash> {
  let id = content.trim();
  let well_formed = id.len() == ID_LEN && id.chars().all(|c| c.is_ascii_lowercase() || ('2'..='7').contains(&c));
  well_formed.then(|| ObjectHash(id.to_string()))
}
