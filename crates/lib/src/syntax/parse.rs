use std::collections::HashMap;
use std::ops::Range;

use hcl_edit::Span;
use hcl_edit::structure::{Attribute, Block, BlockLabel, Body, Structure};
use tracing::trace;

use super::schema::block_schema;
use super::types::{AttributeDecl, BlockDecl, SourceFile};
use crate::diagnostics::{Diagnostic, Diagnostics, SourcePos, SourceRange};

/// Byte offset to line/column translation for one file.
struct LineIndex<'a> {
  filename: &'a str,
  line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
  fn new(filename: &'a str, src: &str) -> Self {
    let line_starts = std::iter::once(0)
      .chain(src.match_indices('\n').map(|(i, _)| i + 1))
      .collect();
    Self { filename, line_starts }
  }

  fn pos(&self, byte: usize) -> SourcePos {
    let line = self.line_starts.partition_point(|&start| start <= byte).max(1);
    SourcePos::new(line, byte - self.line_starts[line - 1] + 1, byte)
  }

  fn range(&self, span: Option<Range<usize>>) -> SourceRange {
    let span = span.unwrap_or(0..0);
    SourceRange::new(self.filename, self.pos(span.start), self.pos(span.end))
  }
}

/// Parse one Lakefile into declarations.
///
/// Structural problems (syntax errors, unknown block kinds, wrong label
/// counts, nested blocks, repeated arguments inside a block) are fatal and
/// returned as a batch. Names repeated at the top level are kept so the
/// name registry can report them alongside the rest of the directory.
pub fn parse_source(src: &str, filename: &str) -> Result<SourceFile, Diagnostics> {
  let index = LineIndex::new(filename, src);
  let (body, renamed) = parse_body(src, &index)?;

  let mut file = SourceFile::new(filename);
  let mut diags = Diagnostics::new();

  for structure in body.iter() {
    match structure {
      Structure::Attribute(attr) => file.attributes.push(attribute_decl(attr, &index, &renamed)),
      Structure::Block(block) => match block_decl(block, &index, &renamed) {
        Ok(decl) => file.blocks.push(decl),
        Err(errs) => diags.extend(errs),
      },
    }
  }

  trace!(
    file = filename,
    blocks = file.blocks.len(),
    attributes = file.attributes.len(),
    "parsed source"
  );
  diags.into_result(file)
}

/// Attribute keys that were renamed to get past the parser's own
/// repeated-key check, by key offset.
type Renamed = HashMap<usize, String>;

const REDEFINED_ATTRIBUTE: &str = "redefined attribute";

/// Parse the body. hcl-edit rejects a key repeated within one body, so each
/// repeat is renamed in a working copy to an unused key of the same byte
/// length (spans stay valid) and parsing is retried. The original key is
/// restored when declarations are built.
fn parse_body(src: &str, index: &LineIndex<'_>) -> Result<(Body, Renamed), Diagnostics> {
  let mut working = src.to_string();
  let mut renamed = Renamed::new();

  loop {
    let err = match hcl_edit::parser::parse_body(&working) {
      Ok(body) => return Ok((body, renamed)),
      Err(err) => err,
    };
    let offset = err.location().offset();
    let repeated = err
      .message()
      .contains(REDEFINED_ATTRIBUTE)
      .then(|| identifier_at(&working, offset))
      .flatten()
      .filter(|key| !renamed.contains_key(&offset) && src.get(offset..offset + key.len()) == Some(*key));
    let placeholder = repeated.and_then(|key| unused_identifier(&working, key.len()).map(|p| (key.to_string(), p)));

    let Some((key, placeholder)) = placeholder else {
      return Err(
        Diagnostic::error("Invalid syntax")
          .with_detail(err.message())
          .with_subject(index.range(Some(offset..offset)))
          .into(),
      );
    };
    trace!(key = %key, offset, "renaming repeated key");
    working.replace_range(offset..offset + key.len(), &placeholder);
    renamed.insert(offset, key);
  }
}

fn is_identifier_char(c: char) -> bool {
  c.is_alphanumeric() || c == '_' || c == '-'
}

/// The identifier starting at `offset`, if any.
fn identifier_at(src: &str, offset: usize) -> Option<&str> {
  let rest = src.get(offset..)?;
  let len = rest.find(|c: char| !is_identifier_char(c)).unwrap_or(rest.len());
  (len > 0).then(|| &rest[..len])
}

/// Whether `word` appears in `src` as a whole identifier.
fn contains_word(src: &str, word: &str) -> bool {
  src.match_indices(word).any(|(at, _)| {
    let before = src[..at].chars().next_back().is_some_and(is_identifier_char);
    let after = src[at + word.len()..].chars().next().is_some_and(is_identifier_char);
    !before && !after
  })
}

/// An ASCII identifier of `len` bytes that `src` does not use anywhere.
fn unused_identifier(src: &str, len: usize) -> Option<String> {
  const FIRST: &[u8] = b"_abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
  const REST: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz_";

  let max = (len - 1).min(3) as u32;
  let candidates = FIRST.len() * REST.len().pow(max);
  (0..candidates)
    .map(|mut n| {
      let mut ident = String::with_capacity(len);
      ident.push(FIRST[n % FIRST.len()] as char);
      n /= FIRST.len();
      for _ in 1..len {
        ident.push(REST[n % REST.len()] as char);
        n /= REST.len();
      }
      ident
    })
    .find(|ident| !matches!(ident.as_str(), "true" | "false" | "null") && !contains_word(src, ident))
}

fn attribute_decl(attr: &Attribute, index: &LineIndex<'_>, renamed: &Renamed) -> AttributeDecl {
  let range = index.range(attr.span());
  let expr_range = attr.value.span().map(|span| index.range(Some(span))).unwrap_or_else(|| range.clone());
  let name = attr
    .key
    .span()
    .and_then(|span| renamed.get(&span.start))
    .cloned()
    .unwrap_or_else(|| attr.key.as_str().to_string());
  AttributeDecl {
    name,
    expr: hcl::Expression::from(attr.value.clone()),
    range,
    expr_range,
  }
}

fn label_text(label: &BlockLabel) -> String {
  match label {
    BlockLabel::Ident(ident) => ident.as_str().to_string(),
    BlockLabel::String(string) => string.as_str().to_string(),
  }
}

fn block_decl(block: &Block, index: &LineIndex<'_>, renamed: &Renamed) -> Result<BlockDecl, Diagnostics> {
  let kind = block.ident.as_str().to_string();
  let labels: Vec<String> = block.labels.iter().map(label_text).collect();
  let span = block.span();
  let range = index.range(span.clone());

  // The header runs from the block keyword to the end of its last label.
  let header_end = block
    .labels
    .last()
    .and_then(|label| label.span())
    .or_else(|| block.ident.span())
    .map(|label| label.end);
  let def_range = match (span, header_end) {
    (Some(span), Some(end)) => index.range(Some(span.start..end)),
    _ => range.clone(),
  };

  let mut diags = Diagnostics::new();

  let Some(schema) = block_schema(&kind) else {
    return Err(
      Diagnostic::error("Unsupported block type")
        .with_detail(format!("Blocks of type \"{kind}\" are not expected here."))
        .with_subject(def_range)
        .with_context(range)
        .into(),
    );
  };

  if labels.len() < schema.labels.len() {
    diags.push(
      Diagnostic::error(format!("Missing name for {kind}"))
        .with_detail(format!(
          "All {kind} blocks must have {} label(s) ({}).",
          schema.labels.len(),
          schema.labels.join(", ")
        ))
        .with_subject(def_range.clone())
        .with_context(range.clone()),
    );
  } else if labels.len() > schema.labels.len() {
    let detail = if schema.labels.is_empty() {
      format!("No labels are expected for {kind} blocks.")
    } else {
      format!("Only {} label(s) are expected for {kind} blocks.", schema.labels.len())
    };
    diags.push(
      Diagnostic::error(format!("Extraneous label for {kind}"))
        .with_detail(detail)
        .with_subject(def_range.clone())
        .with_context(range.clone()),
    );
  }

  let mut attributes = Vec::new();
  let mut seen: HashMap<String, SourceRange> = HashMap::new();
  for structure in block.body.iter() {
    match structure {
      Structure::Attribute(attr) => {
        let decl = attribute_decl(attr, index, renamed);
        if let Some(previous) = seen.get(&decl.name) {
          diags.push(
            Diagnostic::error("Duplicate argument")
              .with_detail(format!(
                "The argument \"{}\" was already set at {}. Each argument may be set only once.",
                decl.name, previous
              ))
              .with_subject(decl.range.clone())
              .with_context(range.clone()),
          );
          continue;
        }
        seen.insert(decl.name.clone(), decl.range.clone());
        attributes.push(decl);
      }
      Structure::Block(nested) => diags.push(
        Diagnostic::error("Unsupported block type")
          .with_detail(format!(
            "Blocks of type \"{}\" are not expected inside {kind} blocks.",
            nested.ident.as_str()
          ))
          .with_subject(index.range(nested.span()))
          .with_context(range.clone()),
      ),
    }
  }

  diags.into_result(BlockDecl {
    kind,
    labels,
    attributes,
    def_range,
    range,
  })
}
