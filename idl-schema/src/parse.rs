//! A WebIDL reader that keeps only what shape checks need.
//!
//! Recognized: `interface`, `partial interface`, `interface mixin`, `X includes Y;`, attributes,
//! operations and constants. Dictionaries, enums, typedefs, callbacks and namespaces are skipped,
//! as are static members, constructors and iterable/maplike/setlike declarations.

use crate::{InterfaceDecl, Member, MemberKind, SchemaError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Definitions {
  pub interfaces: Vec<InterfaceDecl>,
  pub includes: Vec<Includes>,
}

/// An `A includes B;` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Includes {
  pub target: String,
  pub mixin: String,
  pub line: usize,
}

pub fn parse_definitions(src: &str) -> Result<Definitions, SchemaError> {
  let tokens = tokenize(src)?;
  let mut parser = Parser { tokens, pos: 0 };
  parser.definitions()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
  Ident(String),
  Punct(char),
  Literal,
}

#[derive(Debug, Clone)]
struct Token {
  tok: Tok,
  line: usize,
}

fn tokenize(src: &str) -> Result<Vec<Token>, SchemaError> {
  let chars: Vec<char> = src.strip_prefix('\u{feff}').unwrap_or(src).chars().collect();
  let mut out = Vec::new();
  let mut line = 1;
  let mut i = 0;

  while i < chars.len() {
    let c = chars[i];
    let next = chars.get(i + 1).copied();

    if c == '\n' {
      line += 1;
      i += 1;
      continue;
    }
    if c.is_whitespace() {
      i += 1;
      continue;
    }

    if c == '/' && next == Some('/') {
      while i < chars.len() && chars[i] != '\n' {
        i += 1;
      }
      continue;
    }

    if c == '/' && next == Some('*') {
      let start_line = line;
      i += 2;
      loop {
        match chars.get(i) {
          None => {
            return Err(SchemaError::Parse {
              line: start_line,
              message: "unterminated block comment".to_string(),
            })
          }
          Some('*') if chars.get(i + 1) == Some(&'/') => {
            i += 2;
            break;
          }
          Some('\n') => line += 1,
          Some(_) => {}
        }
        i += 1;
      }
      continue;
    }

    if c == '"' {
      let start_line = line;
      i += 1;
      while i < chars.len() && chars[i] != '"' {
        if chars[i] == '\n' {
          line += 1;
        }
        i += 1;
      }
      if i >= chars.len() {
        return Err(SchemaError::Parse {
          line: start_line,
          message: "unterminated string literal".to_string(),
        });
      }
      i += 1;
      out.push(Token {
        tok: Tok::Literal,
        line: start_line,
      });
      continue;
    }

    let starts_number = c.is_ascii_digit()
      || ((c == '-' || c == '.') && next.map_or(false, |n| n.is_ascii_digit()));
    if starts_number {
      i += 1;
      while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
        i += 1;
      }
      out.push(Token {
        tok: Tok::Literal,
        line,
      });
      continue;
    }

    if c.is_ascii_alphabetic() || c == '_' {
      let start = i;
      i += 1;
      while i < chars.len()
        && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '-')
      {
        i += 1;
      }
      out.push(Token {
        tok: Tok::Ident(chars[start..i].iter().collect()),
        line,
      });
      continue;
    }

    out.push(Token {
      tok: Tok::Punct(c),
      line,
    });
    i += 1;
  }

  Ok(out)
}

/// Type keywords that can directly precede an unnamed special operation's argument list.
const TYPE_KEYWORDS: &[&str] = &[
  "any",
  "bigint",
  "boolean",
  "byte",
  "ByteString",
  "DOMString",
  "double",
  "float",
  "long",
  "object",
  "octet",
  "short",
  "symbol",
  "undefined",
  "USVString",
];

struct Parser {
  tokens: Vec<Token>,
  pos: usize,
}

impl Parser {
  fn definitions(&mut self) -> Result<Definitions, SchemaError> {
    let mut defs = Definitions::default();

    loop {
      self.skip_ext_attrs()?;
      let Some(word) = self.peek_ident().map(str::to_string) else {
        if self.peek().is_none() {
          break;
        }
        return Err(self.error("expected a definition"));
      };

      match word.as_str() {
        "partial" => {
          self.pos += 1;
          if self.eat_ident("interface") {
            defs.interfaces.push(self.interface(true)?);
          } else {
            self.skip_until_semicolon()?;
          }
        }
        "interface" => {
          self.pos += 1;
          defs.interfaces.push(self.interface(false)?);
        }
        "callback" | "dictionary" | "enum" | "namespace" | "typedef" => {
          self.skip_until_semicolon()?;
        }
        _ => {
          let line = self.line();
          let target = self.expect_name()?;
          if !self.eat_ident("includes") {
            return Err(self.error(&format!("unexpected identifier `{target}`")));
          }
          let mixin = self.expect_name()?;
          self.expect_punct(';')?;
          defs.includes.push(Includes {
            target,
            mixin,
            line,
          });
        }
      }
    }

    Ok(defs)
  }

  fn interface(&mut self, partial: bool) -> Result<InterfaceDecl, SchemaError> {
    let line = self.line();
    let mixin = self.eat_ident("mixin");
    let name = self.expect_name()?;
    let parent = if self.eat_punct(':') {
      Some(self.expect_name()?)
    } else {
      None
    };
    self.expect_punct('{')?;

    let mut members = Vec::new();
    loop {
      self.skip_ext_attrs()?;
      if self.eat_punct('}') {
        break;
      }
      if self.peek().is_none() {
        return Err(self.error(&format!("unterminated interface `{name}`")));
      }
      if let Some(member) = self.member()? {
        members.push(member);
      }
    }
    self.expect_punct(';')?;

    Ok(InterfaceDecl {
      name,
      parent,
      members,
      partial,
      mixin,
      line: Some(line),
    })
  }

  fn member(&mut self) -> Result<Option<Member>, SchemaError> {
    let Some(word) = self.peek_ident().map(str::to_string) else {
      if self.peek_punct_at(0) == Some('(') {
        return self.operation();
      }
      return Err(self.error("expected an interface member"));
    };

    match word.as_str() {
      "const" => {
        self.pos += 1;
        let tokens = self.collect_until(|t| matches!(t, Tok::Punct('=' | ';' | '}')))?;
        if self.peek_punct_at(0) != Some('=') {
          return Err(self.error("constant without a value"));
        }
        let name = last_ident(&tokens).ok_or_else(|| self.error("constant without a name"))?;
        self.skip_until_semicolon()?;
        return Ok(Some(Member::new(name, MemberKind::Readonly)));
      }
      "constructor" | "static" | "iterable" | "maplike" | "setlike" => {
        self.skip_until_semicolon()?;
        return Ok(None);
      }
      "async" if self.peek_ident_at(1) == Some("iterable") => {
        self.skip_until_semicolon()?;
        return Ok(None);
      }
      "readonly" if matches!(self.peek_ident_at(1), Some("maplike" | "setlike")) => {
        self.skip_until_semicolon()?;
        return Ok(None);
      }
      "stringifier" if self.peek_punct_at(1) == Some(';') => {
        self.pos += 2;
        return Ok(None);
      }
      _ => {}
    }

    self.eat_ident("stringifier");
    self.eat_ident("inherit");
    let readonly = self.eat_ident("readonly");
    if self.eat_ident("attribute") {
      return self.attribute(readonly).map(Some);
    }
    if readonly {
      return Err(self.error("expected `attribute` after `readonly`"));
    }
    self.operation()
  }

  fn attribute(&mut self, readonly: bool) -> Result<Member, SchemaError> {
    let tokens = self.collect_until(|t| *t == Tok::Punct(';'))?;
    self.expect_punct(';')?;
    let name = last_ident(&tokens).ok_or_else(|| self.error("attribute without a name"))?;
    let is_event_handler = tokens[..tokens.len() - 1]
      .iter()
      .any(|t| matches!(t, Tok::Ident(id) if id.ends_with("EventHandler")));

    let kind = if is_event_handler {
      MemberKind::Event
    } else if readonly {
      MemberKind::Readonly
    } else {
      MemberKind::Writable
    };
    Ok(Member::new(name, kind))
  }

  fn operation(&mut self) -> Result<Option<Member>, SchemaError> {
    let mut special = false;
    while matches!(self.peek_ident(), Some("getter" | "setter" | "deleter")) {
      self.pos += 1;
      special = true;
    }

    // A union return type opens with `(`, so the argument list is the first `(` at depth zero
    // once at least one return type token has been seen.
    let mut tokens: Vec<Tok> = Vec::new();
    let mut depth = 0usize;
    loop {
      let Some(token) = self.peek() else {
        return Err(self.error("unterminated operation"));
      };
      match &token.tok {
        Tok::Punct('(') if depth == 0 && !tokens.is_empty() => break,
        Tok::Punct('<' | '(') => depth += 1,
        Tok::Punct('>' | ')') => depth = depth.saturating_sub(1),
        Tok::Punct(';') if depth == 0 => return Err(self.error("expected an operation")),
        _ => {}
      }
      tokens.push(token.tok.clone());
      self.pos += 1;
    }
    self.skip_balanced('(', ')')?;
    self.expect_punct(';')?;

    let name = match last_ident(&tokens) {
      Some(name) if tokens.len() >= 2 => name,
      _ if special => return Ok(None),
      _ => return Err(self.error("operation without a name")),
    };
    if special && TYPE_KEYWORDS.contains(&name.as_str()) {
      return Ok(None);
    }
    Ok(Some(Member::new(name, MemberKind::Operation)))
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn peek_ident(&self) -> Option<&str> {
    self.peek_ident_at(0)
  }

  fn peek_ident_at(&self, offset: usize) -> Option<&str> {
    match self.tokens.get(self.pos + offset).map(|t| &t.tok) {
      Some(Tok::Ident(id)) => Some(id.as_str()),
      _ => None,
    }
  }

  fn peek_punct_at(&self, offset: usize) -> Option<char> {
    match self.tokens.get(self.pos + offset).map(|t| &t.tok) {
      Some(Tok::Punct(c)) => Some(*c),
      _ => None,
    }
  }

  fn line(&self) -> usize {
    self
      .peek()
      .or_else(|| self.tokens.last())
      .map(|t| t.line)
      .unwrap_or(1)
  }

  fn error(&self, message: &str) -> SchemaError {
    SchemaError::Parse {
      line: self.line(),
      message: message.to_string(),
    }
  }

  fn eat_ident(&mut self, keyword: &str) -> bool {
    if self.peek_ident() == Some(keyword) {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  fn eat_punct(&mut self, c: char) -> bool {
    if self.peek_punct_at(0) == Some(c) {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  fn expect_punct(&mut self, c: char) -> Result<(), SchemaError> {
    if self.eat_punct(c) {
      Ok(())
    } else {
      Err(self.error(&format!("expected `{c}`")))
    }
  }

  fn expect_name(&mut self) -> Result<String, SchemaError> {
    match self.peek_ident() {
      Some(id) => {
        let name = unescape(id);
        self.pos += 1;
        Ok(name)
      }
      None => Err(self.error("expected an identifier")),
    }
  }

  fn skip_ext_attrs(&mut self) -> Result<(), SchemaError> {
    while self.peek_punct_at(0) == Some('[') {
      self.skip_balanced('[', ']')?;
    }
    Ok(())
  }

  /// Skips from the current `open` token through its matching `close`.
  fn skip_balanced(&mut self, open: char, close: char) -> Result<(), SchemaError> {
    let start_line = self.line();
    self.expect_punct(open)?;
    let mut depth = 1usize;
    while depth > 0 {
      let Some(token) = self.peek() else {
        return Err(SchemaError::Parse {
          line: start_line,
          message: format!("unbalanced `{open}`"),
        });
      };
      match token.tok {
        Tok::Punct(c) if c == open => depth += 1,
        Tok::Punct(c) if c == close => depth -= 1,
        _ => {}
      }
      self.pos += 1;
    }
    Ok(())
  }

  /// Skips through the next `;` that is not nested inside braces.
  fn skip_until_semicolon(&mut self) -> Result<(), SchemaError> {
    let start_line = self.line();
    let mut depth = 0usize;
    loop {
      let Some(token) = self.peek() else {
        return Err(SchemaError::Parse {
          line: start_line,
          message: "missing `;`".to_string(),
        });
      };
      let tok = token.tok.clone();
      self.pos += 1;
      match tok {
        Tok::Punct('{') => depth += 1,
        Tok::Punct('}') => depth = depth.saturating_sub(1),
        Tok::Punct(';') if depth == 0 => return Ok(()),
        _ => {}
      }
    }
  }

  /// Collects tokens up to (not including) the first token matching `stop`.
  fn collect_until(&mut self, stop: impl Fn(&Tok) -> bool) -> Result<Vec<Tok>, SchemaError> {
    let mut out = Vec::new();
    loop {
      let Some(token) = self.peek() else {
        return Err(self.error("unexpected end of input"));
      };
      if stop(&token.tok) {
        return Ok(out);
      }
      out.push(token.tok.clone());
      self.pos += 1;
    }
  }
}

fn last_ident(tokens: &[Tok]) -> Option<String> {
  match tokens.last() {
    Some(Tok::Ident(id)) => Some(unescape(id)),
    _ => None,
  }
}

/// WebIDL lets identifiers that collide with keywords be written with a leading `_`.
fn unescape(id: &str) -> String {
  id.strip_prefix('_').unwrap_or(id).to_string()
}
