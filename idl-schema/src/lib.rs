//! Interface shape declarations for IDL conformance checks.
//!
//! A [`Schema`] is built from WebIDL fragments (see [`Schema::parse`]) or from a TOML/JSON
//! manifest (see [`Schema::from_manifest_str`]). It only records what a shape check needs: the
//! interface names, the single-inheritance edges, and the name and kind of every member. Types,
//! arguments and extended attributes are parsed past and dropped.
//!
//! Shape checks are structural: [`check_shape`] asks a [`PlatformObject`] whether it exposes each
//! member of a resolved interface, without caring how the object is represented.

use serde::{Deserialize, Serialize};
use std::fmt;

mod error;
mod manifest;
mod parse;
mod schema;
mod shape;

pub use error::SchemaError;
pub use parse::{parse_definitions, Definitions, Includes};
pub use schema::{ResolvedInterface, ResolvedMember, Schema};
pub use shape::{check_shape, Mismatch, PlatformObject};

/// The observable shape of an interface member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
  /// A `readonly attribute` or a `const`.
  #[serde(alias = "data")]
  Readonly,
  /// A settable attribute.
  Writable,
  /// A regular (non-static) operation.
  Operation,
  /// An `EventHandler`-typed attribute such as `onreading`.
  Event,
}

impl MemberKind {
  pub fn as_str(self) -> &'static str {
    match self {
      MemberKind::Readonly => "readonly attribute",
      MemberKind::Writable => "attribute",
      MemberKind::Operation => "operation",
      MemberKind::Event => "event handler",
    }
  }
}

impl fmt::Display for MemberKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
  pub name: String,
  pub kind: MemberKind,
}

impl Member {
  pub fn new(name: impl Into<String>, kind: MemberKind) -> Self {
    Self {
      name: name.into(),
      kind,
    }
  }
}

/// One `interface` block as written, before partials, mixins and inheritance are applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InterfaceDecl {
  pub name: String,
  pub parent: Option<String>,
  pub members: Vec<Member>,
  /// `partial interface X { ... }`.
  pub partial: bool,
  /// `interface mixin X { ... }`.
  pub mixin: bool,
  /// 1-based line of the `interface` keyword, when parsed from text.
  pub line: Option<usize>,
}

impl InterfaceDecl {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Self::default()
    }
  }

  pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
    self.parent = Some(parent.into());
    self
  }

  pub fn with_member(mut self, name: impl Into<String>, kind: MemberKind) -> Self {
    self.members.push(Member::new(name, kind));
    self
  }
}
