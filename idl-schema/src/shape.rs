use crate::{MemberKind, ResolvedInterface};
use std::fmt;

/// An object whose members can be probed by name.
///
/// Implementations report what the object actually exposes; they are never consulted about what it
/// *should* expose, which is the schema's job.
pub trait PlatformObject {
  /// The interface the object claims to implement, e.g. `Gyroscope`.
  fn interface_name(&self) -> &str;

  /// The shape of the member called `name`, or `None` when the object lacks it.
  fn member_kind(&self, name: &str) -> Option<MemberKind>;
}

impl<T: PlatformObject + ?Sized> PlatformObject for &T {
  fn interface_name(&self) -> &str {
    (**self).interface_name()
  }

  fn member_kind(&self, name: &str) -> Option<MemberKind> {
    (**self).member_kind(name)
  }
}

impl<T: PlatformObject + ?Sized> PlatformObject for Box<T> {
  fn interface_name(&self) -> &str {
    (**self).interface_name()
  }

  fn member_kind(&self, name: &str) -> Option<MemberKind> {
    (**self).member_kind(name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
  Missing {
    member: String,
    expected: MemberKind,
  },
  Incompatible {
    member: String,
    expected: MemberKind,
    found: MemberKind,
  },
}

impl Mismatch {
  pub fn member(&self) -> &str {
    match self {
      Mismatch::Missing { member, .. } | Mismatch::Incompatible { member, .. } => member,
    }
  }
}

impl fmt::Display for Mismatch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Mismatch::Missing { member, expected } => {
        write!(f, "missing {expected} `{member}`")
      }
      Mismatch::Incompatible {
        member,
        expected,
        found,
      } => write!(f, "`{member}`: expected {expected}, found {found}"),
    }
  }
}

/// Checks every member of `interface` against `object`, collecting all mismatches in member order.
pub fn check_shape(interface: &ResolvedInterface, object: &dyn PlatformObject) -> Vec<Mismatch> {
  interface
    .members
    .iter()
    .filter_map(|member| match object.member_kind(&member.name) {
      None => Some(Mismatch::Missing {
        member: member.name.clone(),
        expected: member.kind,
      }),
      Some(found) if found != member.kind => Some(Mismatch::Incompatible {
        member: member.name.clone(),
        expected: member.kind,
        found,
      }),
      Some(_) => None,
    })
    .collect()
}
