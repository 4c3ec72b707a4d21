use crate::manifest::parse_manifest;
use crate::parse::{parse_definitions, Includes};
use crate::{InterfaceDecl, MemberKind, SchemaError};
use ahash::{AHashMap, AHashSet};
use parking_lot::Mutex;
use std::sync::Arc;

/// A static set of interface declarations with memoized inheritance resolution.
///
/// Partial interfaces and `includes` statements are folded into their targets when the schema is
/// built, so every interface afterwards has exactly one declaration. The schema is never mutated
/// after construction apart from the resolution cache.
#[derive(Debug)]
pub struct Schema {
  interfaces: AHashMap<String, InterfaceDecl>,
  resolved: Mutex<AHashMap<String, Arc<ResolvedInterface>>>,
}

/// The effective member set of an interface after walking its inheritance chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInterface {
  pub name: String,
  /// Root first, ending with `name`.
  pub chain: Vec<String>,
  pub members: Vec<ResolvedMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMember {
  pub name: String,
  pub kind: MemberKind,
  /// The interface in the chain whose declaration won.
  pub declared_in: String,
}

impl Schema {
  pub fn parse(idl: &str) -> Result<Self, SchemaError> {
    Self::parse_all([idl])
  }

  /// Parses several IDL fragments into one schema, e.g. the interfaces under test followed by the
  /// interfaces they depend on.
  pub fn parse_all<'a>(fragments: impl IntoIterator<Item = &'a str>) -> Result<Self, SchemaError> {
    let mut decls = Vec::new();
    let mut includes = Vec::new();
    for fragment in fragments {
      let defs = parse_definitions(fragment)?;
      decls.extend(defs.interfaces);
      includes.extend(defs.includes);
    }
    Self::build(decls, includes)
  }

  pub fn from_manifest_str(raw: &str) -> Result<Self, SchemaError> {
    Self::build(parse_manifest(raw)?, Vec::new())
  }

  pub fn from_decls(decls: impl IntoIterator<Item = InterfaceDecl>) -> Result<Self, SchemaError> {
    Self::build(decls.into_iter().collect(), Vec::new())
  }

  fn build(decls: Vec<InterfaceDecl>, includes: Vec<Includes>) -> Result<Self, SchemaError> {
    let mut interfaces: AHashMap<String, InterfaceDecl> = AHashMap::new();
    let mut mixins: AHashMap<String, InterfaceDecl> = AHashMap::new();
    let mut partials = Vec::new();

    for decl in decls {
      if decl.partial {
        partials.push(decl);
        continue;
      }
      let table = if decl.mixin {
        &mut mixins
      } else {
        &mut interfaces
      };
      if table.contains_key(&decl.name) {
        return Err(SchemaError::Duplicate(decl.name));
      }
      table.insert(decl.name.clone(), decl);
    }

    for partial in partials {
      let table = if partial.mixin {
        &mut mixins
      } else {
        &mut interfaces
      };
      let target = table
        .get_mut(&partial.name)
        .ok_or_else(|| SchemaError::OrphanPartial(partial.name.clone()))?;
      target.members.extend(partial.members);
    }

    for include in includes {
      let members = mixins
        .get(&include.mixin)
        .ok_or_else(|| SchemaError::UnknownMixin {
          target: include.target.clone(),
          mixin: include.mixin.clone(),
        })?
        .members
        .clone();
      interfaces
        .get_mut(&include.target)
        .ok_or_else(|| SchemaError::UnknownInterface(include.target.clone()))?
        .members
        .extend(members);
    }

    Ok(Self {
      interfaces,
      resolved: Mutex::new(AHashMap::new()),
    })
  }

  pub fn contains(&self, name: &str) -> bool {
    self.interfaces.contains_key(name)
  }

  pub fn declaration(&self, name: &str) -> Option<&InterfaceDecl> {
    self.interfaces.get(name)
  }

  /// All interface names, sorted.
  pub fn interface_names(&self) -> Vec<&str> {
    let mut names: Vec<&str> = self.interfaces.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }

  /// `resolve(name) = merge(resolve(parent), own members)`.
  ///
  /// Same-named members declared lower in the chain replace inherited ones in place, so members
  /// keep root-to-leaf order. Every interface resolved along the way is cached.
  pub fn resolve(&self, name: &str) -> Result<Arc<ResolvedInterface>, SchemaError> {
    let mut memo = self.resolved.lock();
    if let Some(hit) = memo.get(name) {
      return Ok(Arc::clone(hit));
    }

    let mut current = self
      .interfaces
      .get(name)
      .ok_or_else(|| SchemaError::UnknownInterface(name.to_string()))?;
    let mut pending: Vec<&InterfaceDecl> = Vec::new();
    let mut seen: AHashSet<&str> = AHashSet::new();
    let mut base: Option<Arc<ResolvedInterface>> = None;

    loop {
      if !seen.insert(current.name.as_str()) {
        let mut chain: Vec<String> = pending.iter().map(|decl| decl.name.clone()).collect();
        chain.push(current.name.clone());
        return Err(SchemaError::Cycle { chain });
      }
      pending.push(current);

      let Some(parent) = current.parent.as_deref() else {
        break;
      };
      if let Some(hit) = memo.get(parent) {
        base = Some(Arc::clone(hit));
        break;
      }
      current = self
        .interfaces
        .get(parent)
        .ok_or_else(|| SchemaError::UnknownParent {
          interface: current.name.clone(),
          parent: parent.to_string(),
        })?;
    }

    let mut resolved = base;
    for decl in pending.into_iter().rev() {
      let next = Arc::new(ResolvedInterface::extend(resolved.as_deref(), decl));
      memo.insert(decl.name.clone(), Arc::clone(&next));
      resolved = Some(next);
    }

    resolved.ok_or_else(|| SchemaError::UnknownInterface(name.to_string()))
  }
}

impl ResolvedInterface {
  fn extend(parent: Option<&ResolvedInterface>, decl: &InterfaceDecl) -> Self {
    let mut chain = parent.map(|p| p.chain.clone()).unwrap_or_default();
    chain.push(decl.name.clone());
    let mut members = parent.map(|p| p.members.clone()).unwrap_or_default();

    // Overloaded operations repeat a name within one declaration; the first one stands for all.
    let mut own: AHashSet<&str> = AHashSet::new();
    for member in &decl.members {
      if !own.insert(member.name.as_str()) {
        continue;
      }
      let entry = ResolvedMember {
        name: member.name.clone(),
        kind: member.kind,
        declared_in: decl.name.clone(),
      };
      match members.iter_mut().find(|existing| existing.name == member.name) {
        Some(existing) => *existing = entry,
        None => members.push(entry),
      }
    }

    Self {
      name: decl.name.clone(),
      chain,
      members,
    }
  }

  pub fn member(&self, name: &str) -> Option<&ResolvedMember> {
    self.members.iter().find(|member| member.name == name)
  }

  pub fn member_names(&self) -> Vec<&str> {
    self.members.iter().map(|member| member.name.as_str()).collect()
  }

  pub fn inherits_from(&self, ancestor: &str) -> bool {
    self.chain.iter().any(|name| name == ancestor) && self.name != ancestor
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SENSORS: &str = r#"
interface Sensor {
  readonly attribute double? timestamp;
  undefined start();
  undefined stop();
};
interface Gyroscope : Sensor {
  readonly attribute double? x;
  readonly attribute double? y;
  readonly attribute double? z;
};
"#;

  #[test]
  fn child_inherits_parent_members_root_first() {
    let schema = Schema::parse(SENSORS).unwrap();
    let gyro = schema.resolve("Gyroscope").unwrap();
    assert_eq!(gyro.chain, vec!["Sensor", "Gyroscope"]);
    assert_eq!(
      gyro.member_names(),
      vec!["timestamp", "start", "stop", "x", "y", "z"]
    );
    assert_eq!(gyro.member("start").unwrap().declared_in, "Sensor");
    assert!(gyro.inherits_from("Sensor"));
    assert!(!gyro.inherits_from("Gyroscope"));
  }

  #[test]
  fn child_member_overrides_parent_in_place() {
    let schema = Schema::from_decls([
      InterfaceDecl::new("Base")
        .with_member("value", MemberKind::Readonly)
        .with_member("reset", MemberKind::Operation),
      InterfaceDecl::new("Derived")
        .with_parent("Base")
        .with_member("value", MemberKind::Writable),
    ])
    .unwrap();

    let derived = schema.resolve("Derived").unwrap();
    assert_eq!(derived.member_names(), vec!["value", "reset"]);
    let value = derived.member("value").unwrap();
    assert_eq!(value.kind, MemberKind::Writable);
    assert_eq!(value.declared_in, "Derived");
  }

  #[test]
  fn resolution_is_memoized_for_every_ancestor() {
    let schema = Schema::parse(SENSORS).unwrap();
    let first = schema.resolve("Gyroscope").unwrap();
    let second = schema.resolve("Gyroscope").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(schema.resolved.lock().contains_key("Sensor"));
  }

  #[test]
  fn unknown_parent_and_cycles_are_errors() {
    let schema = Schema::from_decls([InterfaceDecl::new("A").with_parent("Missing")]).unwrap();
    assert_eq!(
      schema.resolve("A").unwrap_err(),
      SchemaError::UnknownParent {
        interface: "A".to_string(),
        parent: "Missing".to_string(),
      }
    );

    let schema = Schema::from_decls([
      InterfaceDecl::new("A").with_parent("B"),
      InterfaceDecl::new("B").with_parent("A"),
    ])
    .unwrap();
    let err = schema.resolve("A").unwrap_err();
    assert_eq!(err.to_string(), "inheritance cycle: A -> B -> A");

    assert_eq!(
      schema.resolve("Nope").unwrap_err(),
      SchemaError::UnknownInterface("Nope".to_string())
    );
  }

  #[test]
  fn partials_and_mixins_fold_into_their_targets() {
    let schema = Schema::parse_all([
      SENSORS,
      "interface mixin Extra { readonly attribute long quality; };\n\
       partial interface Gyroscope { readonly attribute double? w; };\n\
       Gyroscope includes Extra;",
    ])
    .unwrap();

    let gyro = schema.resolve("Gyroscope").unwrap();
    assert_eq!(
      gyro.member_names(),
      vec!["timestamp", "start", "stop", "x", "y", "z", "w", "quality"]
    );
    assert!(!schema.contains("Extra"));
    assert_eq!(schema.interface_names(), vec!["Gyroscope", "Sensor"]);
  }

  #[test]
  fn malformed_schemas_are_rejected_at_build_time() {
    let err = Schema::parse("interface A {}; interface A {};").unwrap_err();
    assert_eq!(err, SchemaError::Duplicate("A".to_string()));

    let err = Schema::parse("partial interface A {};").unwrap_err();
    assert_eq!(err, SchemaError::OrphanPartial("A".to_string()));

    let err = Schema::parse("interface A {}; A includes M;").unwrap_err();
    assert!(matches!(err, SchemaError::UnknownMixin { .. }), "{err:?}");
  }

  #[test]
  fn overloads_collapse_to_one_member() {
    let schema = Schema::parse(
      "interface Target { undefined send(DOMString s); undefined send(long n); };",
    )
    .unwrap();
    assert_eq!(schema.resolve("Target").unwrap().member_names(), vec!["send"]);
  }
}
