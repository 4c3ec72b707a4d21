use idl_schema::{check_shape, MemberKind, Mismatch, PlatformObject, Schema};

const IDL: &str = r#"
interface EventTarget {
  undefined addEventListener(DOMString type, EventListener? callback);
  undefined removeEventListener(DOMString type, EventListener? callback);
  boolean dispatchEvent(Event event);
};

[SecureContext, Exposed=Window]
interface Sensor : EventTarget {
  readonly attribute boolean activated;
  readonly attribute DOMHighResTimeStamp? timestamp;
  undefined start();
  undefined stop();
  attribute EventHandler onreading;
};

[SecureContext, Exposed=Window]
interface Gyroscope : Sensor {
  constructor(optional GyroscopeSensorOptions sensorOptions = {});
  readonly attribute double? x;
  readonly attribute double? y;
  readonly attribute double? z;
};
"#;

struct ToyObject {
  interface: &'static str,
  members: Vec<(&'static str, MemberKind)>,
}

impl PlatformObject for ToyObject {
  fn interface_name(&self) -> &str {
    self.interface
  }

  fn member_kind(&self, name: &str) -> Option<MemberKind> {
    self
      .members
      .iter()
      .find(|(member, _)| *member == name)
      .map(|(_, kind)| *kind)
  }
}

fn toy_gyroscope() -> ToyObject {
  ToyObject {
    interface: "Gyroscope",
    members: vec![
      ("addEventListener", MemberKind::Operation),
      ("removeEventListener", MemberKind::Operation),
      ("dispatchEvent", MemberKind::Operation),
      ("activated", MemberKind::Readonly),
      ("timestamp", MemberKind::Readonly),
      ("start", MemberKind::Operation),
      ("stop", MemberKind::Operation),
      ("onreading", MemberKind::Event),
      ("x", MemberKind::Readonly),
      ("y", MemberKind::Readonly),
      ("z", MemberKind::Readonly),
    ],
  }
}

#[test]
fn complete_object_has_no_mismatches() {
  let schema = Schema::parse(IDL).unwrap();
  let gyro = schema.resolve("Gyroscope").unwrap();
  assert_eq!(gyro.chain, vec!["EventTarget", "Sensor", "Gyroscope"]);
  assert!(check_shape(&gyro, &toy_gyroscope()).is_empty());
}

#[test]
fn extra_declared_member_is_the_only_mismatch() {
  let schema =
    Schema::parse_all([IDL, "partial interface Gyroscope { readonly attribute double? w; };"])
      .unwrap();
  let gyro = schema.resolve("Gyroscope").unwrap();

  let mismatches = check_shape(&gyro, &toy_gyroscope());
  assert_eq!(
    mismatches,
    vec![Mismatch::Missing {
      member: "w".to_string(),
      expected: MemberKind::Readonly,
    }]
  );
  assert_eq!(mismatches[0].to_string(), "missing readonly attribute `w`");
}

#[test]
fn all_mismatches_are_collected() {
  let schema = Schema::parse(IDL).unwrap();
  let gyro = schema.resolve("Gyroscope").unwrap();

  let mut broken = toy_gyroscope();
  broken.members.retain(|(name, _)| *name != "stop" && *name != "z");
  for (name, kind) in &mut broken.members {
    if *name == "onreading" {
      *kind = MemberKind::Writable;
    }
  }

  let mismatches = check_shape(&gyro, &broken);
  let members: Vec<&str> = mismatches.iter().map(Mismatch::member).collect();
  assert_eq!(members, vec!["stop", "onreading", "z"]);
}

#[test]
fn manifest_and_idl_declarations_resolve_identically() {
  let manifest = r#"
[[interfaces]]
name = "Sensor"
members = [
  { name = "timestamp", kind = "readonly" },
  { name = "start", kind = "operation" },
  { name = "stop", kind = "operation" },
]

[[interfaces]]
name = "Gyroscope"
parent = "Sensor"
members = [
  { name = "x", kind = "readonly" },
  { name = "y", kind = "readonly" },
  { name = "z", kind = "readonly" },
]
"#;
  let schema = Schema::from_manifest_str(manifest).unwrap();
  assert_eq!(
    schema.resolve("Gyroscope").unwrap().member_names(),
    vec!["timestamp", "start", "stop", "x", "y", "z"]
  );
}
