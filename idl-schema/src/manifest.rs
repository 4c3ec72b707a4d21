use crate::{InterfaceDecl, Member, SchemaError};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
struct RawManifest {
  #[serde(default)]
  interfaces: Vec<RawInterface>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawInterface {
  name: String,
  #[serde(default, alias = "inherits")]
  parent: Option<String>,
  #[serde(default)]
  members: Vec<Member>,
}

/// Parses the declarative manifest form, TOML first and JSON as a fallback:
///
/// ```toml
/// [[interfaces]]
/// name = "Gyroscope"
/// parent = "Sensor"
/// members = [{ name = "x", kind = "readonly" }]
/// ```
pub(crate) fn parse_manifest(raw: &str) -> Result<Vec<InterfaceDecl>, SchemaError> {
  let manifest = match toml::from_str::<RawManifest>(raw) {
    Ok(manifest) => manifest,
    Err(toml_err) => serde_json::from_str::<RawManifest>(raw).map_err(|json_err| {
      SchemaError::Manifest(format!(
        "failed to parse as TOML ({toml_err}) or JSON ({json_err})"
      ))
    })?,
  };

  Ok(
    manifest
      .interfaces
      .into_iter()
      .map(|raw| InterfaceDecl {
        name: raw.name,
        parent: raw.parent,
        members: raw.members,
        ..InterfaceDecl::default()
      })
      .collect(),
  )
}
