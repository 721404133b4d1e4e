//! Resolution of compiled contract artifacts.
//!
//! Artifacts follow the Forc output layout: the contract `name` compiled with
//! `profile` lives at `<root>/<name>/out/<profile>/<name>.bin`, next to its ABI
//! in `<name>-abi.json`. Only the `configurables` section of the ABI is read,
//! together with the concrete types it points at; it lists, in declaration
//! order, the constants patched into the binary before deployment together
//! with their byte offsets.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::Deserialize;

use crate::error::ArtifactError;
use crate::plan::Value;

/// A compiled contract, identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactReference {
    pub name: String,
}

impl ArtifactReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurableSlot {
    pub name: String,
    pub offset: u64,
    /// Sway type as spelled in the ABI, e.g. `u64` or
    /// `struct std::contract_id::ContractId`.
    pub type_name: String,
}

impl ConfigurableSlot {
    pub fn accepts(&self, value: &Value) -> bool {
        match value {
            Value::ContractId(_) => {
                self.type_name.starts_with("struct ") && self.type_name.ends_with("ContractId")
            }
            Value::U64(_) => self.type_name == "u64",
            Value::Bool(_) => self.type_name == "bool",
            Value::B256(_) => self.type_name == "b256",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledArtifact {
    pub reference: ArtifactReference,
    pub binary_path: PathBuf,
    pub configurables: Vec<ConfigurableSlot>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AbiConcreteType {
    #[serde(rename = "type")]
    type_name: String,
    concrete_type_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AbiConfigurable {
    name: String,
    concrete_type_id: String,
    offset: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AbiFile {
    #[serde(default)]
    concrete_types: Vec<AbiConcreteType>,
    #[serde(default)]
    configurables: Vec<AbiConfigurable>,
}

#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    root: PathBuf,
    profile: String,
}

impl ArtifactLoader {
    pub fn new(root: impl Into<PathBuf>, profile: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            profile: profile.into(),
        }
    }

    fn out_dir(&self, name: &str) -> PathBuf {
        self.root.join(name).join("out").join(&self.profile)
    }

    pub fn binary_path(&self, artifact: &ArtifactReference) -> PathBuf {
        self.out_dir(&artifact.name)
            .join(format!("{}.bin", artifact.name))
    }

    pub fn abi_path(&self, artifact: &ArtifactReference) -> PathBuf {
        self.out_dir(&artifact.name)
            .join(format!("{}-abi.json", artifact.name))
    }

    pub fn load(&self, artifact: &ArtifactReference) -> Result<CompiledArtifact, ArtifactError> {
        let binary_path = self.binary_path(artifact);
        if !binary_path.is_file() {
            return Err(ArtifactError::Io {
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "binary not found"),
                path: binary_path,
            });
        }
        let configurables = read_configurables(&self.abi_path(artifact))?;
        Ok(CompiledArtifact {
            reference: artifact.clone(),
            binary_path,
            configurables,
        })
    }
}

fn read_configurables(path: &Path) -> Result<Vec<ConfigurableSlot>, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_configurables(&raw).map_err(|source| ArtifactError::Abi {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn parse_configurables(abi: &str) -> Result<Vec<ConfigurableSlot>, serde_json::Error> {
    let abi: AbiFile = serde_json::from_str(abi)?;
    abi.configurables
        .into_iter()
        .map(|configurable| -> Result<ConfigurableSlot, serde_json::Error> {
            let type_name = abi
                .concrete_types
                .iter()
                .find(|ty| ty.concrete_type_id == configurable.concrete_type_id)
                .map(|ty| ty.type_name.clone())
                .ok_or_else(|| {
                    serde_json::Error::custom(format!(
                        "configurable {} has unknown concrete type {}",
                        configurable.name, configurable.concrete_type_id
                    ))
                })?;
            Ok(ConfigurableSlot {
                name: configurable.name,
                offset: configurable.offset,
                type_name,
            })
        })
        .collect()
}
