//! Compiled class and interface metadata.

use indexmap::IndexMap;
use serde::Deserialize;
use smol_str::SmolStr;

/// Read-only access to type information of compiled classes and interfaces.
pub trait TypeInfoLookup: Send + Sync {
    fn type_info(&self, class_name: &str) -> Option<&TypeInfo>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TypeInfo {
    pub type_name: SmolStr,
    #[serde(default)]
    pub parent_type_name: Option<SmolStr>,
    #[serde(default)]
    pub is_interface: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub interfaces: Vec<SmolStr>,
}

/// In-memory registry keyed by the lowercased type name.
#[derive(Debug, Clone, Default)]
pub struct TypeInfoRegistry {
    types: IndexMap<SmolStr, TypeInfo>,
}

impl TypeInfoRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, info: TypeInfo) {
        self.types
            .insert(SmolStr::new(info.type_name.to_ascii_lowercase()), info);
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let infos: Vec<TypeInfo> = serde_json::from_str(json)?;
        Ok(infos.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<TypeInfo> for TypeInfoRegistry {
    fn from_iter<I: IntoIterator<Item = TypeInfo>>(iter: I) -> Self {
        let mut registry = Self::new();
        for info in iter {
            registry.insert(info);
        }
        registry
    }
}

impl TypeInfoLookup for TypeInfoRegistry {
    fn type_info(&self, class_name: &str) -> Option<&TypeInfo> {
        self.types.get(class_name.to_ascii_lowercase().as_str())
    }
}
